use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_access_control_file")]
    pub access_control_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            access_control_file: default_access_control_file(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_access_control_file() -> PathBuf {
    PathBuf::from("access_control.yaml")
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Load configuration from a YAML file.
///
/// A missing file yields the default configuration and a warning, so the
/// tool works with nothing but a rules file.
pub fn load(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "configuration file not found; using defaults"
        );
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

    let config: Config = serde_yml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let config = load(Path::new("/does/not/exist.yaml")).unwrap();
        assert_eq!(config.access_control_file, PathBuf::from("access_control.yaml"));
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn reads_values_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
logging:
  level: debug
  format: json
access_control_file: /etc/gate/acl.yaml
"#
        )
        .unwrap();

        let config = load(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.access_control_file, PathBuf::from("/etc/gate/acl.yaml"));
    }

    #[test]
    fn unknown_keys_are_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "policy_file: x.yaml").unwrap();

        let err = load(file.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"), "{err}");
    }
}
