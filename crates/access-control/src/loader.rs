use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::level::Policy;
use crate::schema::AccessControlConfig;

/// HTTP methods accepted in a rule's `methods` list.
pub const VALID_METHODS: &[&str] = &[
    "GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PROPFIND",
    "PROPPATCH", "MKCOL", "COPY", "MOVE", "LOCK", "UNLOCK",
];

/// Load an [`AccessControlConfig`] from a YAML file on disk.
pub fn load_config(path: impl AsRef<Path>) -> Result<AccessControlConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read access-control file: {}", path.display()))?;
    load_config_from_str(&contents)
        .with_context(|| format!("failed to parse access-control file: {}", path.display()))
}

/// Parse and validate an [`AccessControlConfig`] from a YAML string.
pub fn load_config_from_str(yaml: &str) -> Result<AccessControlConfig> {
    let config: AccessControlConfig =
        serde_yml::from_str(yaml).context("YAML deserialization failed")?;
    validate(&config)?;
    Ok(config)
}

/// Checks that serde cannot express. Network resolution and pattern syntax
/// are checked when the rules are compiled.
fn validate(config: &AccessControlConfig) -> Result<()> {
    let mut names = HashSet::new();
    for group in &config.networks {
        if group.name.trim().is_empty() {
            bail!("network group name must not be empty");
        }
        if !names.insert(group.name.as_str()) {
            bail!("duplicate network group name: '{}'", group.name);
        }
    }

    for (idx, rule) in config.rules.iter().enumerate() {
        let position = idx + 1;

        if rule.policy == Policy::Bypass && !rule.subject.is_empty() {
            bail!("rule #{position}: 'bypass' rules cannot restrict by subject");
        }

        for method in &rule.methods {
            if !VALID_METHODS.contains(&method.trim().to_ascii_uppercase().as_str()) {
                bail!("rule #{position}: unknown HTTP method '{method}'");
            }
        }

        for cond in rule.query.iter().flatten() {
            if cond.key.is_empty() {
                bail!("rule #{position}: query condition key must not be empty");
            }
            let op = cond.effective_operator();
            match (op.takes_value(), cond.value.is_some()) {
                (true, false) => {
                    bail!("rule #{position}: query operator {op:?} on '{}' requires a value", cond.key)
                }
                (false, true) => {
                    bail!("rule #{position}: query operator {op:?} on '{}' does not take a value", cond.key)
                }
                _ => {}
            }
        }
    }

    Ok(())
}
