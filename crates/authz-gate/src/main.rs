mod cli;
mod config;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use access_control::{AuthenticationLevel, Object, RuleSet, Subject};

use crate::cli::{CheckPolicyArgs, Cli, Command};
use crate::config::LogFormat;
use crate::report::PolicyReport;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config, then merge CLI overrides.
    let mut cfg = config::load(&cli.config)?;

    if let Some(ref rules) = cli.rules {
        cfg.access_control_file = rules.clone();
    }
    if let Some(ref level) = cli.log_level {
        cfg.logging.level = level.clone();
    }

    init_tracing(&cfg.logging);

    info!(
        config_file = %cli.config.display(),
        access_control_file = %cfg.access_control_file.display(),
        "authz-gate starting"
    );

    let acl = access_control::loader::load_config(&cfg.access_control_file)
        .context("failed to load access-control rules")?;
    let rule_set = RuleSet::new(&acl).context("failed to compile access-control rules")?;

    info!(?rule_set, "access-control rules loaded");

    match cli.command {
        Command::Validate => print!("{}", report::summary(&rule_set)),
        Command::CheckPolicy(args) => check_policy(&rule_set, &args)?,
    }

    Ok(())
}

fn init_tracing(logging: &config::LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn check_policy(rule_set: &RuleSet, args: &CheckPolicyArgs) -> Result<()> {
    let subject = if args.username.is_empty() {
        Subject::anonymous(args.ip)
    } else {
        Subject::new(args.username.as_str(), args.groups.iter().cloned(), args.ip)
    };
    let level = args.level.unwrap_or(if subject.is_anonymous() {
        AuthenticationLevel::NotAuthenticated
    } else {
        AuthenticationLevel::OneFactor
    });
    let subject = subject.with_level(level);
    let object = Object::from_url(&args.url, args.method.as_str());

    let report = PolicyReport::build(rule_set, &subject, &object, args.verbose);

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
        println!("{json}");
    } else {
        print!("{}", report.to_text());
    }
    Ok(())
}
