use std::net::IpAddr;
use std::path::PathBuf;

use access_control::AuthenticationLevel;
use clap::{Args, Parser, Subcommand};
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "authz-gate", version, about = "Inspect forward-auth access-control rules")]
pub struct Cli {
    /// Path to the gateway configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Path to the access-control rules file (overrides config file setting)
    #[arg(short, long)]
    pub rules: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "access_control=trace" (overrides config file setting)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile the rules and print a summary
    Validate,
    /// Show which rule applies to a request and the resulting verdict
    CheckPolicy(CheckPolicyArgs),
}

#[derive(Args, Debug)]
pub struct CheckPolicyArgs {
    /// Target URL of the request
    #[arg(long)]
    pub url: Url,

    /// HTTP method of the request
    #[arg(long, default_value = "GET")]
    pub method: String,

    /// Username of the caller; omit for an anonymous caller
    #[arg(long, default_value = "")]
    pub username: String,

    /// Comma-separated groups of the caller
    #[arg(long, value_delimiter = ',')]
    pub groups: Vec<String>,

    /// Client IP address
    #[arg(long, default_value = "127.0.0.1")]
    pub ip: IpAddr,

    /// Authentication level: none, one_factor or two_factor.
    /// Defaults to one_factor for named callers and none otherwise.
    #[arg(long)]
    pub level: Option<AuthenticationLevel>,

    /// Print the gate-by-gate result of every rule
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_check_policy() {
        let cli = Cli::try_parse_from([
            "authz-gate",
            "--rules",
            "acl.yaml",
            "check-policy",
            "--url",
            "https://app.example.com/api?x=1",
            "--username",
            "john",
            "--groups",
            "admins,dev",
            "--ip",
            "10.0.0.1",
            "--level",
            "two_factor",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.rules.as_deref(), Some(std::path::Path::new("acl.yaml")));
        let Command::CheckPolicy(args) = cli.command else {
            panic!("expected check-policy");
        };
        assert_eq!(args.url.host_str(), Some("app.example.com"));
        assert_eq!(args.groups, ["admins", "dev"]);
        assert_eq!(args.level, Some(AuthenticationLevel::TwoFactor));
        assert!(args.verbose);
        assert!(!args.json);
    }

    #[test]
    fn rejects_invalid_ip() {
        let result = Cli::try_parse_from([
            "authz-gate",
            "check-policy",
            "--url",
            "https://a.example.com",
            "--ip",
            "not-an-ip",
        ]);
        assert!(result.is_err());
    }
}
