use thiserror::Error;

/// Errors raised while compiling an access-control configuration into a
/// [`RuleSet`](crate::RuleSet).
///
/// Any of these aborts the whole build; a partially compiled rule-set is
/// never returned.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A literal network could not be parsed as a CIDR or IP address.
    #[error("invalid network '{value}': {source}")]
    InvalidNetwork {
        value: String,
        #[source]
        source: ipnet::AddrParseError,
    },

    /// A rule referenced a network that is neither a CIDR nor a known group.
    #[error("rule #{rule}: network '{name}' is not a valid CIDR or a defined network group")]
    UnknownNetwork { rule: usize, name: String },

    /// A named network group resolved to no networks at all.
    #[error("network group '{name}' does not contain any networks")]
    EmptyNetworkGroup { name: String },

    /// The same group name was defined twice.
    #[error("network group '{name}' is defined more than once")]
    DuplicateNetworkGroup { name: String },

    /// A domain regex, resource, or query pattern failed to compile.
    #[error("rule #{rule}: invalid {dimension} pattern '{pattern}': {source}")]
    InvalidPattern {
        rule: usize,
        dimension: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A subject token was not of the form `user:<name>` or `group:<name>`.
    #[error("rule #{rule}: invalid subject '{token}': {reason}")]
    InvalidSubject {
        rule: usize,
        token: String,
        reason: String,
    },

    /// A domain entry used an unsupported placeholder layout.
    #[error("rule #{rule}: invalid domain '{domain}': {reason}")]
    InvalidPlaceholder {
        rule: usize,
        domain: String,
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_rule_position() {
        let err = BuildError::UnknownNetwork {
            rule: 3,
            name: "office".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("rule #3"), "unexpected message: {msg}");
        assert!(msg.contains("office"));
    }

    #[test]
    fn invalid_network_keeps_source() {
        let source = "nope".parse::<ipnet::IpNet>().unwrap_err();
        let err = BuildError::InvalidNetwork {
            value: "nope".to_string(),
            source,
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}
