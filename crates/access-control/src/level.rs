use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The access requirement a rule (or the default policy) imposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Let the request through without any authentication.
    Bypass,
    /// Require at least a first factor.
    OneFactor,
    /// Require a second factor.
    TwoFactor,
    /// Reject the request.
    #[default]
    #[serde(rename = "deny")]
    Denied,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bypass => write!(f, "bypass"),
            Self::OneFactor => write!(f, "one_factor"),
            Self::TwoFactor => write!(f, "two_factor"),
            Self::Denied => write!(f, "deny"),
        }
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bypass" => Ok(Self::Bypass),
            "one_factor" => Ok(Self::OneFactor),
            "two_factor" => Ok(Self::TwoFactor),
            "deny" => Ok(Self::Denied),
            other => Err(format!(
                "unknown policy '{other}'; expected bypass, one_factor, two_factor or deny"
            )),
        }
    }
}

/// How strongly the caller has proven their identity.
///
/// Variants are declared weakest first so the derived ordering can be used
/// for "at least" comparisons.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationLevel {
    #[default]
    NotAuthenticated,
    OneFactor,
    TwoFactor,
}

impl fmt::Display for AuthenticationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "not_authenticated"),
            Self::OneFactor => write!(f, "one_factor"),
            Self::TwoFactor => write!(f, "two_factor"),
        }
    }
}

impl FromStr for AuthenticationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" | "not_authenticated" => Ok(Self::NotAuthenticated),
            "one_factor" | "1fa" => Ok(Self::OneFactor),
            "two_factor" | "2fa" => Ok(Self::TwoFactor),
            other => Err(format!(
                "unknown authentication level '{other}'; expected none, one_factor or two_factor"
            )),
        }
    }
}
