use std::fmt;

use serde::Serialize;

use crate::evaluator::RequiredLevel;
use crate::level::{AuthenticationLevel, Policy};

/// Final verdict for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthzResult {
    /// Let the request through.
    Authorized,
    /// Reject the request outright.
    Forbidden,
    /// Challenge the caller to authenticate (or step up).
    Unauthorized,
}

impl fmt::Display for AuthzResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authorized => write!(f, "authorized"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::Unauthorized => write!(f, "unauthorized"),
        }
    }
}

/// Reconcile the required policy with the caller's authentication level.
///
/// A `Denied` rule that restricts by subject cannot be settled for an
/// anonymous caller: subject checks are deferred for anonymous callers while
/// selecting the rule, so an identity-specific rule might still apply once
/// they authenticate. Such callers get `Unauthorized` instead of
/// `Forbidden`.
pub fn decide(level: AuthenticationLevel, policy: Policy, has_subjects: bool) -> AuthzResult {
    match policy {
        Policy::Bypass => AuthzResult::Authorized,
        Policy::Denied if level != AuthenticationLevel::NotAuthenticated || !has_subjects => {
            AuthzResult::Forbidden
        }
        Policy::OneFactor if level >= AuthenticationLevel::OneFactor => AuthzResult::Authorized,
        Policy::TwoFactor if level >= AuthenticationLevel::TwoFactor => AuthzResult::Authorized,
        _ => AuthzResult::Unauthorized,
    }
}

/// The outcome of authorizing one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Authorization {
    pub result: AuthzResult,
    /// Policy of the matched rule, or the default policy.
    pub policy: Policy,
    /// Position of the matched rule, if any.
    pub matched_rule: Option<usize>,
    pub has_subjects: bool,
}

impl Authorization {
    pub fn new(level: AuthenticationLevel, required: RequiredLevel) -> Self {
        Self {
            result: decide(level, required.policy, required.has_subjects),
            policy: required.policy,
            matched_rule: required.rule,
            has_subjects: required.has_subjects,
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.result == AuthzResult::Authorized
    }
}
