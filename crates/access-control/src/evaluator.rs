use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::decision::Authorization;
use crate::error::BuildError;
use crate::level::Policy;
use crate::request::{Object, Subject};
use crate::rule::{compile_rules, Rule, RuleMatchResult};
use crate::schema::AccessControlConfig;

// ---------------------------------------------------------------------------
// RuleSet
// ---------------------------------------------------------------------------

/// The policy that applies to a request and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequiredLevel {
    pub policy: Policy,
    /// Whether the matched rule restricts by subject. Always false for the
    /// default policy.
    pub has_subjects: bool,
    /// Position of the matched rule; `None` when the default policy applied.
    pub rule: Option<usize>,
}

/// An immutable, compiled set of rules plus the default policy.
///
/// Rules are kept in declaration order and the first match wins.
pub struct RuleSet {
    rules: Vec<Rule>,
    default_policy: Policy,
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("default_policy", &self.default_policy)
            .field("num_rules", &self.rules.len())
            .finish()
    }
}

impl RuleSet {
    /// Compile a rule-set from configuration. Any invalid rule fails the
    /// whole build.
    pub fn new(config: &AccessControlConfig) -> Result<Self, BuildError> {
        Ok(Self::from_rules(compile_rules(config)?, config.default_policy))
    }

    pub fn from_rules(rules: Vec<Rule>, default_policy: Policy) -> Self {
        Self {
            rules,
            default_policy,
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn default_policy(&self) -> Policy {
        self.default_policy
    }

    /// Find the policy for a request: the first matching rule in position
    /// order, else the default policy.
    pub fn required_level(&self, subject: &Subject, object: &Object) -> RequiredLevel {
        for rule in &self.rules {
            if rule.is_match(subject, object) {
                debug!(
                    rule = rule.position(),
                    policy = %rule.policy(),
                    subject = %subject,
                    object = %object,
                    "access-control rule matched"
                );
                return RequiredLevel {
                    policy: rule.policy(),
                    has_subjects: rule.has_subjects(),
                    rule: Some(rule.position()),
                };
            }
        }

        debug!(
            policy = %self.default_policy,
            subject = %subject,
            object = %object,
            "no access-control rule matched; applying default policy"
        );
        RequiredLevel {
            policy: self.default_policy,
            has_subjects: false,
            rule: None,
        }
    }

    /// Resolve the policy and reconcile it with the subject's level.
    pub fn authorize(&self, subject: &Subject, object: &Object) -> Authorization {
        Authorization::new(subject.level, self.required_level(subject, object))
    }

    /// Whether any request could ever require a second factor.
    pub fn is_second_factor_enabled(&self) -> bool {
        self.default_policy == Policy::TwoFactor
            || self.rules.iter().any(|r| r.policy() == Policy::TwoFactor)
    }

    /// Gate-by-gate results for every rule, in position order.
    pub fn match_results(&self, subject: &Subject, object: &Object) -> Vec<RuleMatchResult> {
        self.rules
            .iter()
            .map(|rule| rule.match_result(subject, object))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// AccessControl
// ---------------------------------------------------------------------------

/// Shared handle to the active [`RuleSet`].
///
/// Evaluations take a snapshot (an `Arc` clone under a short read lock) and
/// run without holding any lock. A reload compiles the new rule-set in full
/// before swapping it in, so readers see either the old or the new set.
#[derive(Clone)]
pub struct AccessControl {
    current: Arc<RwLock<Arc<RuleSet>>>,
}

impl std::fmt::Debug for AccessControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AccessControl")
            .field(&*self.snapshot())
            .finish()
    }
}

impl AccessControl {
    pub fn new(config: &AccessControlConfig) -> Result<Self, BuildError> {
        Ok(Self::from_rule_set(RuleSet::new(config)?))
    }

    pub fn from_rule_set(rule_set: RuleSet) -> Self {
        log_installed(&rule_set);
        Self {
            current: Arc::new(RwLock::new(Arc::new(rule_set))),
        }
    }

    /// The rule-set currently in force.
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.current.read().clone()
    }

    /// Compile `config` and install it. On error the active rule-set is
    /// left untouched.
    pub fn reload(&self, config: &AccessControlConfig) -> Result<(), BuildError> {
        match RuleSet::new(config) {
            Ok(rule_set) => {
                self.install(rule_set);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "access-control reload rejected; keeping current rules");
                Err(err)
            }
        }
    }

    /// Swap in an already compiled rule-set.
    pub fn install(&self, rule_set: RuleSet) {
        log_installed(&rule_set);
        *self.current.write() = Arc::new(rule_set);
    }

    pub fn authorize(&self, subject: &Subject, object: &Object) -> Authorization {
        self.snapshot().authorize(subject, object)
    }
}

fn log_installed(rule_set: &RuleSet) {
    info!(
        rules = rule_set.rules().len(),
        default_policy = %rule_set.default_policy(),
        second_factor = rule_set.is_second_factor_enabled(),
        "access-control rules installed"
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
