//! Rendering of `check-policy` and `validate` results.

use std::fmt::Write;

use access_control::{Authorization, Object, RuleMatchResult, RuleSet, Subject};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RequestSummary {
    pub domain: String,
    pub path: String,
    pub method: String,
    pub username: String,
    pub groups: Vec<String>,
    pub ip: String,
    pub level: String,
}

impl RequestSummary {
    pub fn new(subject: &Subject, object: &Object) -> Self {
        Self {
            domain: object.domain.clone(),
            path: object.path.clone(),
            method: object.method.clone(),
            username: subject.username.clone(),
            groups: subject.groups.clone(),
            ip: subject.ip.to_string(),
            level: subject.level.to_string(),
        }
    }
}

/// Everything `check-policy` prints.
#[derive(Debug, Serialize)]
pub struct PolicyReport {
    pub request: RequestSummary,
    pub authorization: Authorization,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RuleMatchResult>>,
}

impl PolicyReport {
    pub fn build(rule_set: &RuleSet, subject: &Subject, object: &Object, verbose: bool) -> Self {
        Self {
            request: RequestSummary::new(subject, object),
            authorization: rule_set.authorize(subject, object),
            rules: verbose.then(|| rule_set.match_results(subject, object)),
        }
    }

    pub fn to_text(&self) -> String {
        let req = &self.request;
        let mut out = String::new();

        let username = if req.username.is_empty() {
            "<anonymous>"
        } else {
            req.username.as_str()
        };
        let _ = writeln!(
            out,
            "Policy check for {} {}{} as '{}' (groups: {}) from {} at level {}",
            req.method,
            req.domain,
            req.path,
            username,
            if req.groups.is_empty() {
                "none".to_string()
            } else {
                req.groups.join(", ")
            },
            req.ip,
            req.level,
        );

        if let Some(rules) = &self.rules {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "    {:>4}  {:<10}  {:<6}  {:<8}  {:<5}  {:<6}  {:<7}  {:<7}",
                "Rule", "Policy", "Domain", "Resource", "Query", "Method", "Network", "Subject"
            );
            for r in rules {
                let marker = if r.is_match {
                    '*'
                } else if r.is_potential_match {
                    '~'
                } else {
                    ' '
                };
                let subject = match (r.subjects_exact, r.subjects) {
                    (true, _) => "hit",
                    (false, true) => "maybe",
                    (false, false) => "miss",
                };
                let _ = writeln!(
                    out,
                    "  {marker} {:>4}  {:<10}  {:<6}  {:<8}  {:<5}  {:<6}  {:<7}  {:<7}",
                    r.position,
                    r.policy.to_string(),
                    hit(r.domain),
                    hit(r.resources),
                    hit(r.query),
                    hit(r.methods),
                    hit(r.networks),
                    subject,
                );
            }
            let _ = writeln!(out);
        }

        let auth = &self.authorization;
        match auth.matched_rule {
            Some(position) => {
                let _ = writeln!(out, "Rule #{position} applies with policy '{}'.", auth.policy);
            }
            None => {
                let _ = writeln!(
                    out,
                    "No rule matched; the default policy '{}' applies.",
                    auth.policy
                );
            }
        }
        let _ = writeln!(out, "Verdict: {}", auth.result);
        out
    }
}

fn hit(matched: bool) -> &'static str {
    if matched {
        "hit"
    } else {
        "miss"
    }
}

/// Summary printed by `validate`.
pub fn summary(rule_set: &RuleSet) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Access-control rules are valid.");
    let _ = writeln!(out, "  rules:          {}", rule_set.rules().len());
    let _ = writeln!(out, "  default policy: {}", rule_set.default_policy());
    let _ = writeln!(
        out,
        "  second factor:  {}",
        if rule_set.is_second_factor_enabled() {
            "required by at least one policy"
        } else {
            "not used"
        }
    );
    out
}
