use serde::Serialize;
use tracing::{debug, trace};

use crate::error::BuildError;
use crate::level::Policy;
use crate::matcher::{
    any_match, DomainMatcher, Matcher, MethodMatcher, NetworkMatcher, QueryMatcher,
    ResourceMatcher, SubjectMatcher,
};
use crate::network::NetworkTable;
use crate::request::{friendly_method, Object, Subject};
use crate::schema::{AccessControlConfig, RuleConfig};

/// The six gates of a rule, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Domain,
    Resource,
    Query,
    Method,
    Network,
    Subject,
}

impl Gate {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Resource => "resource",
            Self::Query => "query",
            Self::Method => "method",
            Self::Network => "network",
            Self::Subject => "subject",
        }
    }
}

/// A compiled, immutable access-control rule.
#[derive(Debug)]
pub struct Rule {
    position: usize,
    domains: Vec<DomainMatcher>,
    resources: Vec<ResourceMatcher>,
    query: Vec<QueryMatcher>,
    methods: MethodMatcher,
    networks: NetworkMatcher,
    subjects: SubjectMatcher,
    policy: Policy,
    has_subjects: bool,
}

impl Rule {
    /// Compile the rule at 1-based `position`.
    pub fn compile(
        position: usize,
        config: &RuleConfig,
        networks: &mut NetworkTable,
    ) -> Result<Self, BuildError> {
        let mut domains = config
            .domain
            .iter()
            .map(|d| DomainMatcher::compile(position, d))
            .collect::<Result<Vec<_>, _>>()?;
        for pattern in &config.domain_regex {
            domains.push(DomainMatcher::compile_regex(position, pattern)?);
        }

        let resources = config
            .resources
            .iter()
            .map(|r| ResourceMatcher::compile(position, r))
            .collect::<Result<Vec<_>, _>>()?;

        let query = config
            .query
            .iter()
            .filter(|group| !group.is_empty())
            .map(|group| QueryMatcher::compile(position, group))
            .collect::<Result<Vec<_>, _>>()?;

        let subjects = SubjectMatcher::compile(position, &config.subject.0)?;
        let has_subjects = !subjects.is_empty();

        Ok(Self {
            position,
            domains,
            resources,
            query,
            methods: MethodMatcher::new(&config.methods),
            networks: NetworkMatcher::new(networks.attach(position, &config.networks)?),
            subjects,
            policy: config.policy,
            has_subjects,
        })
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Whether the rule restricts by subject.
    pub fn has_subjects(&self) -> bool {
        self.has_subjects
    }

    /// Whether every gate passes for this request.
    ///
    /// Anonymous subjects pass the subject gate; see
    /// [`SubjectMatcher::matches_subjects`].
    pub fn is_match(&self, subject: &Subject, object: &Object) -> bool {
        let Some(gate) = self.first_failing_gate(subject, object) else {
            return true;
        };

        trace!(
            rule = self.position,
            gate = gate.as_str(),
            subject = %subject,
            object = %object,
            method = friendly_method(&object.method),
            "rule does not match"
        );
        false
    }

    fn first_failing_gate(&self, subject: &Subject, object: &Object) -> Option<Gate> {
        if !self.matches_domains(subject, object) {
            Some(Gate::Domain)
        } else if !self.matches_resources(subject, object) {
            Some(Gate::Resource)
        } else if !self.matches_query(subject, object) {
            Some(Gate::Query)
        } else if !self.matches_methods(subject, object) {
            Some(Gate::Method)
        } else if !self.matches_networks(subject, object) {
            Some(Gate::Network)
        } else if !self.matches_subjects(subject) {
            Some(Gate::Subject)
        } else {
            None
        }
    }

    pub fn matches_domains(&self, subject: &Subject, object: &Object) -> bool {
        any_match(&self.domains, subject, object)
    }

    pub fn matches_resources(&self, subject: &Subject, object: &Object) -> bool {
        any_match(&self.resources, subject, object)
    }

    pub fn matches_query(&self, subject: &Subject, object: &Object) -> bool {
        any_match(&self.query, subject, object)
    }

    pub fn matches_methods(&self, subject: &Subject, object: &Object) -> bool {
        self.methods.is_match(subject, object)
    }

    pub fn matches_networks(&self, subject: &Subject, object: &Object) -> bool {
        self.networks.is_match(subject, object)
    }

    pub fn matches_subjects(&self, subject: &Subject) -> bool {
        self.subjects.matches_subjects(subject)
    }

    pub fn matches_subject_exact(&self, subject: &Subject) -> bool {
        self.subjects.matches_subject_exact(subject)
    }

    /// Evaluate every gate without short-circuiting, for operator tooling.
    pub fn match_result(&self, subject: &Subject, object: &Object) -> RuleMatchResult {
        let domain = self.matches_domains(subject, object);
        let resources = self.matches_resources(subject, object);
        let query = self.matches_query(subject, object);
        let methods = self.matches_methods(subject, object);
        let networks = self.matches_networks(subject, object);
        let subjects = self.matches_subjects(subject);
        let subjects_exact = self.matches_subject_exact(subject);

        let others = domain && resources && query && methods && networks;

        RuleMatchResult {
            position: self.position,
            policy: self.policy,
            is_match: others && subjects_exact,
            is_potential_match: others && subjects && !subjects_exact,
            domain,
            resources,
            query,
            methods,
            networks,
            subjects,
            subjects_exact,
        }
    }
}

/// Per-gate outcome of one rule against one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleMatchResult {
    pub position: usize,
    pub policy: Policy,
    /// Every gate passes with a strict subject check.
    pub is_match: bool,
    /// Every gate except the subject passes, and the subject is anonymous.
    /// The rule may apply once the caller authenticates.
    pub is_potential_match: bool,
    pub domain: bool,
    pub resources: bool,
    pub query: bool,
    pub methods: bool,
    pub networks: bool,
    pub subjects: bool,
    pub subjects_exact: bool,
}

/// Compile every configured rule in declaration order.
///
/// The first error aborts the build; no partial rule list is returned.
pub fn compile_rules(config: &AccessControlConfig) -> Result<Vec<Rule>, BuildError> {
    let mut networks = NetworkTable::resolve(&config.networks)?;

    let rules = config
        .rules
        .iter()
        .enumerate()
        .map(|(idx, rule)| Rule::compile(idx + 1, rule, &mut networks))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        rules = rules.len(),
        networks = networks.parsed_len(),
        "compiled access-control rules"
    );

    Ok(rules)
}
