use serde::{Deserialize, Serialize};

use crate::level::Policy;

/// Raw access-control configuration as written by the operator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessControlConfig {
    /// Policy applied when no rule matches.
    #[serde(default)]
    pub default_policy: Policy,
    /// Named network groups that rules can reference by name.
    #[serde(default)]
    pub networks: Vec<NetworkGroupConfig>,
    /// Rules in evaluation order. The first matching rule wins.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkGroupConfig {
    pub name: String,
    /// CIDRs or bare IP addresses.
    #[serde(default)]
    pub networks: Vec<String>,
}

/// A single rule. Every criterion list is optional; an empty list matches
/// any request for that dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    #[serde(default, with = "one_or_many")]
    pub domain: Vec<String>,
    #[serde(default, with = "one_or_many")]
    pub domain_regex: Vec<String>,
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
    /// OR across the outer list, AND within each inner list.
    #[serde(default)]
    pub query: Vec<Vec<QueryConditionConfig>>,
    #[serde(default)]
    pub methods: Vec<String>,
    /// CIDRs, bare IP addresses or network group names.
    #[serde(default)]
    pub networks: Vec<String>,
    /// OR across the outer list, AND within each inner list.
    #[serde(default)]
    pub subject: SubjectConfig,
    pub policy: Policy,
}

/// A resource pattern. Plain strings are anchored to the whole path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceConfig {
    Pattern(String),
    Detailed {
        pattern: String,
        #[serde(default)]
        partial: bool,
    },
}

impl ResourceConfig {
    pub fn pattern(&self) -> &str {
        match self {
            Self::Pattern(p) | Self::Detailed { pattern: p, .. } => p,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Detailed { partial: true, .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConditionConfig {
    /// Defaults to `equal` when a value is given, otherwise `present`.
    #[serde(default)]
    pub operator: Option<QueryOperator>,
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl QueryConditionConfig {
    pub fn effective_operator(&self) -> QueryOperator {
        match (self.operator, &self.value) {
            (Some(op), _) => op,
            (None, Some(_)) => QueryOperator::Equal,
            (None, None) => QueryOperator::Present,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryOperator {
    #[serde(rename = "present")]
    Present,
    #[serde(rename = "absent")]
    Absent,
    #[serde(rename = "equal")]
    Equal,
    #[serde(rename = "not equal")]
    NotEqual,
    #[serde(rename = "pattern")]
    Pattern,
    #[serde(rename = "not pattern")]
    NotPattern,
}

impl QueryOperator {
    /// Whether a condition using this operator needs a `value`.
    pub fn takes_value(self) -> bool {
        !matches!(self, Self::Present | Self::Absent)
    }
}

/// Subject criteria. Accepts a single token, a list of alternatives, or a
/// list whose entries are themselves lists of tokens that must all hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SubjectRepr", into = "SubjectRepr")]
pub struct SubjectConfig(pub Vec<Vec<String>>);

impl SubjectConfig {
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Vec::is_empty)
    }
}

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum SubjectRepr {
    One(String),
    Many(Vec<SubjectEntry>),
}

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum SubjectEntry {
    One(String),
    All(Vec<String>),
}

impl From<SubjectRepr> for SubjectConfig {
    fn from(repr: SubjectRepr) -> Self {
        match repr {
            SubjectRepr::One(token) => Self(vec![vec![token]]),
            SubjectRepr::Many(entries) => Self(
                entries
                    .into_iter()
                    .map(|e| match e {
                        SubjectEntry::One(token) => vec![token],
                        SubjectEntry::All(tokens) => tokens,
                    })
                    .filter(|group| !group.is_empty())
                    .collect(),
            ),
        }
    }
}

impl From<SubjectConfig> for SubjectRepr {
    fn from(config: SubjectConfig) -> Self {
        Self::Many(config.0.into_iter().map(SubjectEntry::All).collect())
    }
}

/// Accepts either a single string or a sequence of strings.
mod one_or_many {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        One(String),
        Many(Vec<String>),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Repr::deserialize(d)? {
            Repr::One(s) => vec![s],
            Repr::Many(v) => v,
        })
    }

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(v: &Vec<String>, s: S) -> Result<S::Ok, S::Error> {
        v.serialize(s)
    }
}
