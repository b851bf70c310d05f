//! Per-dimension request predicates.
//!
//! Each matcher is compiled once from configuration and is immutable
//! afterwards. A rule stores them as plain fields and checks them through
//! the [`Matcher`] trait. Every matcher is total: it never fails at
//! evaluation time and an empty configuration matches everything.

use globset::{Glob, GlobMatcher};
use ipnet::IpNet;
use regex::Regex;

use crate::error::BuildError;
use crate::request::{Object, Subject};
use crate::schema::{QueryConditionConfig, QueryOperator, ResourceConfig};

/// A single access-control gate.
pub trait Matcher {
    fn is_match(&self, subject: &Subject, object: &Object) -> bool;
}

/// OR across a list of matchers; an empty list is a match.
pub(crate) fn any_match<M: Matcher>(matchers: &[M], subject: &Subject, object: &Object) -> bool {
    matchers.is_empty() || matchers.iter().any(|m| m.is_match(subject, object))
}

/// Which part of the subject an identity placeholder or capture refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    User,
    Group,
}

impl Identity {
    fn matches(self, subject: &Subject, value: &str) -> bool {
        match self {
            Self::User => value.eq_ignore_ascii_case(&subject.username),
            Self::Group => subject.has_group_ignore_case(value),
        }
    }
}

// ---------------------------------------------------------------------------
// Identity-aware regex
// ---------------------------------------------------------------------------

/// A regex that may bind the named groups `User` and `Group` to the
/// subject's identity.
#[derive(Debug)]
pub struct IdentityRegex {
    regex: Regex,
    user: bool,
    group: bool,
}

impl IdentityRegex {
    fn new(regex: Regex) -> Self {
        let mut user = false;
        let mut group = false;
        for name in regex.capture_names().flatten() {
            match name {
                "User" => user = true,
                "Group" => group = true,
                _ => {}
            }
        }
        Self { regex, user, group }
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether the pattern refers to the subject's identity at all.
    pub fn is_identity_bound(&self) -> bool {
        self.user || self.group
    }

    fn is_match(&self, subject: &Subject, haystack: &str) -> bool {
        if !self.is_identity_bound() {
            return self.regex.is_match(haystack);
        }
        if subject.is_anonymous() {
            return false;
        }

        let Some(caps) = self.regex.captures(haystack) else {
            return false;
        };

        let bound = |name: &str, identity: Identity| {
            caps.name(name)
                .is_some_and(|m| identity.matches(subject, m.as_str()))
        };

        (!self.user || bound("User", Identity::User))
            && (!self.group || bound("Group", Identity::Group))
    }
}

// ---------------------------------------------------------------------------
// Domain
// ---------------------------------------------------------------------------

const USER_PLACEHOLDER: &str = "{user}";
const GROUP_PLACEHOLDER: &str = "{group}";

#[derive(Debug)]
pub enum DomainMatcher {
    /// `app.example.com`
    Exact(String),
    /// `*.example.com`; stores `.example.com`.
    Wildcard(String),
    /// `{user}.example.com` or `{group}.example.com`.
    Placeholder {
        prefix: String,
        suffix: String,
        identity: Identity,
    },
    /// An entry from `domain_regex`.
    Regex(IdentityRegex),
}

impl DomainMatcher {
    pub fn compile(rule: usize, domain: &str) -> Result<Self, BuildError> {
        let domain = domain.trim().to_ascii_lowercase();
        let invalid = |reason| BuildError::InvalidPlaceholder {
            rule,
            domain: domain.clone(),
            reason,
        };

        if domain.contains('{') || domain.contains('}') {
            if domain.contains('*') {
                return Err(invalid("wildcards and placeholders cannot be combined"));
            }
            let (placeholder, identity) = if domain.contains(USER_PLACEHOLDER) {
                (USER_PLACEHOLDER, Identity::User)
            } else if domain.contains(GROUP_PLACEHOLDER) {
                (GROUP_PLACEHOLDER, Identity::Group)
            } else {
                return Err(invalid("only {user} and {group} placeholders are supported"));
            };
            if domain.matches('{').count() != 1 || domain.matches('}').count() != 1 {
                return Err(invalid("at most one placeholder is allowed per domain"));
            }
            let (prefix, suffix) = domain
                .split_once(placeholder)
                .ok_or_else(|| invalid("malformed placeholder"))?;
            return Ok(Self::Placeholder {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
                identity,
            });
        }

        if let Some(suffix) = domain.strip_prefix('*') {
            if !suffix.starts_with('.') || suffix.contains('*') {
                return Err(invalid("a wildcard must be the whole leftmost label, as in *.example.com"));
            }
            return Ok(Self::Wildcard(suffix.to_string()));
        }
        if domain.contains('*') {
            return Err(invalid("a wildcard must be the whole leftmost label, as in *.example.com"));
        }

        Ok(Self::Exact(domain))
    }

    /// Compile a `domain_regex` entry. Matching is case-insensitive and not
    /// implicitly anchored.
    pub fn compile_regex(rule: usize, pattern: &str) -> Result<Self, BuildError> {
        let regex = regex::RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| BuildError::InvalidPattern {
                rule,
                dimension: "domain_regex",
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self::Regex(IdentityRegex::new(regex)))
    }
}

impl Matcher for DomainMatcher {
    fn is_match(&self, subject: &Subject, object: &Object) -> bool {
        let domain = object.domain.as_str();
        match self {
            Self::Exact(expected) => domain.eq_ignore_ascii_case(expected),
            Self::Wildcard(suffix) => {
                domain.len() > suffix.len() && ends_with_ignore_case(domain, suffix)
            }
            Self::Placeholder {
                prefix,
                suffix,
                identity,
            } => {
                if subject.is_anonymous() || domain.len() <= prefix.len() + suffix.len() {
                    return false;
                }
                if !starts_with_ignore_case(domain, prefix) || !ends_with_ignore_case(domain, suffix)
                {
                    return false;
                }
                match domain.get(prefix.len()..domain.len() - suffix.len()) {
                    Some(middle) => identity.matches(subject, middle),
                    None => false,
                }
            }
            Self::Regex(regex) => regex.is_match(subject, domain),
        }
    }
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .as_bytes()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}

fn ends_with_ignore_case(haystack: &str, suffix: &str) -> bool {
    haystack
        .len()
        .checked_sub(suffix.len())
        .and_then(|start| haystack.as_bytes().get(start..))
        .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix.as_bytes()))
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ResourceMatcher {
    regex: IdentityRegex,
}

impl ResourceMatcher {
    /// Plain patterns are anchored to the whole path; partial ones match
    /// anywhere in it.
    pub fn compile(rule: usize, resource: &ResourceConfig) -> Result<Self, BuildError> {
        let pattern = resource.pattern();
        let source = if resource.is_partial() {
            pattern.to_string()
        } else {
            format!("^(?:{pattern})$")
        };
        let regex = Regex::new(&source).map_err(|source| BuildError::InvalidPattern {
            rule,
            dimension: "resource",
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            regex: IdentityRegex::new(regex),
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Matcher for ResourceMatcher {
    fn is_match(&self, subject: &Subject, object: &Object) -> bool {
        self.regex.is_match(subject, &object.path)
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum QueryTest {
    Present,
    Absent,
    Equal(String),
    NotEqual(String),
    Pattern(Regex),
    NotPattern(Regex),
}

#[derive(Debug)]
struct QueryCondition {
    key: String,
    test: QueryTest,
}

impl QueryCondition {
    fn holds(&self, object: &Object) -> bool {
        let value = object.query_value(&self.key);
        match &self.test {
            QueryTest::Present => value.is_some(),
            QueryTest::Absent => value.is_none(),
            QueryTest::Equal(expected) => value == Some(expected.as_str()),
            QueryTest::NotEqual(expected) => value != Some(expected.as_str()),
            QueryTest::Pattern(re) => value.is_some_and(|v| re.is_match(v)),
            QueryTest::NotPattern(re) => !value.is_some_and(|v| re.is_match(v)),
        }
    }
}

/// One group of query conditions; all of them must hold.
#[derive(Debug)]
pub struct QueryMatcher {
    conditions: Vec<QueryCondition>,
}

impl QueryMatcher {
    pub fn compile(rule: usize, group: &[QueryConditionConfig]) -> Result<Self, BuildError> {
        let pattern = |value: &str| {
            Regex::new(value).map_err(|source| BuildError::InvalidPattern {
                rule,
                dimension: "query",
                pattern: value.to_string(),
                source,
            })
        };

        let mut conditions = Vec::with_capacity(group.len());
        for cond in group {
            let value = cond.value.clone().unwrap_or_default();
            let test = match cond.effective_operator() {
                QueryOperator::Present => QueryTest::Present,
                QueryOperator::Absent => QueryTest::Absent,
                QueryOperator::Equal => QueryTest::Equal(value),
                QueryOperator::NotEqual => QueryTest::NotEqual(value),
                QueryOperator::Pattern => QueryTest::Pattern(pattern(&value)?),
                QueryOperator::NotPattern => QueryTest::NotPattern(pattern(&value)?),
            };
            conditions.push(QueryCondition {
                key: cond.key.clone(),
                test,
            });
        }

        Ok(Self { conditions })
    }
}

impl Matcher for QueryMatcher {
    fn is_match(&self, _subject: &Subject, object: &Object) -> bool {
        self.conditions.iter().all(|c| c.holds(object))
    }
}

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// Set of canonical (uppercase) method names.
#[derive(Debug, Default)]
pub struct MethodMatcher {
    methods: Vec<String>,
}

impl MethodMatcher {
    pub fn new<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut methods: Vec<String> = methods
            .into_iter()
            .map(|m| m.as_ref().trim().to_ascii_uppercase())
            .collect();
        methods.sort();
        methods.dedup();
        Self { methods }
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }
}

impl Matcher for MethodMatcher {
    fn is_match(&self, _subject: &Subject, object: &Object) -> bool {
        self.methods.is_empty()
            || self
                .methods
                .iter()
                .any(|m| m.eq_ignore_ascii_case(object.method.trim()))
    }
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct NetworkMatcher {
    networks: Vec<IpNet>,
}

impl NetworkMatcher {
    pub fn new(networks: Vec<IpNet>) -> Self {
        Self { networks }
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn networks(&self) -> &[IpNet] {
        &self.networks
    }
}

impl Matcher for NetworkMatcher {
    fn is_match(&self, subject: &Subject, _object: &Object) -> bool {
        if self.networks.is_empty() {
            return true;
        }
        // IPv4-mapped IPv6 peers are checked against IPv4 networks.
        let ip = subject.ip.to_canonical();
        self.networks.iter().any(|net| net.contains(&ip))
    }
}

// ---------------------------------------------------------------------------
// Subject
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum NamePattern {
    Exact(String),
    Glob(GlobMatcher),
}

impl NamePattern {
    fn is_match(&self, name: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == name,
            Self::Glob(glob) => glob.is_match(name),
        }
    }
}

/// A `user:<name>` or `group:<name>` token. `*` in the name is a wildcard.
#[derive(Debug)]
pub struct SubjectToken {
    identity: Identity,
    name: NamePattern,
}

impl SubjectToken {
    pub fn parse(rule: usize, token: &str) -> Result<Self, BuildError> {
        let invalid = |reason: String| BuildError::InvalidSubject {
            rule,
            token: token.to_string(),
            reason,
        };

        let (identity, name) = if let Some(name) = token.strip_prefix("user:") {
            (Identity::User, name)
        } else if let Some(name) = token.strip_prefix("group:") {
            (Identity::Group, name)
        } else {
            return Err(invalid("expected a 'user:' or 'group:' prefix".to_string()));
        };

        if name.is_empty() {
            return Err(invalid("name must not be empty".to_string()));
        }

        let name = if name.contains('*') {
            let glob = Glob::new(name).map_err(|e| invalid(e.to_string()))?;
            NamePattern::Glob(glob.compile_matcher())
        } else {
            NamePattern::Exact(name.to_string())
        };

        Ok(Self { identity, name })
    }

    fn is_match(&self, subject: &Subject) -> bool {
        match self.identity {
            Identity::User => self.name.is_match(&subject.username),
            Identity::Group => subject.groups.iter().any(|g| self.name.is_match(g)),
        }
    }
}

/// Subject criteria: OR across groups, AND across the tokens of a group.
#[derive(Debug, Default)]
pub struct SubjectMatcher {
    groups: Vec<Vec<SubjectToken>>,
}

impl SubjectMatcher {
    pub fn compile(rule: usize, groups: &[Vec<String>]) -> Result<Self, BuildError> {
        let groups = groups
            .iter()
            .filter(|group| !group.is_empty())
            .map(|group| {
                group
                    .iter()
                    .map(|token| SubjectToken::parse(rule, token))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { groups })
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Lenient check used while selecting a rule: anonymous subjects are
    /// let through so identity-specific rules are not skipped before the
    /// caller has had a chance to authenticate.
    pub fn matches_subjects(&self, subject: &Subject) -> bool {
        subject.is_anonymous() || self.matches_subject_exact(subject)
    }

    /// Strict check: anonymous subjects never satisfy a non-empty list.
    pub fn matches_subject_exact(&self, subject: &Subject) -> bool {
        if self.groups.is_empty() {
            return true;
        }
        if subject.is_anonymous() {
            return false;
        }
        self.groups
            .iter()
            .any(|group| group.iter().all(|token| token.is_match(subject)))
    }
}

impl Matcher for SubjectMatcher {
    fn is_match(&self, subject: &Subject, _object: &Object) -> bool {
        self.matches_subjects(subject)
    }
}

#[cfg(test)]
mod tests {
    use std::net::IpAddr;

    use rstest::rstest;

    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn john() -> Subject {
        Subject::new("john", ["admins", "dev"], ip("10.0.0.1"))
    }

    fn anon() -> Subject {
        Subject::anonymous(ip("10.0.0.1"))
    }

    fn get(domain: &str, path: &str) -> Object {
        Object::new(domain, path, "GET")
    }

    // ---- domain ----

    #[test]
    fn domain_exact_ignores_case() {
        let m = DomainMatcher::compile(1, "App.Example.com").unwrap();
        assert!(m.is_match(&anon(), &get("app.example.com", "/")));
        assert!(!m.is_match(&anon(), &get("example.com", "/")));
    }

    #[test]
    fn domain_wildcard_matches_subdomains_only() {
        let m = DomainMatcher::compile(1, "*.public.example.com").unwrap();
        assert!(m.is_match(&anon(), &get("foo.public.example.com", "/")));
        assert!(m.is_match(&anon(), &get("a.b.public.example.com", "/")));
        assert!(!m.is_match(&anon(), &get("public.example.com", "/")));
        assert!(!m.is_match(&anon(), &get("foopublic.example.com", "/")));
    }

    #[test]
    fn domain_user_placeholder() {
        let m = DomainMatcher::compile(1, "{user}.home.example.com").unwrap();
        assert!(m.is_match(&john(), &get("john.home.example.com", "/")));
        assert!(m.is_match(&john(), &get("JOHN.home.example.com", "/")));
        assert!(!m.is_match(&john(), &get("bob.home.example.com", "/")));
        assert!(!m.is_match(&john(), &get(".home.example.com", "/")));
    }

    #[test]
    fn domain_group_placeholder() {
        let m = DomainMatcher::compile(1, "{group}.teams.example.com").unwrap();
        assert!(m.is_match(&john(), &get("dev.teams.example.com", "/")));
        assert!(!m.is_match(&john(), &get("ops.teams.example.com", "/")));
    }

    #[test]
    fn domain_placeholder_never_matches_anonymous() {
        let m = DomainMatcher::compile(1, "{user}.example.com").unwrap();
        assert!(!m.is_match(&anon(), &get("john.example.com", "/")));

        let m = DomainMatcher::compile(1, "{group}.example.com").unwrap();
        assert!(!m.is_match(&anon(), &get("admins.example.com", "/")));
    }

    #[test]
    fn domain_rejects_bad_layouts() {
        for bad in [
            "{user}.{group}.example.com",
            "{email}.example.com",
            "*.{user}.example.com",
            "app.*.example.com",
            "*example.com",
        ] {
            let err = DomainMatcher::compile(2, bad).unwrap_err();
            assert!(
                matches!(err, BuildError::InvalidPlaceholder { rule: 2, .. }),
                "{bad} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn domain_regex_is_case_insensitive_and_identity_bound() {
        let m = DomainMatcher::compile_regex(1, r"^(?P<User>\w+)\.users\.example\.com$").unwrap();
        assert!(m.is_match(&john(), &get("john.users.example.com", "/")));
        assert!(!m.is_match(&john(), &get("bob.users.example.com", "/")));
        assert!(!m.is_match(&anon(), &get("john.users.example.com", "/")));

        let plain = DomainMatcher::compile_regex(1, r"^API\.example\.com$").unwrap();
        assert!(plain.is_match(&anon(), &get("api.example.com", "/")));
    }

    #[test]
    fn domain_regex_group_capture() {
        let m = DomainMatcher::compile_regex(1, r"^(?P<Group>\w+)\.example\.com$").unwrap();
        assert!(m.is_match(&john(), &get("admins.example.com", "/")));
        assert!(!m.is_match(&john(), &get("ops.example.com", "/")));
    }

    #[test]
    fn domain_regex_invalid_is_build_error() {
        let err = DomainMatcher::compile_regex(5, "([a-z").unwrap_err();
        assert!(matches!(
            err,
            BuildError::InvalidPattern {
                rule: 5,
                dimension: "domain_regex",
                ..
            }
        ));
    }

    // ---- resource ----

    #[test]
    fn resource_is_anchored_by_default() {
        let m = ResourceMatcher::compile(1, &ResourceConfig::Pattern("/api/.*".into())).unwrap();
        assert!(m.is_match(&anon(), &get("a", "/api/users")));
        assert!(!m.is_match(&anon(), &get("a", "/v1/api/users")));

        let exact = ResourceMatcher::compile(1, &ResourceConfig::Pattern("/admin".into())).unwrap();
        assert!(!exact.is_match(&anon(), &get("a", "/admin/panel")));
    }

    #[test]
    fn resource_partial_matches_anywhere() {
        let m = ResourceMatcher::compile(
            1,
            &ResourceConfig::Detailed {
                pattern: "/admin".into(),
                partial: true,
            },
        )
        .unwrap();
        assert!(m.is_match(&anon(), &get("a", "/v2/admin/panel")));
        assert!(!m.is_match(&anon(), &get("a", "/v2/users")));
    }

    #[test]
    fn resource_alternation_is_anchored_as_a_whole() {
        let m = ResourceMatcher::compile(1, &ResourceConfig::Pattern("/a|/b".into())).unwrap();
        assert!(m.is_match(&anon(), &get("x", "/b")));
        assert!(!m.is_match(&anon(), &get("x", "/b/c")));
    }

    #[test]
    fn resource_user_capture() {
        let m = ResourceMatcher::compile(
            1,
            &ResourceConfig::Pattern(r"/home/(?P<User>[^/]+)/.*".into()),
        )
        .unwrap();
        assert!(m.is_match(&john(), &get("a", "/home/john/notes")));
        assert!(!m.is_match(&john(), &get("a", "/home/bob/notes")));
        assert!(!m.is_match(&anon(), &get("a", "/home/john/notes")));
    }

    // ---- query ----

    fn cond(op: Option<QueryOperator>, key: &str, value: Option<&str>) -> QueryConditionConfig {
        QueryConditionConfig {
            operator: op,
            key: key.to_string(),
            value: value.map(str::to_string),
        }
    }

    #[rstest]
    #[case::present_hit(QueryOperator::Present, None, &[("token", "x")], true)]
    #[case::present_miss(QueryOperator::Present, None, &[], false)]
    #[case::absent_hit(QueryOperator::Absent, None, &[], true)]
    #[case::absent_miss(QueryOperator::Absent, None, &[("token", "")], false)]
    #[case::equal_hit(QueryOperator::Equal, Some("abc"), &[("token", "abc")], true)]
    #[case::equal_miss(QueryOperator::Equal, Some("abc"), &[("token", "abd")], false)]
    #[case::equal_missing_key(QueryOperator::Equal, Some("abc"), &[], false)]
    #[case::not_equal_hit(QueryOperator::NotEqual, Some("abc"), &[("token", "x")], true)]
    #[case::not_equal_missing_key(QueryOperator::NotEqual, Some("abc"), &[], true)]
    #[case::not_equal_miss(QueryOperator::NotEqual, Some("abc"), &[("token", "abc")], false)]
    #[case::pattern_hit(QueryOperator::Pattern, Some("^[0-9]+$"), &[("token", "123")], true)]
    #[case::pattern_miss(QueryOperator::Pattern, Some("^[0-9]+$"), &[("token", "12a")], false)]
    #[case::pattern_missing_key(QueryOperator::Pattern, Some(".*"), &[], false)]
    #[case::not_pattern_hit(QueryOperator::NotPattern, Some("^[0-9]+$"), &[("token", "abc")], true)]
    #[case::not_pattern_missing_key(QueryOperator::NotPattern, Some("x"), &[], true)]
    #[case::not_pattern_miss(QueryOperator::NotPattern, Some("^a"), &[("token", "abc")], false)]
    fn query_operators(
        #[case] op: QueryOperator,
        #[case] value: Option<&str>,
        #[case] query: &[(&str, &str)],
        #[case] expected: bool,
    ) {
        let m = QueryMatcher::compile(1, &[cond(Some(op), "token", value)]).unwrap();
        let object = get("a", "/").with_query(query.iter().copied());
        assert_eq!(m.is_match(&anon(), &object), expected);
    }

    #[test]
    fn query_group_requires_every_condition() {
        let m = QueryMatcher::compile(
            1,
            &[cond(None, "secure", None), cond(None, "mode", Some("strict"))],
        )
        .unwrap();
        let both = get("a", "/").with_query([("secure", "1"), ("mode", "strict")]);
        let one = get("a", "/").with_query([("secure", "1")]);
        assert!(m.is_match(&anon(), &both));
        assert!(!m.is_match(&anon(), &one));
    }

    #[test]
    fn query_uses_first_value_of_repeated_key() {
        let m = QueryMatcher::compile(1, &[cond(None, "k", Some("a"))]).unwrap();
        let object = get("a", "/").with_query([("k", "a"), ("k", "b")]);
        assert!(m.is_match(&anon(), &object));
    }

    #[test]
    fn query_invalid_pattern_is_build_error() {
        let err = QueryMatcher::compile(3, &[cond(Some(QueryOperator::Pattern), "k", Some("("))])
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::InvalidPattern {
                rule: 3,
                dimension: "query",
                ..
            }
        ));
    }

    // ---- method ----

    #[test]
    fn method_membership() {
        let m = MethodMatcher::new(["GET", "head"]);
        assert!(m.is_match(&anon(), &Object::new("a", "/", "GET")));
        assert!(m.is_match(&anon(), &Object::new("a", "/", "head")));
        assert!(!m.is_match(&anon(), &Object::new("a", "/", "POST")));
        assert_eq!(m.methods(), ["GET", "HEAD"]);
    }

    #[test]
    fn empty_method_set_matches_anything() {
        let m = MethodMatcher::default();
        assert!(m.is_empty());
        assert!(m.is_match(&anon(), &Object::new("a", "/", "DELETE")));
        assert!(m.is_match(&anon(), &Object::new("a", "/", "")));
    }

    // ---- network ----

    #[test]
    fn network_containment() {
        let m = NetworkMatcher::new(vec!["10.0.0.0/8".parse().unwrap()]);
        let object = get("a", "/");
        assert!(m.is_match(&Subject::anonymous(ip("10.1.2.3")), &object));
        assert!(!m.is_match(&Subject::anonymous(ip("192.168.1.1")), &object));
    }

    #[test]
    fn network_empty_matches_any_ip() {
        let m = NetworkMatcher::default();
        assert!(m.is_match(&Subject::anonymous(ip("203.0.113.9")), &get("a", "/")));
        assert!(m.is_match(&Subject::anonymous(ip("2001:db8::1")), &get("a", "/")));
    }

    #[test]
    fn network_handles_ipv4_mapped_peers() {
        let m = NetworkMatcher::new(vec!["10.0.0.0/8".parse().unwrap()]);
        assert!(m.is_match(&Subject::anonymous(ip("::ffff:10.9.8.7")), &get("a", "/")));
    }

    // ---- subject ----

    fn subjects(groups: &[&[&str]]) -> SubjectMatcher {
        let groups: Vec<Vec<String>> = groups
            .iter()
            .map(|g| g.iter().map(|t| t.to_string()).collect())
            .collect();
        SubjectMatcher::compile(1, &groups).unwrap()
    }

    #[test]
    fn subject_gate_asymmetry_for_anonymous() {
        let m = subjects(&[&["group:admins"]]);
        assert!(m.matches_subjects(&anon()));
        assert!(!m.matches_subject_exact(&anon()));
    }

    #[test]
    fn empty_subjects_match_everyone() {
        let m = subjects(&[]);
        assert!(m.is_empty());
        assert!(m.matches_subjects(&anon()));
        assert!(m.matches_subject_exact(&anon()));
        assert!(m.matches_subject_exact(&john()));
    }

    #[test]
    fn subject_and_within_group_or_across_groups() {
        let m = subjects(&[&["group:admins", "user:bob"], &["user:john"]]);
        assert!(m.matches_subject_exact(&john()));

        let m = subjects(&[&["group:admins", "user:bob"]]);
        assert!(!m.matches_subject_exact(&john()));

        let m = subjects(&[&["group:admins", "group:dev"]]);
        assert!(m.matches_subject_exact(&john()));
    }

    #[test]
    fn subject_wildcards() {
        let m = subjects(&[&["group:de*"]]);
        assert!(m.matches_subject_exact(&john()));

        let m = subjects(&[&["user:j*n"]]);
        assert!(m.matches_subject_exact(&john()));

        let m = subjects(&[&["user:b*"]]);
        assert!(!m.matches_subject_exact(&john()));
    }

    #[test]
    fn subject_user_names_are_exact() {
        let m = subjects(&[&["user:John"]]);
        assert!(!m.matches_subject_exact(&john()));
    }

    #[test]
    fn subject_tokens_need_a_known_prefix() {
        let err = SubjectToken::parse(7, "admins").unwrap_err();
        assert!(matches!(err, BuildError::InvalidSubject { rule: 7, .. }));

        let err = SubjectToken::parse(7, "group:").unwrap_err();
        assert!(matches!(err, BuildError::InvalidSubject { .. }));
    }

    #[test]
    fn any_match_is_vacuous_for_empty_lists() {
        let none: Vec<DomainMatcher> = Vec::new();
        assert!(any_match(&none, &anon(), &get("anything.example.org", "/")));

        let some = vec![
            DomainMatcher::compile(1, "a.example.com").unwrap(),
            DomainMatcher::compile(1, "b.example.com").unwrap(),
        ];
        assert!(any_match(&some, &anon(), &get("b.example.com", "/")));
        assert!(!any_match(&some, &anon(), &get("c.example.com", "/")));
    }
}
