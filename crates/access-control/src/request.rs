//! Per-request descriptors handed to the evaluator by the HTTP layer.

use std::fmt;
use std::net::IpAddr;

use url::Url;

use crate::level::AuthenticationLevel;

/// The identity making the request.
///
/// A subject with an empty `username` is anonymous: the caller has not
/// established who they are yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub username: String,
    pub groups: Vec<String>,
    pub display_name: String,
    pub ip: IpAddr,
    pub level: AuthenticationLevel,
}

impl Subject {
    /// An unauthenticated caller connecting from `ip`.
    pub fn anonymous(ip: IpAddr) -> Self {
        Self {
            username: String::new(),
            groups: Vec::new(),
            display_name: String::new(),
            ip,
            level: AuthenticationLevel::NotAuthenticated,
        }
    }

    /// A named caller. The authentication level starts at one factor and
    /// can be raised with [`with_level`](Self::with_level).
    pub fn new<I, S>(username: impl Into<String>, groups: I, ip: IpAddr) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            username: username.into(),
            groups: groups.into_iter().map(Into::into).collect(),
            display_name: String::new(),
            ip,
            level: AuthenticationLevel::OneFactor,
        }
    }

    pub fn with_level(mut self, level: AuthenticationLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_empty()
    }

    pub(crate) fn has_group_ignore_case(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g.eq_ignore_ascii_case(group))
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "username={} groups={} ip={}",
            friendly_username(&self.username),
            self.groups.join(","),
            self.ip
        )
    }
}

/// The resource being requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    /// Lowercased host name, without port.
    pub domain: String,
    /// Request path, always starting with `/`.
    pub path: String,
    pub method: String,
    /// Decoded query pairs in request order. Keys may repeat.
    pub query: Vec<(String, String)>,
}

impl Object {
    pub fn new(domain: impl Into<String>, path: impl Into<String>, method: impl Into<String>) -> Self {
        let mut domain = domain.into();
        domain.make_ascii_lowercase();

        let mut path = path.into();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }

        Self {
            domain,
            path,
            method: method.into(),
            query: Vec::new(),
        }
    }

    pub fn with_query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Build an object from the forwarded target URL.
    pub fn from_url(url: &Url, method: impl Into<String>) -> Self {
        Self::new(url.host_str().unwrap_or_default(), url.path(), method).with_query(
            url.query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        )
    }

    /// First value for `key`, if the key is present at all.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.domain, self.path)
    }
}

pub(crate) fn friendly_username(username: &str) -> &str {
    if username.is_empty() {
        "<anonymous>"
    } else {
        username
    }
}

pub(crate) fn friendly_method(method: &str) -> &str {
    if method.is_empty() {
        "unknown"
    } else {
        method
    }
}
