//! # access-control
//!
//! Authorization core for a forward-authentication gateway. This crate
//! compiles access-control rules into immutable matchers, selects the first
//! rule that matches a request, and turns the rule's policy plus the
//! caller's authentication level into a verdict.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use access_control::{loader, AccessControl, Object, Subject};
//!
//! let config = loader::load_config("access_control.yaml").unwrap();
//! let acl = AccessControl::new(&config).unwrap();
//!
//! let subject = Subject::anonymous("10.0.0.1".parse().unwrap());
//! let object = Object::new("app.example.com", "/", "GET");
//! println!("{:?}", acl.authorize(&subject, &object).result);
//! ```

mod decision;
mod error;
mod evaluator;
mod level;
pub mod loader;
pub mod matcher;
mod network;
mod request;
mod rule;
mod schema;

// Re-export primary public API at crate root.
pub use decision::{decide, Authorization, AuthzResult};
pub use error::BuildError;
pub use evaluator::{AccessControl, RequiredLevel, RuleSet};
pub use level::{AuthenticationLevel, Policy};
pub use network::NetworkTable;
pub use request::{Object, Subject};
pub use rule::{compile_rules, Gate, Rule, RuleMatchResult};
pub use schema::{
    AccessControlConfig, NetworkGroupConfig, QueryConditionConfig, QueryOperator, ResourceConfig,
    RuleConfig, SubjectConfig,
};
