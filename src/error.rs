//! Failure channels.
//!
//! Two distinct families, never mixed:
//! - `ConfigError`: the schema author misconfigured a rule. Raised while
//!   resolving descriptors, fatal to schema compilation, never caught inside
//!   the engine.
//! - `Mismatch`: a runtime value did not match. Carries the annotated type
//!   node plus the offending input; it is the sole failure signal flowing
//!   through nested composition.
//!
//! Illegal internal state transitions (slot machines, scope stack) are not
//! errors of either family; they panic.

use thiserror::Error;

use crate::model::Ty;
use crate::value::Presence;

/// Schema-author bug found while resolving rule arguments.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("rule '{rule}': unknown argument key '{key}'")]
    UnknownKey { rule: &'static str, key: String },

    #[error("rule '{rule}': missing required argument '{key}'")]
    MissingKey { rule: &'static str, key: &'static str },

    #[error("rule '{rule}': argument '{key}' expects {expected}, got {got}")]
    WrongArgType {
        rule: &'static str,
        key: &'static str,
        expected: &'static str,
        got: String,
    },

    #[error("rule '{rule}': contradictory bounds ({detail})")]
    ContradictoryBounds { rule: &'static str, detail: String },

    #[error("unknown rule kind '{0}'")]
    UnknownRule(String),

    #[error("unknown class '{0}'")]
    UnknownClass(String),

    #[error("rule '{rule}': malformed descriptor ({detail})")]
    MalformedDescriptor { rule: &'static str, detail: String },

    #[error("rule '{rule}': invalid pattern '{pattern}': {detail}")]
    BadPattern {
        rule: &'static str,
        pattern: String,
        detail: String,
    },
}

/// Runtime failure: the annotated expected-shape node plus the original
/// input exactly as the rule received it.
#[derive(Clone, Debug, PartialEq)]
pub struct Mismatch {
    pub ty: Ty,
    pub value: Presence,
}

impl Mismatch {
    pub fn new(ty: Ty, value: Presence) -> Self {
        Self { ty, value }
    }
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "value does not match: {}", crate::format::render(&self.ty))
    }
}

impl std::error::Error for Mismatch {}
