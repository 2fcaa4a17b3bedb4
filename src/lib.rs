//! Validation of untyped JSON-shaped data against composable rule schemas.
//!
//! Three layers:
//! - the Type Model (`model`): one tree encoding both the expected shape of a
//!   value and, after validation, exactly which parts were violated;
//! - the Rule Engine (`rules`): descriptor resolution, schema-type creation
//!   and value processing for leaf, compound, container and structure rules;
//! - the Error-Aware Formatter (`format`): a scope-stack-driven renderer
//!   turning a post-validation type tree into a report, normally showing only
//!   the invalid parts.
//!
//! Design goals:
//! - Validation either coerces the input into a produced value or yields one
//!   aggregated, structured failure; nothing is reported by side effect.
//! - Failures are located by the ORIGINAL input keys so callers can point at
//!   the data they actually supplied.
//! - Schema-author mistakes (`ConfigError`) are fatal and surface at resolve
//!   time; engine-state violations panic; only data mismatches flow through
//!   `Result`.

pub mod value;
pub mod dump;
pub mod model;
pub mod error;
pub mod meta;
pub mod context;
pub mod rules;
pub mod format;
pub mod path_de;

pub use context::{BuildCtx, Context, FieldwiseOrchestrator, Orchestrator};
pub use dump::Dumper;
pub use error::{ConfigError, Mismatch};
pub use format::Formatter;
pub use meta::{ClassMeta, MetaRegistry};
pub use model::Ty;
pub use rules::{create_type, process, resolve, resolve_str, Descriptor};
pub use value::Presence;
