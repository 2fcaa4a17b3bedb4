//! Ambient context threaded through every rule call.
//!
//! Supplies the already-compiled class metadata, caller side-channel options,
//! the materialization flag, and the callback into the orchestration layer
//! for nested structure processing. The context never stores per-call state;
//! type-build recursion state lives in `BuildCtx`, created fresh per
//! top-level `create_type` call so concurrent callers never share a guard.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{ConfigError, Mismatch};
use crate::meta::{ClassMeta, MetaRegistry};
use crate::model::{ObjectTy, Ty};
use crate::rules;
use crate::value::Presence;

/// Callback into the orchestration layer: decompose a nested structure value
/// and either produce the coerced value or one aggregated failure.
pub trait Orchestrator {
    fn process_structure(
        &self,
        class: &ClassMeta,
        value: Presence,
        ctx: &Context<'_>,
    ) -> Result<Value, Mismatch>;
}

pub struct Context<'a> {
    meta: &'a MetaRegistry,
    orchestrator: &'a dyn Orchestrator,
    /// Whether the orchestration layer materializes objects after validation.
    pub materialize: bool,
    /// Caller-supplied side-channel options, opaque to the engine.
    pub options: IndexMap<String, Value>,
}

impl<'a> Context<'a> {
    pub fn new(meta: &'a MetaRegistry, orchestrator: &'a dyn Orchestrator) -> Self {
        Self {
            meta,
            orchestrator,
            materialize: false,
            options: IndexMap::new(),
        }
    }

    pub fn with_materialize(mut self, materialize: bool) -> Self {
        self.materialize = materialize;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn meta(&self, class: &str) -> Result<&'a ClassMeta, ConfigError> {
        self.meta
            .get(class)
            .ok_or_else(|| ConfigError::UnknownClass(class.to_string()))
    }

    pub fn process_structure(
        &self,
        class: &ClassMeta,
        value: Presence,
    ) -> Result<Value, Mismatch> {
        self.orchestrator.process_structure(class, value, self)
    }
}

// --------------------------- Build-time guard ----------------------------- //

/// Per-`create_type`-call recursion guard over `(class, field)` pairs.
///
/// Push before descending into a field's subtree, pop after; a revisit while
/// still in progress means the schema references itself through that field
/// and gets a terminal marker instead of unbounded recursion.
#[derive(Debug, Default)]
pub struct BuildCtx {
    in_progress: HashSet<(String, String)>,
}

impl BuildCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_progress(&self, class: &str, field: &str) -> bool {
        self.in_progress
            .contains(&(class.to_string(), field.to_string()))
    }

    pub fn push(&mut self, class: &str, field: &str) {
        let fresh = self
            .in_progress
            .insert((class.to_string(), field.to_string()));
        assert!(fresh, "build guard pushed twice for {class}.{field}");
    }

    pub fn pop(&mut self, class: &str, field: &str) {
        let was_there = self
            .in_progress
            .remove(&(class.to_string(), field.to_string()));
        assert!(was_there, "build guard popped without push for {class}.{field}");
    }
}

// ------------------------ Field-wise orchestrator ------------------------- //

/// Reference orchestrator: validates each declared field of the class
/// against the raw object, aggregating per-field failures into one
/// structure node. The production orchestration layer (hooks, defaults,
/// dependency-injected instantiation) replaces this.
#[derive(Debug, Default)]
pub struct FieldwiseOrchestrator;

impl Orchestrator for FieldwiseOrchestrator {
    fn process_structure(
        &self,
        class: &ClassMeta,
        value: Presence,
        ctx: &Context<'_>,
    ) -> Result<Value, Mismatch> {
        let Some(Value::Object(raw)) = value.value() else {
            let mut node = ObjectTy::new(&class.name);
            for (name, descriptor) in &class.fields {
                node.add_field(name, rules::create_type(descriptor, ctx));
            }
            node.invalid = true;
            return Err(Mismatch::new(Ty::Object(node), value));
        };

        let mut node = ObjectTy::new(&class.name);
        for (name, descriptor) in &class.fields {
            node.add_field(name, rules::create_type(descriptor, ctx));
        }

        let mut out = serde_json::Map::new();
        for (name, descriptor) in &class.fields {
            let field_value = match raw.get(name) {
                Some(v) => Presence::present(v.clone()),
                None => Presence::absent(),
            };
            match rules::process(descriptor, field_value, ctx) {
                Ok(coerced) => {
                    out.insert(name.clone(), coerced);
                }
                // A nested structure's own aggregated failure lands in the
                // field slot unwrapped, same as any other failure node.
                Err(mismatch) => node.overwrite_invalid_field(name, mismatch.ty),
            }
        }
        for key in raw.keys() {
            if !class.fields.contains_key(key) {
                node.add_error(Ty::message(format!("unexpected key '{key}'")));
            }
        }

        if node.invalid {
            Err(Mismatch::new(Ty::Object(node), value))
        } else {
            Ok(Value::Object(out))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_push_pop_roundtrip() {
        let mut build = BuildCtx::new();
        assert!(!build.in_progress("A", "next"));
        build.push("A", "next");
        assert!(build.in_progress("A", "next"));
        build.pop("A", "next");
        assert!(!build.in_progress("A", "next"));
    }

    #[test]
    #[should_panic(expected = "pushed twice")]
    fn double_push_panics() {
        let mut build = BuildCtx::new();
        build.push("A", "next");
        build.push("A", "next");
    }

    #[test]
    #[should_panic(expected = "without push")]
    fn unbalanced_pop_panics() {
        let mut build = BuildCtx::new();
        build.pop("A", "next");
    }
}
