//! Type Model.
//!
//! One tree that encodes both the expected shape of a value and, after a
//! validation pass, exactly which parts of it were violated. Reporting never
//! re-runs validation; it only reads this tree.
//!
//! Design notes:
//! - `Ty` is a closed tagged union; every consumer matches exhaustively so a
//!   new node kind cannot fall through silently.
//! - Nodes are built fresh per call and owned by a single parent; nothing in
//!   here is shared or cached across calls.
//! - Mutation is restricted to the guarded operations below. Illegal
//!   transitions panic: they signal an engine bug, not bad input.

pub mod compound;
pub mod collection;
pub mod object;

use indexmap::IndexMap;
use serde_json::Value;

pub use compound::{CompoundTy, Operator, SlotState, Subtype};
pub use collection::{ArrayTy, InvalidPair, ListTy};
pub use object::{FieldSlot, ObjectTy};

// ------------------------------ Node kinds -------------------------------- //

/// A node in the type tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Ty {
    /// Terminal text, e.g. a class-level error or a circular-reference marker.
    Message(MessageTy),
    /// Named leaf with keyed, independently-invalidatable parameters.
    Simple(SimpleTy),
    /// Ordered literal case set.
    Enum(EnumTy),
    /// AND/OR over subtypes, each with its own slot state.
    Compound(CompoundTy),
    /// Keyed container (item type, optional key type, invalid pairs).
    Array(ArrayTy),
    /// Sequential container (item type, dense-key requirement, invalid items).
    List(ListTy),
    /// Ordered field map for a compiled class, plus class-level errors.
    Object(ObjectTy),
}

impl Ty {
    pub fn message(text: impl Into<String>) -> Ty {
        Ty::Message(MessageTy { text: text.into() })
    }

    /// Whether this subtree carries any recorded violation.
    ///
    /// A bare `Message` counts as invalid: messages only enter a tree as
    /// failure markers or class-level errors.
    pub fn is_invalid(&self) -> bool {
        match self {
            Ty::Message(_) => true,
            Ty::Simple(simple) => simple.params.any_invalid(),
            Ty::Enum(e) => e.invalid,
            Ty::Compound(compound) => compound.has_invalid_subtype(),
            Ty::Array(array) => array.params.any_invalid() || !array.invalid_pairs.is_empty(),
            Ty::List(list) => list.params.any_invalid() || !list.invalid_items.is_empty(),
            Ty::Object(object) => object.invalid,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MessageTy {
    pub text: String,
}

/// Ordered literal case set, e.g. the allowed values of an enum rule.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumTy {
    pub cases: Vec<Value>,
    /// Set when a value matched none of the cases.
    pub invalid: bool,
}

impl EnumTy {
    pub fn new(cases: Vec<Value>) -> Self {
        Self {
            cases,
            invalid: false,
        }
    }

    pub fn mark_invalid(&mut self) {
        self.invalid = true;
    }
}

// ------------------------------ Parameters -------------------------------- //

/// One keyed parameter of a parametrized node (`minItems: 10`, `unsigned`, ...).
///
/// Created at schema-build time; the only legal mutation afterwards is
/// flipping `invalid`.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeParameter {
    pub key: String,
    pub value: Option<Value>,
    pub invalid: bool,
}

/// Ordered parameter map shared by every parametrized node kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params {
    entries: IndexMap<String, TypeParameter>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a valueless parameter (a bare flag such as `unsigned`).
    pub fn declare(&mut self, key: impl Into<String>) {
        self.insert(key.into(), None);
    }

    /// Declare a parameter carrying a value (`minItems: 10`).
    pub fn declare_with_value(&mut self, key: impl Into<String>, value: Value) {
        self.insert(key.into(), Some(value));
    }

    fn insert(&mut self, key: String, value: Option<Value>) {
        let prior = self.entries.insert(
            key.clone(),
            TypeParameter {
                key,
                value,
                invalid: false,
            },
        );
        assert!(
            prior.is_none(),
            "parameter declared twice: {}",
            self.entries.last().map(|(k, _)| k.as_str()).unwrap_or("?")
        );
    }

    /// Flip a declared parameter to invalid. Panics on an undeclared key.
    pub fn mark_invalid(&mut self, key: &str) {
        let param = self
            .entries
            .get_mut(key)
            .unwrap_or_else(|| panic!("parameter never declared: {key}"));
        param.invalid = true;
    }

    pub fn mark_invalid_many<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        for key in keys {
            self.mark_invalid(key);
        }
    }

    pub fn get(&self, key: &str) -> Option<&TypeParameter> {
        self.entries.get(key)
    }

    pub fn is_invalid(&self, key: &str) -> bool {
        self.entries.get(key).map(|p| p.invalid).unwrap_or(false)
    }

    pub fn any_invalid(&self) -> bool {
        self.entries.values().any(|p| p.invalid)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeParameter> {
        self.entries.values()
    }
}

// ------------------------------ Simple leaf ------------------------------- //

/// Named leaf node: `int`, `string`, `datetime`, ...
#[derive(Clone, Debug, PartialEq)]
pub struct SimpleTy {
    pub name: String,
    pub params: Params,
}

impl SimpleTy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Params::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>) -> Self {
        self.params.declare(key);
        self
    }

    pub fn with_param_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.declare_with_value(key, value);
        self
    }

    pub fn mark_parameter_invalid(&mut self, key: &str) {
        self.params.mark_invalid(key);
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parameters_keep_declaration_order() {
        let mut params = Params::new();
        params.declare_with_value("min", json!(1));
        params.declare_with_value("max", json!(9));
        params.declare("unsigned");
        let keys: Vec<&str> = params.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["min", "max", "unsigned"]);
    }

    #[test]
    fn marking_violations_is_independent_per_key() {
        let mut simple = SimpleTy::new("int")
            .with_param_value("min", json!(0))
            .with_param("unsigned");
        simple.mark_parameter_invalid("min");
        simple.mark_parameter_invalid("unsigned");
        assert!(simple.params.is_invalid("min"));
        assert!(simple.params.is_invalid("unsigned"));
        assert!(simple.params.any_invalid());
    }

    #[test]
    #[should_panic(expected = "never declared")]
    fn marking_an_undeclared_parameter_panics() {
        let mut simple = SimpleTy::new("int");
        simple.mark_parameter_invalid("max");
    }

    #[test]
    #[should_panic(expected = "declared twice")]
    fn redeclaring_a_parameter_panics() {
        let mut params = Params::new();
        params.declare("unsigned");
        params.declare("unsigned");
    }

    #[test]
    fn message_nodes_count_as_invalid() {
        assert!(Ty::message("circular reference").is_invalid());
        let clean = Ty::Simple(SimpleTy::new("string"));
        assert!(!clean.is_invalid());
    }
}
