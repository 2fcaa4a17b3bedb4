//! Rule Engine.
//!
//! One closed kind enum, one resolved-argument struct per rule, and three
//! operations dispatched by exhaustive match:
//! - `resolve`: turn a raw descriptor document into a `Descriptor`, failing
//!   with `ConfigError` on schema-author mistakes (nested descriptors are
//!   resolved recursively, so malformed configuration on a branch that never
//!   runs still fails at compile time);
//! - `process`: check/coerce one value, failing with a `Mismatch` carrying
//!   an annotated type node;
//! - `create_type`: build the expected-shape node with no value in hand.
//!
//! Rules are pure functions of (value, args, context); nothing here keeps
//! state between calls.

pub mod scalar;
pub mod compound;
pub mod collection;
pub mod structure;

use ordered_float::OrderedFloat;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::context::{BuildCtx, Context};
use crate::error::{ConfigError, Mismatch};
use crate::model::Ty;
use crate::value::Presence;

// ------------------------------ Kind tags --------------------------------- //

/// Every rule the engine knows, with its stable wire tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Bool,
    Int,
    Float,
    Str,
    Null,
    Enum,
    Scalar,
    Datetime,
    Url,
    InstanceOf,
    Object,
    AllOf,
    AnyOf,
    ArrayOf,
    ListOf,
    Structure,
}

impl RuleKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "bool" => RuleKind::Bool,
            "int" => RuleKind::Int,
            "float" => RuleKind::Float,
            "string" => RuleKind::Str,
            "null" => RuleKind::Null,
            "enum" => RuleKind::Enum,
            "scalar" => RuleKind::Scalar,
            "datetime" => RuleKind::Datetime,
            "url" => RuleKind::Url,
            "instanceOf" => RuleKind::InstanceOf,
            "object" => RuleKind::Object,
            "allOf" => RuleKind::AllOf,
            "anyOf" => RuleKind::AnyOf,
            "arrayOf" => RuleKind::ArrayOf,
            "listOf" => RuleKind::ListOf,
            "structure" => RuleKind::Structure,
            _ => return None,
        })
    }

    pub fn tag(self) -> &'static str {
        match self {
            RuleKind::Bool => "bool",
            RuleKind::Int => "int",
            RuleKind::Float => "float",
            RuleKind::Str => "string",
            RuleKind::Null => "null",
            RuleKind::Enum => "enum",
            RuleKind::Scalar => "scalar",
            RuleKind::Datetime => "datetime",
            RuleKind::Url => "url",
            RuleKind::InstanceOf => "instanceOf",
            RuleKind::Object => "object",
            RuleKind::AllOf => "allOf",
            RuleKind::AnyOf => "anyOf",
            RuleKind::ArrayOf => "arrayOf",
            RuleKind::ListOf => "listOf",
            RuleKind::Structure => "structure",
        }
    }
}

// --------------------------- Resolved arguments --------------------------- //

/// Scalar literal usable as an enum case. Floats go through `OrderedFloat`
/// so resolved descriptors stay comparable.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
}

impl Literal {
    pub fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Null => Some(Literal::Null),
            Value::Bool(b) => Some(Literal::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Literal::Int(i))
                } else {
                    n.as_f64().map(|f| Literal::Float(OrderedFloat(f)))
                }
            }
            Value::String(s) => Some(Literal::Str(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn matches(&self, v: &Value) -> bool {
        match (self, v) {
            (Literal::Null, Value::Null) => true,
            (Literal::Bool(b), Value::Bool(x)) => b == x,
            (Literal::Int(i), Value::Number(n)) => n.as_i64() == Some(*i),
            (Literal::Float(f), Value::Number(n)) => n.as_f64() == Some(f.0),
            (Literal::Str(s), Value::String(x)) => s == x,
            _ => false,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::from(*i),
            Literal::Float(f) => serde_json::Number::from_f64(f.0)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Literal::Str(s) => Value::String(s.clone()),
        }
    }
}

/// A regex argument validated at resolve time. Equality is on the source
/// pattern; the compiled automaton rides along.
#[derive(Clone, Debug)]
pub struct Pattern {
    pub source: String,
    pub regex: Regex,
}

impl Pattern {
    pub fn compile(rule: &'static str, source: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(source).map_err(|e| ConfigError::BadPattern {
            rule,
            pattern: source.to_string(),
            detail: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct BoolArgs {
    pub cast_bool_like: bool,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct IntArgs {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub unsigned: bool,
    pub cast_numeric_string: bool,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct FloatArgs {
    pub min: Option<OrderedFloat<f64>>,
    pub max: Option<OrderedFloat<f64>>,
    pub unsigned: bool,
    pub cast_numeric_string: bool,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct StringArgs {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub not_empty: bool,
    pub pattern: Option<Pattern>,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct NullArgs {
    pub cast_empty_string: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumArgs {
    pub cases: Vec<Literal>,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct DatetimeArgs {
    /// chrono strftime format; RFC 3339 when absent.
    pub format: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InstanceOfArgs {
    pub class: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompoundArgs {
    pub rules: Vec<Descriptor>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArrayArgs {
    pub item: Box<Descriptor>,
    pub key: Option<Box<Descriptor>>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub default: Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListArgs {
    pub item: Box<Descriptor>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub default: Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructureArgs {
    pub class: String,
}

/// Resolved arguments, one variant per rule kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Args {
    Bool(BoolArgs),
    Int(IntArgs),
    Float(FloatArgs),
    Str(StringArgs),
    Null(NullArgs),
    Enum(EnumArgs),
    Scalar,
    Datetime(DatetimeArgs),
    Url,
    InstanceOf(InstanceOfArgs),
    Object,
    AllOf(CompoundArgs),
    AnyOf(CompoundArgs),
    ArrayOf(ArrayArgs),
    ListOf(ListArgs),
    Structure(StructureArgs),
}

/// A fully resolved rule descriptor: kind tag plus validated arguments.
/// Produced once per field by external schema compilation, then reused.
#[derive(Clone, Debug, PartialEq)]
pub struct Descriptor {
    pub kind: RuleKind,
    pub args: Args,
}

// ----------------------------- Raw wire form ------------------------------ //

/// Raw descriptor document: `{"rule": "<tag>", "args": { ... }}`.
#[derive(Debug, Deserialize)]
pub struct RawDescriptor {
    pub rule: String,
    #[serde(default)]
    pub args: Option<Value>,
}

/// Parse a raw descriptor source string with JSON-path error context.
pub fn resolve_str(src: &str, ctx: &Context<'_>) -> Result<Descriptor, ConfigError> {
    let raw: RawDescriptor = crate::path_de::from_str_with_path(src).map_err(|detail| {
        ConfigError::MalformedDescriptor {
            rule: "descriptor",
            detail,
        }
    })?;
    resolve_raw(&raw, ctx)
}

/// Resolve an in-memory raw descriptor value.
pub fn resolve(raw: &Value, ctx: &Context<'_>) -> Result<Descriptor, ConfigError> {
    let raw: RawDescriptor =
        serde_json::from_value(raw.clone()).map_err(|e| ConfigError::MalformedDescriptor {
            rule: "descriptor",
            detail: e.to_string(),
        })?;
    resolve_raw(&raw, ctx)
}

fn resolve_raw(raw: &RawDescriptor, ctx: &Context<'_>) -> Result<Descriptor, ConfigError> {
    let kind = RuleKind::from_tag(&raw.rule)
        .ok_or_else(|| ConfigError::UnknownRule(raw.rule.clone()))?;
    let args = resolve_args(kind, raw.args.as_ref(), ctx)?;
    Ok(Descriptor { kind, args })
}

/// Validate raw arguments for one kind. Configuration errors raised here are
/// fatal to schema compilation.
pub fn resolve_args(
    kind: RuleKind,
    raw_args: Option<&Value>,
    ctx: &Context<'_>,
) -> Result<Args, ConfigError> {
    match kind {
        RuleKind::Bool => scalar::resolve_bool(raw_args),
        RuleKind::Int => scalar::resolve_int(raw_args),
        RuleKind::Float => scalar::resolve_float(raw_args),
        RuleKind::Str => scalar::resolve_string(raw_args),
        RuleKind::Null => scalar::resolve_null(raw_args),
        RuleKind::Enum => scalar::resolve_enum(raw_args),
        RuleKind::Scalar => scalar::resolve_no_args("scalar", raw_args, Args::Scalar),
        RuleKind::Datetime => scalar::resolve_datetime(raw_args),
        RuleKind::Url => scalar::resolve_no_args("url", raw_args, Args::Url),
        RuleKind::InstanceOf => scalar::resolve_instance_of(raw_args, ctx),
        RuleKind::Object => scalar::resolve_no_args("object", raw_args, Args::Object),
        RuleKind::AllOf => compound::resolve_args("allOf", raw_args, ctx).map(Args::AllOf),
        RuleKind::AnyOf => compound::resolve_args("anyOf", raw_args, ctx).map(Args::AnyOf),
        RuleKind::ArrayOf => collection::resolve_array(raw_args, ctx),
        RuleKind::ListOf => collection::resolve_list(raw_args, ctx),
        RuleKind::Structure => structure::resolve_args(raw_args, ctx),
    }
}

// ------------------------------- Dispatch --------------------------------- //

/// Runtime check/coercion. Either the (possibly transformed) value, or a
/// mismatch carrying the annotated type node and the original input.
pub fn process(
    descriptor: &Descriptor,
    value: Presence,
    ctx: &Context<'_>,
) -> Result<Value, Mismatch> {
    match &descriptor.args {
        Args::Bool(args) => scalar::process_bool(args, value),
        Args::Int(args) => scalar::process_int(args, value),
        Args::Float(args) => scalar::process_float(args, value),
        Args::Str(args) => scalar::process_string(args, value),
        Args::Null(args) => scalar::process_null(args, value),
        Args::Enum(args) => scalar::process_enum(args, value),
        Args::Scalar => scalar::process_scalar(value),
        Args::Datetime(args) => scalar::process_datetime(args, value),
        Args::Url => scalar::process_url(value),
        Args::InstanceOf(args) => scalar::process_instance_of(args, value, ctx),
        Args::Object => scalar::process_object(value),
        Args::AllOf(args) => compound::process_all_of(args, value, ctx),
        Args::AnyOf(args) => compound::process_any_of(args, value, ctx),
        Args::ArrayOf(args) => collection::process_array(args, value, ctx),
        Args::ListOf(args) => collection::process_list(args, value, ctx),
        Args::Structure(args) => structure::process(args, value, ctx),
    }
}

/// Build the expected-shape node for a descriptor, independent of any value.
/// Deterministic: identical arguments always yield structurally equal trees.
pub fn create_type(descriptor: &Descriptor, ctx: &Context<'_>) -> Ty {
    let mut build = BuildCtx::new();
    create_type_in(descriptor, ctx, &mut build)
}

pub(crate) fn create_type_in(
    descriptor: &Descriptor,
    ctx: &Context<'_>,
    build: &mut BuildCtx,
) -> Ty {
    match &descriptor.args {
        Args::Bool(args) => scalar::bool_type(args),
        Args::Int(args) => scalar::int_type(args),
        Args::Float(args) => scalar::float_type(args),
        Args::Str(args) => scalar::string_type(args),
        Args::Null(args) => scalar::null_type(args),
        Args::Enum(args) => scalar::enum_type(args),
        Args::Scalar => scalar::scalar_type(),
        Args::Datetime(args) => scalar::datetime_type(args),
        Args::Url => scalar::url_type(),
        Args::InstanceOf(args) => scalar::instance_of_type(args),
        Args::Object => scalar::object_type(),
        Args::AllOf(args) => compound::create_type(crate::model::Operator::And, args, ctx, build),
        Args::AnyOf(args) => compound::create_type(crate::model::Operator::Or, args, ctx, build),
        Args::ArrayOf(args) => collection::array_type(args, ctx, build),
        Args::ListOf(args) => collection::list_type(args, ctx, build),
        Args::Structure(args) => structure::create_type(args, ctx, build),
    }
}

// -------------------------- Argument plumbing ----------------------------- //

pub(crate) fn args_object<'a>(
    rule: &'static str,
    raw: Option<&'a Value>,
    allowed: &[&str],
) -> Result<Option<&'a Map<String, Value>>, ConfigError> {
    let Some(raw) = raw else { return Ok(None) };
    let map = raw.as_object().ok_or_else(|| ConfigError::WrongArgType {
        rule,
        key: "args",
        expected: "an object",
        got: value_kind(raw).to_string(),
    })?;
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(ConfigError::UnknownKey {
                rule,
                key: key.clone(),
            });
        }
    }
    Ok(Some(map))
}

pub(crate) fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn get_bool(
    rule: &'static str,
    map: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<bool>, ConfigError> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(ConfigError::WrongArgType {
            rule,
            key,
            expected: "a bool",
            got: value_kind(other).to_string(),
        }),
    }
}

pub(crate) fn get_i64(
    rule: &'static str,
    map: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<i64>, ConfigError> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) if n.as_i64().is_some() => Ok(n.as_i64()),
        Some(other) => Err(ConfigError::WrongArgType {
            rule,
            key,
            expected: "an integer",
            got: value_kind(other).to_string(),
        }),
    }
}

pub(crate) fn get_u64(
    rule: &'static str,
    map: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<u64>, ConfigError> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) if n.as_u64().is_some() => Ok(n.as_u64()),
        Some(other) => Err(ConfigError::WrongArgType {
            rule,
            key,
            expected: "a non-negative integer",
            got: value_kind(other).to_string(),
        }),
    }
}

pub(crate) fn get_f64(
    rule: &'static str,
    map: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<f64>, ConfigError> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(other) => Err(ConfigError::WrongArgType {
            rule,
            key,
            expected: "a number",
            got: value_kind(other).to_string(),
        }),
    }
}

pub(crate) fn get_str<'a>(
    rule: &'static str,
    map: &'a Map<String, Value>,
    key: &'static str,
) -> Result<Option<&'a str>, ConfigError> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ConfigError::WrongArgType {
            rule,
            key,
            expected: "a string",
            got: value_kind(other).to_string(),
        }),
    }
}

pub(crate) fn require_str<'a>(
    rule: &'static str,
    map: Option<&'a Map<String, Value>>,
    key: &'static str,
) -> Result<&'a str, ConfigError> {
    map.and_then(|m| m.get(key))
        .ok_or(ConfigError::MissingKey { rule, key })
        .and_then(|v| {
            v.as_str().ok_or_else(|| ConfigError::WrongArgType {
                rule,
                key,
                expected: "a string",
                got: value_kind(v).to_string(),
            })
        })
}

/// Resolve a nested raw descriptor through the context. Used by every rule
/// that nests other rules so bad nested configuration fails eagerly.
pub(crate) fn resolve_nested(
    rule: &'static str,
    key: &'static str,
    raw: &Value,
    ctx: &Context<'_>,
) -> Result<Descriptor, ConfigError> {
    resolve(raw, ctx).map_err(|e| match e {
        ConfigError::MalformedDescriptor { detail, .. } => ConfigError::MalformedDescriptor {
            rule,
            detail: format!("nested '{key}': {detail}"),
        },
        other => other,
    })
}

// ------------------------------- Tests ------------------------------------ //
