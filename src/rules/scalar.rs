//! Leaf rules: one predicate (plus optional coercion) per JSON scalar kind.
//!
//! Every violated constraint parameter is marked invalid independently, so a
//! value breaking both `unsigned` and `min` reports both, not just the first
//! one found.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use ordered_float::OrderedFloat;
use regex::Regex;
use serde_json::{json, Value};

use crate::context::Context;
use crate::error::{ConfigError, Mismatch};
use crate::model::{CompoundTy, EnumTy, Operator, SimpleTy, Ty};
use crate::value::Presence;

use super::{
    args_object, get_bool, get_f64, get_i64, get_str, get_u64, require_str, Args, BoolArgs,
    DatetimeArgs, EnumArgs, FloatArgs, InstanceOfArgs, IntArgs, Literal, NullArgs, Pattern,
    StringArgs,
};

static INT_STRING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?[0-9]+$").unwrap());
static FLOAT_STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?([0-9]+(\.[0-9]+)?|\.[0-9]+)([eE][+-]?[0-9]+)?$").unwrap());
static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://[^\s/?#]+[^\s]*$").unwrap());

// ------------------------------ resolveArgs ------------------------------- //

pub fn resolve_no_args(
    rule: &'static str,
    raw: Option<&Value>,
    out: Args,
) -> Result<Args, ConfigError> {
    args_object(rule, raw, &[])?;
    Ok(out)
}

pub fn resolve_bool(raw: Option<&Value>) -> Result<Args, ConfigError> {
    let mut args = BoolArgs::default();
    if let Some(map) = args_object("bool", raw, &["castBoolLike"])? {
        args.cast_bool_like = get_bool("bool", map, "castBoolLike")?.unwrap_or(false);
    }
    Ok(Args::Bool(args))
}

pub fn resolve_int(raw: Option<&Value>) -> Result<Args, ConfigError> {
    let mut args = IntArgs::default();
    if let Some(map) = args_object("int", raw, &["min", "max", "unsigned", "castNumericString"])? {
        args.min = get_i64("int", map, "min")?;
        args.max = get_i64("int", map, "max")?;
        args.unsigned = get_bool("int", map, "unsigned")?.unwrap_or(false);
        args.cast_numeric_string = get_bool("int", map, "castNumericString")?.unwrap_or(false);
    }
    if let (Some(min), Some(max)) = (args.min, args.max) {
        if max < min {
            return Err(ConfigError::ContradictoryBounds {
                rule: "int",
                detail: format!("max {max} < min {min}"),
            });
        }
    }
    if args.unsigned {
        if let Some(bound) = [args.min, args.max].into_iter().flatten().find(|b| *b < 0) {
            return Err(ConfigError::ContradictoryBounds {
                rule: "int",
                detail: format!("unsigned forbids negative bound {bound}"),
            });
        }
    }
    Ok(Args::Int(args))
}

pub fn resolve_float(raw: Option<&Value>) -> Result<Args, ConfigError> {
    let mut args = FloatArgs::default();
    if let Some(map) = args_object(
        "float",
        raw,
        &["min", "max", "unsigned", "castNumericString"],
    )? {
        args.min = get_f64("float", map, "min")?.map(OrderedFloat);
        args.max = get_f64("float", map, "max")?.map(OrderedFloat);
        args.unsigned = get_bool("float", map, "unsigned")?.unwrap_or(false);
        args.cast_numeric_string = get_bool("float", map, "castNumericString")?.unwrap_or(false);
    }
    if let (Some(min), Some(max)) = (args.min, args.max) {
        if max < min {
            return Err(ConfigError::ContradictoryBounds {
                rule: "float",
                detail: format!("max {max} < min {min}"),
            });
        }
    }
    if args.unsigned {
        if let Some(bound) = [args.min, args.max]
            .into_iter()
            .flatten()
            .find(|b| b.0 < 0.0)
        {
            return Err(ConfigError::ContradictoryBounds {
                rule: "float",
                detail: format!("unsigned forbids negative bound {bound}"),
            });
        }
    }
    Ok(Args::Float(args))
}

pub fn resolve_string(raw: Option<&Value>) -> Result<Args, ConfigError> {
    let mut args = StringArgs::default();
    if let Some(map) = args_object(
        "string",
        raw,
        &["minLength", "maxLength", "notEmpty", "pattern"],
    )? {
        args.min_length = get_u64("string", map, "minLength")?;
        args.max_length = get_u64("string", map, "maxLength")?;
        args.not_empty = get_bool("string", map, "notEmpty")?.unwrap_or(false);
        if let Some(src) = get_str("string", map, "pattern")? {
            args.pattern = Some(Pattern::compile("string", src)?);
        }
    }
    if let (Some(min), Some(max)) = (args.min_length, args.max_length) {
        if max < min {
            return Err(ConfigError::ContradictoryBounds {
                rule: "string",
                detail: format!("maxLength {max} < minLength {min}"),
            });
        }
    }
    Ok(Args::Str(args))
}

pub fn resolve_null(raw: Option<&Value>) -> Result<Args, ConfigError> {
    let mut args = NullArgs::default();
    if let Some(map) = args_object("null", raw, &["castEmptyString"])? {
        args.cast_empty_string = get_bool("null", map, "castEmptyString")?.unwrap_or(false);
    }
    Ok(Args::Null(args))
}

pub fn resolve_enum(raw: Option<&Value>) -> Result<Args, ConfigError> {
    let map = args_object("enum", raw, &["cases"])?.ok_or(ConfigError::MissingKey {
        rule: "enum",
        key: "cases",
    })?;
    let raw_cases = map.get("cases").ok_or(ConfigError::MissingKey {
        rule: "enum",
        key: "cases",
    })?;
    let Some(raw_cases) = raw_cases.as_array() else {
        return Err(ConfigError::WrongArgType {
            rule: "enum",
            key: "cases",
            expected: "an array of scalar literals",
            got: super::value_kind(raw_cases).to_string(),
        });
    };
    if raw_cases.is_empty() {
        return Err(ConfigError::MalformedDescriptor {
            rule: "enum",
            detail: "cases must not be empty".into(),
        });
    }
    let mut cases = Vec::with_capacity(raw_cases.len());
    for case in raw_cases {
        let lit = Literal::from_value(case).ok_or_else(|| ConfigError::MalformedDescriptor {
            rule: "enum",
            detail: format!("case is not a scalar literal: {case}"),
        })?;
        cases.push(lit);
    }
    Ok(Args::Enum(EnumArgs { cases }))
}

pub fn resolve_datetime(raw: Option<&Value>) -> Result<Args, ConfigError> {
    let mut args = DatetimeArgs::default();
    if let Some(map) = args_object("datetime", raw, &["format"])? {
        if let Some(fmt) = get_str("datetime", map, "format")? {
            let broken = StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error));
            if broken {
                return Err(ConfigError::MalformedDescriptor {
                    rule: "datetime",
                    detail: format!("invalid format string '{fmt}'"),
                });
            }
            args.format = Some(fmt.to_string());
        }
    }
    Ok(Args::Datetime(args))
}

pub fn resolve_instance_of(raw: Option<&Value>, ctx: &Context<'_>) -> Result<Args, ConfigError> {
    let map = args_object("instanceOf", raw, &["class"])?;
    let class = require_str("instanceOf", map, "class")?;
    // Class existence is a resolve-time concern; runtime assumes it.
    ctx.meta(class)?;
    Ok(Args::InstanceOf(InstanceOfArgs {
        class: class.to_string(),
    }))
}

// ------------------------------ createType -------------------------------- //

fn bool_simple(args: &BoolArgs) -> SimpleTy {
    let mut ty = SimpleTy::new("bool");
    if args.cast_bool_like {
        ty = ty.with_param("castBoolLike");
    }
    ty
}

fn int_simple(args: &IntArgs) -> SimpleTy {
    let mut ty = SimpleTy::new("int");
    if let Some(min) = args.min {
        ty = ty.with_param_value("min", json!(min));
    }
    if let Some(max) = args.max {
        ty = ty.with_param_value("max", json!(max));
    }
    if args.unsigned {
        ty = ty.with_param("unsigned");
    }
    if args.cast_numeric_string {
        ty = ty.with_param("castNumericString");
    }
    ty
}

fn float_simple(args: &FloatArgs) -> SimpleTy {
    let mut ty = SimpleTy::new("float");
    if let Some(min) = args.min {
        ty = ty.with_param_value("min", json!(min.0));
    }
    if let Some(max) = args.max {
        ty = ty.with_param_value("max", json!(max.0));
    }
    if args.unsigned {
        ty = ty.with_param("unsigned");
    }
    if args.cast_numeric_string {
        ty = ty.with_param("castNumericString");
    }
    ty
}

fn string_simple(args: &StringArgs) -> SimpleTy {
    let mut ty = SimpleTy::new("string");
    if let Some(min) = args.min_length {
        ty = ty.with_param_value("minLength", json!(min));
    }
    if let Some(max) = args.max_length {
        ty = ty.with_param_value("maxLength", json!(max));
    }
    if args.not_empty {
        ty = ty.with_param("notEmpty");
    }
    if let Some(pattern) = &args.pattern {
        ty = ty.with_param_value("pattern", json!(pattern.source));
    }
    ty
}

fn null_simple(args: &NullArgs) -> SimpleTy {
    let mut ty = SimpleTy::new("null");
    if args.cast_empty_string {
        ty = ty.with_param("castEmptyString");
    }
    ty
}

fn datetime_simple(args: &DatetimeArgs) -> SimpleTy {
    let mut ty = SimpleTy::new("datetime");
    if let Some(fmt) = &args.format {
        ty = ty.with_param_value("format", json!(fmt));
    }
    ty
}

fn instance_of_simple(args: &InstanceOfArgs) -> SimpleTy {
    SimpleTy::new("instanceOf").with_param_value("class", json!(args.class))
}

fn scalar_compound() -> CompoundTy {
    let mut compound = CompoundTy::new(Operator::Or);
    for (key, name) in ["bool", "int", "float", "string"].into_iter().enumerate() {
        compound.add_subtype(key, Ty::Simple(SimpleTy::new(name)));
    }
    compound
}

pub fn bool_type(args: &BoolArgs) -> Ty {
    Ty::Simple(bool_simple(args))
}

pub fn int_type(args: &IntArgs) -> Ty {
    Ty::Simple(int_simple(args))
}

pub fn float_type(args: &FloatArgs) -> Ty {
    Ty::Simple(float_simple(args))
}

pub fn string_type(args: &StringArgs) -> Ty {
    Ty::Simple(string_simple(args))
}

pub fn null_type(args: &NullArgs) -> Ty {
    Ty::Simple(null_simple(args))
}

pub fn enum_type(args: &EnumArgs) -> Ty {
    Ty::Enum(EnumTy::new(args.cases.iter().map(Literal::to_value).collect()))
}

pub fn scalar_type() -> Ty {
    Ty::Compound(scalar_compound())
}

pub fn datetime_type(args: &DatetimeArgs) -> Ty {
    Ty::Simple(datetime_simple(args))
}

pub fn url_type() -> Ty {
    Ty::Simple(SimpleTy::new("url"))
}

pub fn instance_of_type(args: &InstanceOfArgs) -> Ty {
    Ty::Simple(instance_of_simple(args))
}

pub fn object_type() -> Ty {
    Ty::Simple(SimpleTy::new("object"))
}

// ------------------------------ processValue ------------------------------ //

pub fn process_bool(args: &BoolArgs, value: Presence) -> Result<Value, Mismatch> {
    if let Some(v) = value.value() {
        match v {
            Value::Bool(_) => return Ok(v.clone()),
            Value::Number(n) if args.cast_bool_like => {
                if n.as_i64() == Some(0) {
                    return Ok(json!(false));
                }
                if n.as_i64() == Some(1) {
                    return Ok(json!(true));
                }
            }
            Value::String(s) if args.cast_bool_like => match s.to_ascii_lowercase().as_str() {
                "true" => return Ok(json!(true)),
                "false" => return Ok(json!(false)),
                _ => {}
            },
            _ => {}
        }
    }
    Err(Mismatch::new(bool_type(args), value))
}

pub fn process_int(args: &IntArgs, value: Presence) -> Result<Value, Mismatch> {
    let parsed = value.value().and_then(|v| match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) if args.cast_numeric_string && INT_STRING.is_match(s) => {
            s.parse::<i64>().ok()
        }
        _ => None,
    });
    let Some(i) = parsed else {
        return Err(Mismatch::new(int_type(args), value));
    };

    let mut ty = int_simple(args);
    if args.unsigned && i < 0 {
        ty.mark_parameter_invalid("unsigned");
    }
    if args.min.is_some_and(|min| i < min) {
        ty.mark_parameter_invalid("min");
    }
    if args.max.is_some_and(|max| i > max) {
        ty.mark_parameter_invalid("max");
    }
    if ty.params.any_invalid() {
        return Err(Mismatch::new(Ty::Simple(ty), value));
    }
    Ok(json!(i))
}

pub fn process_float(args: &FloatArgs, value: Presence) -> Result<Value, Mismatch> {
    // (coerced output, numeric reading); numbers pass through unchanged so
    // re-validation is stable.
    let parsed = value.value().and_then(|v| match v {
        Value::Number(n) => n.as_f64().map(|f| (v.clone(), f)),
        Value::String(s) if args.cast_numeric_string && FLOAT_STRING.is_match(s) => s
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .and_then(|f| serde_json::Number::from_f64(f).map(|n| (Value::Number(n), f))),
        _ => None,
    });
    let Some((out, f)) = parsed else {
        return Err(Mismatch::new(float_type(args), value));
    };

    let mut ty = float_simple(args);
    if args.unsigned && f < 0.0 {
        ty.mark_parameter_invalid("unsigned");
    }
    if args.min.is_some_and(|min| f < min.0) {
        ty.mark_parameter_invalid("min");
    }
    if args.max.is_some_and(|max| f > max.0) {
        ty.mark_parameter_invalid("max");
    }
    if ty.params.any_invalid() {
        return Err(Mismatch::new(Ty::Simple(ty), value));
    }
    Ok(out)
}

pub fn process_string(args: &StringArgs, value: Presence) -> Result<Value, Mismatch> {
    let Some(Value::String(s)) = value.value() else {
        return Err(Mismatch::new(string_type(args), value));
    };

    let mut ty = string_simple(args);
    let length = s.chars().count() as u64;
    if args.min_length.is_some_and(|min| length < min) {
        ty.mark_parameter_invalid("minLength");
    }
    if args.max_length.is_some_and(|max| length > max) {
        ty.mark_parameter_invalid("maxLength");
    }
    if args.not_empty && s.trim().is_empty() {
        ty.mark_parameter_invalid("notEmpty");
    }
    if let Some(pattern) = &args.pattern {
        if !pattern.regex.is_match(s) {
            ty.mark_parameter_invalid("pattern");
        }
    }
    if ty.params.any_invalid() {
        return Err(Mismatch::new(Ty::Simple(ty), value));
    }
    Ok(Value::String(s.clone()))
}

pub fn process_null(args: &NullArgs, value: Presence) -> Result<Value, Mismatch> {
    match value.value() {
        Some(Value::Null) => Ok(Value::Null),
        Some(Value::String(s)) if args.cast_empty_string && s.is_empty() => Ok(Value::Null),
        _ => Err(Mismatch::new(null_type(args), value)),
    }
}

pub fn process_enum(args: &EnumArgs, value: Presence) -> Result<Value, Mismatch> {
    if let Some(v) = value.value() {
        if args.cases.iter().any(|case| case.matches(v)) {
            return Ok(v.clone());
        }
    }
    let mut ty = EnumTy::new(args.cases.iter().map(Literal::to_value).collect());
    ty.mark_invalid();
    Err(Mismatch::new(Ty::Enum(ty), value))
}

pub fn process_scalar(value: Presence) -> Result<Value, Mismatch> {
    if let Some(v) = value.value() {
        if matches!(v, Value::Bool(_) | Value::Number(_) | Value::String(_)) {
            return Ok(v.clone());
        }
    }
    // No branch matched; every arm of the union is invalid, none skipped.
    let mut compound = scalar_compound();
    for (key, subtype) in compound.subtypes.clone().into_iter().enumerate() {
        compound.overwrite_invalid_subtype(key, subtype.ty);
    }
    Err(Mismatch::new(Ty::Compound(compound), value))
}

pub fn process_datetime(args: &DatetimeArgs, value: Presence) -> Result<Value, Mismatch> {
    let Some(Value::String(s)) = value.value() else {
        return Err(Mismatch::new(datetime_type(args), value));
    };
    match &args.format {
        None => {
            if DateTime::parse_from_rfc3339(s).is_ok() {
                return Ok(Value::String(s.clone()));
            }
            Err(Mismatch::new(datetime_type(args), value))
        }
        Some(fmt) => {
            let ok = NaiveDateTime::parse_from_str(s, fmt).is_ok()
                || NaiveDate::parse_from_str(s, fmt).is_ok()
                || NaiveTime::parse_from_str(s, fmt).is_ok();
            if ok {
                return Ok(Value::String(s.clone()));
            }
            let mut ty = datetime_simple(args);
            ty.mark_parameter_invalid("format");
            Err(Mismatch::new(Ty::Simple(ty), value))
        }
    }
}

pub fn process_url(value: Presence) -> Result<Value, Mismatch> {
    if let Some(Value::String(s)) = value.value() {
        if URL.is_match(s) {
            return Ok(Value::String(s.clone()));
        }
    }
    Err(Mismatch::new(url_type(), value))
}

pub fn process_instance_of(
    args: &InstanceOfArgs,
    value: Presence,
    ctx: &Context<'_>,
) -> Result<Value, Mismatch> {
    let Ok(meta) = ctx.meta(&args.class) else {
        panic!("class vanished after resolve: {}", args.class);
    };
    if let Some(Value::Object(map)) = value.value() {
        if meta.fields.keys().all(|field| map.contains_key(field)) {
            return Ok(value.value().cloned().unwrap_or(Value::Null));
        }
    }
    let mut ty = instance_of_simple(args);
    ty.mark_parameter_invalid("class");
    Err(Mismatch::new(Ty::Simple(ty), value))
}

pub fn process_object(value: Presence) -> Result<Value, Mismatch> {
    if let Some(v @ Value::Object(_)) = value.value() {
        return Ok(v.clone());
    }
    Err(Mismatch::new(object_type(), value))
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::model::SlotState;
    use crate::rules::testutil::descriptor;
    use crate::rules::{process, Args};
    use crate::context::FieldwiseOrchestrator;
    use crate::meta::{ClassMeta, MetaRegistry};

    fn run(raw_desc: Value, value: Value) -> Result<Value, Mismatch> {
        let d = descriptor(raw_desc);
        let meta = MetaRegistry::new();
        let orch = FieldwiseOrchestrator;
        let ctx = Context::new(&meta, &orch);
        process(&d, Presence::present(value), &ctx)
    }

    fn invalid_params(m: &Mismatch) -> Vec<String> {
        match &m.ty {
            Ty::Simple(simple) => simple
                .params
                .iter()
                .filter(|p| p.invalid)
                .map(|p| p.key.clone())
                .collect(),
            other => panic!("expected simple node, got {other:?}"),
        }
    }

    #[test]
    fn numeric_string_casts_to_int() {
        let out = run(
            json!({"rule": "int", "args": {"unsigned": true, "castNumericString": true}}),
            json!("12"),
        )
        .unwrap();
        assert_eq!(out, json!(12));
    }

    #[test]
    fn negative_cast_marks_only_unsigned() {
        let err = run(
            json!({"rule": "int", "args": {"unsigned": true, "castNumericString": true}}),
            json!("-12"),
        )
        .unwrap_err();
        assert_eq!(invalid_params(&err), ["unsigned"]);
        assert_eq!(err.value, Presence::present(json!("-12")));
    }

    #[test]
    fn all_violated_bounds_are_reported_together() {
        let err = run(
            json!({"rule": "int", "args": {"min": 5, "unsigned": true}}),
            json!(-3),
        )
        .unwrap_err();
        // declaration order: min before the unsigned flag
        assert_eq!(invalid_params(&err), ["min", "unsigned"]);
    }

    #[test]
    fn int_rejects_floats_and_noncast_strings() {
        assert!(run(json!({"rule": "int"}), json!(3.5)).is_err());
        assert!(run(json!({"rule": "int"}), json!("12")).is_err());
    }

    #[test]
    fn contradictory_int_bounds_fail_resolution() {
        let meta = MetaRegistry::new();
        let orch = FieldwiseOrchestrator;
        let ctx = Context::new(&meta, &orch);
        let err = crate::rules::resolve(
            &json!({"rule": "int", "args": {"min": 9, "max": 1}}),
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ContradictoryBounds { rule: "int", .. }));

        let err = crate::rules::resolve(
            &json!({"rule": "int", "args": {"min": -2, "unsigned": true}}),
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ContradictoryBounds { rule: "int", .. }));
    }

    #[test]
    fn float_widens_integers_and_keeps_numbers_unchanged() {
        assert_eq!(run(json!({"rule": "float"}), json!(3)).unwrap(), json!(3));
        assert_eq!(run(json!({"rule": "float"}), json!(3.5)).unwrap(), json!(3.5));
        let out = run(
            json!({"rule": "float", "args": {"castNumericString": true}}),
            json!("2.25"),
        )
        .unwrap();
        assert_eq!(out, json!(2.25));
    }

    #[test]
    fn float_bound_violations_mark_parameters() {
        let err = run(
            json!({"rule": "float", "args": {"min": 0.5, "max": 1.5}}),
            json!(2.0),
        )
        .unwrap_err();
        assert_eq!(invalid_params(&err), ["max"]);
    }

    #[test]
    fn string_marks_every_violated_constraint() {
        let err = run(
            json!({"rule": "string", "args": {"minLength": 5, "notEmpty": true, "pattern": "^[a-z]+$"}}),
            json!("  "),
        )
        .unwrap_err();
        assert_eq!(invalid_params(&err), ["minLength", "notEmpty", "pattern"]);
    }

    #[test]
    fn string_length_counts_chars_not_bytes() {
        assert!(run(
            json!({"rule": "string", "args": {"maxLength": 4}}),
            json!("αβγδ"),
        )
        .is_ok());
    }

    #[test]
    fn bool_cast_table() {
        let d = json!({"rule": "bool", "args": {"castBoolLike": true}});
        assert_eq!(run(d.clone(), json!(true)).unwrap(), json!(true));
        assert_eq!(run(d.clone(), json!(1)).unwrap(), json!(true));
        assert_eq!(run(d.clone(), json!(0)).unwrap(), json!(false));
        assert_eq!(run(d.clone(), json!("TRUE")).unwrap(), json!(true));
        assert_eq!(run(d.clone(), json!("False")).unwrap(), json!(false));
        assert!(run(d.clone(), json!(2)).is_err());
        assert!(run(d, json!("yep")).is_err());
        assert!(run(json!({"rule": "bool"}), json!(1)).is_err());
    }

    #[test]
    fn null_accepts_null_and_casts_empty_string() {
        assert_eq!(run(json!({"rule": "null"}), json!(null)).unwrap(), json!(null));
        assert!(run(json!({"rule": "null"}), json!("")).is_err());
        let d = json!({"rule": "null", "args": {"castEmptyString": true}});
        assert_eq!(run(d, json!("")).unwrap(), json!(null));
    }

    #[test]
    fn enum_matches_cases_by_literal_equality() {
        let d = json!({"rule": "enum", "args": {"cases": ["a", 1, null]}});
        assert_eq!(run(d.clone(), json!("a")).unwrap(), json!("a"));
        assert_eq!(run(d.clone(), json!(1)).unwrap(), json!(1));
        assert_eq!(run(d.clone(), json!(null)).unwrap(), json!(null));
        let err = run(d, json!("b")).unwrap_err();
        match err.ty {
            Ty::Enum(e) => {
                assert!(e.invalid);
                assert_eq!(e.cases, vec![json!("a"), json!(1), json!(null)]);
            }
            other => panic!("expected enum node, got {other:?}"),
        }
    }

    #[test]
    fn enum_requires_nonempty_scalar_cases() {
        let meta = MetaRegistry::new();
        let orch = FieldwiseOrchestrator;
        let ctx = Context::new(&meta, &orch);
        assert!(crate::rules::resolve(&json!({"rule": "enum"}), &ctx).is_err());
        assert!(
            crate::rules::resolve(&json!({"rule": "enum", "args": {"cases": []}}), &ctx).is_err()
        );
        assert!(crate::rules::resolve(
            &json!({"rule": "enum", "args": {"cases": [{"a": 1}]}}),
            &ctx
        )
        .is_err());
    }

    #[test]
    fn scalar_union_fails_with_all_arms_invalid() {
        let err = run(json!({"rule": "scalar"}), json!([1])).unwrap_err();
        match err.ty {
            Ty::Compound(c) => {
                assert_eq!(c.subtypes.len(), 4);
                assert!(c
                    .subtypes
                    .iter()
                    .all(|s| s.state == SlotState::Invalid));
            }
            other => panic!("expected compound node, got {other:?}"),
        }
        assert_eq!(run(json!({"rule": "scalar"}), json!("x")).unwrap(), json!("x"));
    }

    #[test]
    fn datetime_rfc3339_and_explicit_format() {
        assert!(run(json!({"rule": "datetime"}), json!("2026-08-24T10:00:00Z")).is_ok());
        assert!(run(json!({"rule": "datetime"}), json!("not a date")).is_err());

        let d = json!({"rule": "datetime", "args": {"format": "%Y-%m-%d"}});
        assert!(run(d.clone(), json!("2026-08-24")).is_ok());
        let err = run(d, json!("24/08/2026")).unwrap_err();
        assert_eq!(invalid_params(&err), ["format"]);
    }

    #[test]
    fn bad_datetime_format_string_fails_resolution() {
        let meta = MetaRegistry::new();
        let orch = FieldwiseOrchestrator;
        let ctx = Context::new(&meta, &orch);
        let err = crate::rules::resolve(
            &json!({"rule": "datetime", "args": {"format": "%Q"}}),
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MalformedDescriptor { rule: "datetime", .. }));
    }

    #[test]
    fn url_accepts_absolute_urls_only() {
        assert!(run(json!({"rule": "url"}), json!("https://example.com/a?b=1")).is_ok());
        assert!(run(json!({"rule": "url"}), json!("ftp://files.example.com")).is_ok());
        assert!(run(json!({"rule": "url"}), json!("example.com")).is_err());
        assert!(run(json!({"rule": "url"}), json!("https://")).is_err());
        assert!(run(json!({"rule": "url"}), json!(7)).is_err());
    }

    #[test]
    fn object_accepts_any_map() {
        assert!(run(json!({"rule": "object"}), json!({"a": 1})).is_ok());
        assert!(run(json!({"rule": "object"}), json!([1])).is_err());
    }

    #[test]
    fn instance_of_checks_declared_field_presence() {
        let mut meta = MetaRegistry::new();
        meta.register(
            ClassMeta::new("User")
                .field("name", descriptor(json!({"rule": "string"})))
                .field("age", descriptor(json!({"rule": "int"}))),
        );
        let orch = FieldwiseOrchestrator;
        let ctx = Context::new(&meta, &orch);
        let d = crate::rules::resolve(
            &json!({"rule": "instanceOf", "args": {"class": "User"}}),
            &ctx,
        )
        .unwrap();

        let ok = process(
            &d,
            Presence::present(json!({"name": "ada", "age": 36})),
            &ctx,
        );
        assert!(ok.is_ok());

        let err = process(&d, Presence::present(json!({"name": "ada"})), &ctx).unwrap_err();
        assert_eq!(invalid_params(&err), ["class"]);
    }

    #[test]
    fn instance_of_unknown_class_fails_resolution() {
        let meta = MetaRegistry::new();
        let orch = FieldwiseOrchestrator;
        let ctx = Context::new(&meta, &orch);
        let err = crate::rules::resolve(
            &json!({"rule": "instanceOf", "args": {"class": "Ghost"}}),
            &ctx,
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::UnknownClass("Ghost".into()));
    }

    #[test]
    fn absent_values_fail_every_leaf() {
        let meta = MetaRegistry::new();
        let orch = FieldwiseOrchestrator;
        let ctx = Context::new(&meta, &orch);
        for raw in [
            json!({"rule": "bool"}),
            json!({"rule": "int"}),
            json!({"rule": "float"}),
            json!({"rule": "string"}),
            json!({"rule": "null"}),
            json!({"rule": "scalar"}),
            json!({"rule": "datetime"}),
            json!({"rule": "url"}),
            json!({"rule": "object"}),
        ] {
            let d = descriptor(raw);
            let err = process(&d, Presence::absent(), &ctx).unwrap_err();
            assert_eq!(err.value, Presence::absent());
        }
    }

    #[test]
    fn successful_output_revalidates_stably() {
        let cases = [
            (json!({"rule": "bool", "args": {"castBoolLike": true}}), json!("true")),
            (json!({"rule": "int", "args": {"castNumericString": true}}), json!("41")),
            (json!({"rule": "float", "args": {"castNumericString": true}}), json!("1.5")),
            (json!({"rule": "string"}), json!("plain")),
            (json!({"rule": "null", "args": {"castEmptyString": true}}), json!("")),
            (json!({"rule": "enum", "args": {"cases": [1, 2]}}), json!(2)),
            (json!({"rule": "scalar"}), json!(9)),
            (json!({"rule": "datetime"}), json!("2026-01-02T03:04:05Z")),
            (json!({"rule": "url"}), json!("https://example.com")),
        ];
        for (raw, input) in cases {
            let first = run(raw.clone(), input).unwrap();
            let second = run(raw, first.clone()).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn create_type_is_deterministic() {
        let meta = MetaRegistry::new();
        let orch = FieldwiseOrchestrator;
        let ctx = Context::new(&meta, &orch);
        let d = descriptor(json!({"rule": "int", "args": {"min": 1, "max": 5, "unsigned": true}}));
        let a = crate::rules::create_type(&d, &ctx);
        let b = crate::rules::create_type(&d, &ctx);
        assert_eq!(a, b);
    }
}
