//! Container rules: arrayOf (keyed) and listOf (sequential).
//!
//! Containers arrive either as JSON objects (original string keys) or JSON
//! arrays (decimal index keys). Decimal object keys are treated as integer
//! keys, the way loosely typed containers index them, so a `string` key rule
//! rejects `"10"` while accepting `"baz"`.
//!
//! Failures are recorded under the ORIGINAL key. When both sides of a pair
//! fail, the key side is recorded first and the value side merges into the
//! same record.

use serde_json::{Map, Value};

use crate::context::{BuildCtx, Context};
use crate::error::{ConfigError, Mismatch};
use crate::model::{ArrayTy, ListTy, Ty};
use crate::value::Presence;

use super::{args_object, get_u64, resolve_nested, Args, ArrayArgs, ListArgs};

// ------------------------------ resolveArgs ------------------------------- //

pub fn resolve_array(raw: Option<&Value>, ctx: &Context<'_>) -> Result<Args, ConfigError> {
    const RULE: &str = "arrayOf";
    let map = args_object(RULE, raw, &["item", "key", "minItems", "maxItems", "default"])?
        .ok_or(ConfigError::MissingKey {
            rule: RULE,
            key: "item",
        })?;
    let raw_item = map.get("item").ok_or(ConfigError::MissingKey {
        rule: RULE,
        key: "item",
    })?;
    let item = Box::new(resolve_nested(RULE, "item", raw_item, ctx)?);
    let key = match map.get("key") {
        Some(raw_key) => Some(Box::new(resolve_nested(RULE, "key", raw_key, ctx)?)),
        None => None,
    };
    let (min_items, max_items) = resolve_item_bounds(RULE, map)?;
    let default = resolve_default(RULE, map)?;
    Ok(Args::ArrayOf(ArrayArgs {
        item,
        key,
        min_items,
        max_items,
        default,
    }))
}

pub fn resolve_list(raw: Option<&Value>, ctx: &Context<'_>) -> Result<Args, ConfigError> {
    const RULE: &str = "listOf";
    let map = args_object(RULE, raw, &["item", "minItems", "maxItems", "default"])?.ok_or(
        ConfigError::MissingKey {
            rule: RULE,
            key: "item",
        },
    )?;
    let raw_item = map.get("item").ok_or(ConfigError::MissingKey {
        rule: RULE,
        key: "item",
    })?;
    let item = Box::new(resolve_nested(RULE, "item", raw_item, ctx)?);
    let (min_items, max_items) = resolve_item_bounds(RULE, map)?;
    let default = resolve_default(RULE, map)?;
    Ok(Args::ListOf(ListArgs {
        item,
        min_items,
        max_items,
        default,
    }))
}

fn resolve_item_bounds(
    rule: &'static str,
    map: &Map<String, Value>,
) -> Result<(Option<u64>, Option<u64>), ConfigError> {
    let min = get_u64(rule, map, "minItems")?;
    let max = get_u64(rule, map, "maxItems")?;
    if let (Some(min), Some(max)) = (min, max) {
        if max < min {
            return Err(ConfigError::ContradictoryBounds {
                rule,
                detail: format!("maxItems {max} < minItems {min}"),
            });
        }
    }
    Ok((min, max))
}

fn resolve_default(
    rule: &'static str,
    map: &Map<String, Value>,
) -> Result<Option<Value>, ConfigError> {
    match map.get("default") {
        None => Ok(None),
        Some(v @ (Value::Object(_) | Value::Array(_))) => Ok(Some(v.clone())),
        Some(other) => Err(ConfigError::WrongArgType {
            rule,
            key: "default",
            expected: "a container",
            got: super::value_kind(other).to_string(),
        }),
    }
}

// ------------------------------ createType -------------------------------- //

fn array_scaffold(args: &ArrayArgs, ctx: &Context<'_>, build: &mut BuildCtx) -> ArrayTy {
    let item = super::create_type_in(&args.item, ctx, build);
    let key = args
        .key
        .as_ref()
        .map(|k| super::create_type_in(k, ctx, build));
    let mut ty = ArrayTy::new(item, key);
    if let Some(min) = args.min_items {
        ty.params.declare_with_value("minItems", Value::from(min));
    }
    if let Some(max) = args.max_items {
        ty.params.declare_with_value("maxItems", Value::from(max));
    }
    ty
}

fn list_scaffold(args: &ListArgs, ctx: &Context<'_>, build: &mut BuildCtx) -> ListTy {
    let mut ty = ListTy::new(super::create_type_in(&args.item, ctx, build));
    // Dense 0..n-1 keys are part of the list contract itself.
    ty.params.declare("keys");
    if let Some(min) = args.min_items {
        ty.params.declare_with_value("minItems", Value::from(min));
    }
    if let Some(max) = args.max_items {
        ty.params.declare_with_value("maxItems", Value::from(max));
    }
    ty
}

pub fn array_type(args: &ArrayArgs, ctx: &Context<'_>, build: &mut BuildCtx) -> Ty {
    Ty::Array(array_scaffold(args, ctx, build))
}

pub fn list_type(args: &ListArgs, ctx: &Context<'_>, build: &mut BuildCtx) -> Ty {
    Ty::List(list_scaffold(args, ctx, build))
}

// ------------------------------ processValue ------------------------------ //

/// One container entry: original key text, the key as a value (for the key
/// rule), and the item value.
struct Entry {
    original_key: String,
    key_value: Value,
    item: Value,
}

fn container_entries(v: &Value) -> Option<(Vec<Entry>, bool)> {
    match v {
        Value::Object(map) => {
            let entries = map
                .iter()
                .map(|(k, item)| Entry {
                    original_key: k.clone(),
                    key_value: key_as_value(k),
                    item: item.clone(),
                })
                .collect();
            Some((entries, true))
        }
        Value::Array(items) => {
            let entries = items
                .iter()
                .enumerate()
                .map(|(i, item)| Entry {
                    original_key: i.to_string(),
                    key_value: Value::from(i as i64),
                    item: item.clone(),
                })
                .collect();
            Some((entries, false))
        }
        _ => None,
    }
}

/// Decimal object keys index like integers.
fn key_as_value(key: &str) -> Value {
    match key.parse::<i64>() {
        Ok(i) if i.to_string() == key => Value::from(i),
        _ => Value::String(key.to_string()),
    }
}

fn coerced_key_text(coerced: &Value, original: &str) -> String {
    match coerced {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => original.to_string(),
    }
}

pub fn process_array(
    args: &ArrayArgs,
    value: Presence,
    ctx: &Context<'_>,
) -> Result<Value, Mismatch> {
    let mut ty = array_scaffold(args, ctx, &mut BuildCtx::new());

    let Some((entries, is_object)) = value.value().and_then(container_entries) else {
        return Err(Mismatch::new(Ty::Array(ty), value));
    };

    let count = entries.len() as u64;
    // Over the cap nothing is evaluated; the invalid-pairs map stays empty.
    if args.max_items.is_some_and(|max| count > max) {
        ty.params.mark_invalid("maxItems");
        return Err(Mismatch::new(Ty::Array(ty), value));
    }
    if args.min_items.is_some_and(|min| count < min) {
        ty.params.mark_invalid("minItems");
    }

    let mut out_object = Map::new();
    let mut out_array = Vec::new();
    for entry in entries {
        // Key side first, then the value side merges under the same key.
        let mut out_key = entry.original_key.clone();
        if let Some(key_rule) = &args.key {
            match super::process(key_rule, Presence::present(entry.key_value), ctx) {
                Ok(coerced) => out_key = coerced_key_text(&coerced, &entry.original_key),
                Err(mismatch) => ty.add_invalid_key(&entry.original_key, mismatch.ty),
            }
        }
        match super::process(&args.item, Presence::present(entry.item), ctx) {
            Ok(coerced) => {
                if is_object {
                    out_object.insert(out_key, coerced);
                } else {
                    out_array.push(coerced);
                }
            }
            Err(mismatch) => ty.add_invalid_value(&entry.original_key, mismatch.ty),
        }
    }

    if ty.params.any_invalid() || !ty.invalid_pairs.is_empty() {
        return Err(Mismatch::new(Ty::Array(ty), value));
    }

    let produced = if is_object {
        Value::Object(out_object)
    } else {
        Value::Array(out_array)
    };
    Ok(apply_default(args.default.as_ref(), produced))
}

pub fn process_list(
    args: &ListArgs,
    value: Presence,
    ctx: &Context<'_>,
) -> Result<Value, Mismatch> {
    let mut ty = list_scaffold(args, ctx, &mut BuildCtx::new());

    let Some((entries, is_object)) = value.value().and_then(container_entries) else {
        return Err(Mismatch::new(Ty::List(ty), value));
    };

    let count = entries.len() as u64;
    if args.max_items.is_some_and(|max| count > max) {
        ty.params.mark_invalid("maxItems");
        return Err(Mismatch::new(Ty::List(ty), value));
    }
    if args.min_items.is_some_and(|min| count < min) {
        ty.params.mark_invalid("minItems");
    }

    // An array container is dense by construction; an object container must
    // carry exactly the decimal keys 0..n-1, in order. Independent of item
    // results.
    if is_object {
        let dense = entries
            .iter()
            .enumerate()
            .all(|(i, e)| e.original_key == i.to_string());
        if !dense {
            ty.params.mark_invalid("keys");
        }
    }

    let mut out = Vec::new();
    for entry in entries {
        match super::process(&args.item, Presence::present(entry.item), ctx) {
            Ok(coerced) => out.push(coerced),
            Err(mismatch) => ty.add_invalid_item(&entry.original_key, mismatch.ty),
        }
    }

    if ty.params.any_invalid() || !ty.invalid_items.is_empty() {
        return Err(Mismatch::new(Ty::List(ty), value));
    }
    Ok(apply_default(args.default.as_ref(), Value::Array(out)))
}

// ------------------------------- Defaults --------------------------------- //

/// On success only: merge the declared default UNDER the produced value.
/// Produced entries win; objects merge recursively. Never part of
/// validation.
fn apply_default(default: Option<&Value>, produced: Value) -> Value {
    match default {
        None => produced,
        Some(default) => deep_merge(default.clone(), produced),
    }
}

fn deep_merge(base: Value, over: Value) -> Value {
    match (base, over) {
        (Value::Object(mut base), Value::Object(over)) => {
            for (key, over_value) in over {
                let merged = match base.swap_remove(&key) {
                    Some(base_value) => deep_merge(base_value, over_value),
                    None => over_value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, over) => over,
    }
}

// ------------------------------- Tests ------------------------------------ //
