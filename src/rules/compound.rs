//! Compound rules: allOf (AND) and anyOf (OR).
//!
//! Both build the same compound scaffold and differ only in iteration
//! semantics: allOf pipes each rule's output into the next and stops at the
//! first failure; anyOf feeds every rule the original input and stops at the
//! first success.

use serde_json::Value;

use crate::context::{BuildCtx, Context};
use crate::error::{ConfigError, Mismatch};
use crate::model::{CompoundTy, Operator, Ty};
use crate::value::Presence;

use super::{args_object, resolve_nested, CompoundArgs};

pub fn resolve_args(
    rule: &'static str,
    raw: Option<&Value>,
    ctx: &Context<'_>,
) -> Result<CompoundArgs, ConfigError> {
    let map = args_object(rule, raw, &["rules"])?.ok_or(ConfigError::MissingKey {
        rule,
        key: "rules",
    })?;
    let raw_rules = map.get("rules").ok_or(ConfigError::MissingKey {
        rule,
        key: "rules",
    })?;
    let Some(raw_rules) = raw_rules.as_array() else {
        return Err(ConfigError::WrongArgType {
            rule,
            key: "rules",
            expected: "an array of descriptors",
            got: super::value_kind(raw_rules).to_string(),
        });
    };
    if raw_rules.is_empty() {
        return Err(ConfigError::MalformedDescriptor {
            rule,
            detail: "rules must not be empty".into(),
        });
    }
    // Resolve every branch now; a branch that never runs still has to be
    // well configured.
    let mut rules = Vec::with_capacity(raw_rules.len());
    for raw_rule in raw_rules {
        rules.push(resolve_nested(rule, "rules", raw_rule, ctx)?);
    }
    Ok(CompoundArgs { rules })
}

pub fn create_type(
    operator: Operator,
    args: &CompoundArgs,
    ctx: &Context<'_>,
    build: &mut BuildCtx,
) -> Ty {
    let mut compound = CompoundTy::new(operator);
    for (key, nested) in args.rules.iter().enumerate() {
        compound.add_subtype(key, super::create_type_in(nested, ctx, build));
    }
    Ty::Compound(compound)
}

/// AND: pipe the value through each nested rule in order, so later rules see
/// earlier rules' transformed output. First failure captures that slot as
/// invalid and skips everything after it; earlier slots stay untouched.
pub fn process_all_of(
    args: &CompoundArgs,
    value: Presence,
    ctx: &Context<'_>,
) -> Result<Value, Mismatch> {
    let Ty::Compound(mut compound) = create_type(Operator::And, args, ctx, &mut BuildCtx::new())
    else {
        unreachable!("compound scaffold is always a compound node");
    };

    let mut current = value.clone();
    for (key, nested) in args.rules.iter().enumerate() {
        match super::process(nested, current, ctx) {
            Ok(transformed) => current = Presence::present(transformed),
            Err(mismatch) => {
                compound.overwrite_invalid_subtype(key, mismatch.ty);
                for later in key + 1..args.rules.len() {
                    compound.set_subtype_skipped(later);
                }
                return Err(Mismatch::new(Ty::Compound(compound), value));
            }
        }
    }
    match current {
        Presence::Present(v) => Ok(v),
        Presence::Absent => panic!("allOf succeeded without producing a value"),
    }
}

/// OR: feed each nested rule the original input; first success wins and the
/// rest are skipped. When every rule fails, every slot is invalid (none
/// skipped) and the attached value is the unmodified original input.
pub fn process_any_of(
    args: &CompoundArgs,
    value: Presence,
    ctx: &Context<'_>,
) -> Result<Value, Mismatch> {
    let Ty::Compound(mut compound) = create_type(Operator::Or, args, ctx, &mut BuildCtx::new())
    else {
        unreachable!("compound scaffold is always a compound node");
    };

    for (key, nested) in args.rules.iter().enumerate() {
        match super::process(nested, value.clone(), ctx) {
            Ok(transformed) => {
                for later in key + 1..args.rules.len() {
                    compound.set_subtype_skipped(later);
                }
                return Ok(transformed);
            }
            Err(mismatch) => compound.overwrite_invalid_subtype(key, mismatch.ty),
        }
    }
    Err(Mismatch::new(Ty::Compound(compound), value))
}
