//! Nested structure rule.
//!
//! `create_type` recurses through the compiled class's fields; a
//! self-referential schema is cut off with a terminal marker at the repeated
//! `(class, field)` position, and the guard is released once that field's
//! subtree finishes so sibling fields of other instances still recurse.
//!
//! `process` hands the value to the orchestration layer and re-propagates
//! its aggregated failure untouched.

use serde_json::Value;

use crate::context::{BuildCtx, Context};
use crate::error::{ConfigError, Mismatch};
use crate::model::{ObjectTy, Ty};
use crate::value::Presence;

use super::{args_object, require_str, Args, StructureArgs};

pub fn resolve_args(raw: Option<&Value>, ctx: &Context<'_>) -> Result<Args, ConfigError> {
    let map = args_object("structure", raw, &["class"])?;
    let class = require_str("structure", map, "class")?;
    ctx.meta(class)?;
    Ok(Args::Structure(StructureArgs {
        class: class.to_string(),
    }))
}

pub fn create_type(args: &StructureArgs, ctx: &Context<'_>, build: &mut BuildCtx) -> Ty {
    let Ok(meta) = ctx.meta(&args.class) else {
        panic!("class vanished after resolve: {}", args.class);
    };
    let mut node = ObjectTy::new(&meta.name);
    for (field, descriptor) in &meta.fields {
        let ty = if build.in_progress(&meta.name, field) {
            Ty::message(format!("circular reference: {}.{}", meta.name, field))
        } else {
            build.push(&meta.name, field);
            let ty = super::create_type_in(descriptor, ctx, build);
            build.pop(&meta.name, field);
            ty
        };
        node.add_field(field, ty);
    }
    Ty::Object(node)
}

pub fn process(
    args: &StructureArgs,
    value: Presence,
    ctx: &Context<'_>,
) -> Result<Value, Mismatch> {
    let Ok(meta) = ctx.meta(&args.class) else {
        panic!("class vanished after resolve: {}", args.class);
    };
    ctx.process_structure(meta, value)
}
