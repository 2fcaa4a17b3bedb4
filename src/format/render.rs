//! The recursive render walk.
//!
//! One pass over the type tree, scope stack deciding at each node whether
//! valid parts render, producing a `Report` for the back ends.

use crate::dump::Dumper;
use crate::model::{
    ArrayTy, CompoundTy, EnumTy, ListTy, ObjectTy, Params, SimpleTy, SlotState, Ty,
};

use super::report::Report;
use super::ScopeStack;

const VALID_VALUE_PLACEHOLDER: &str = "...";

pub(super) struct Session<'a> {
    pub scopes: ScopeStack,
    dumper: &'a Dumper,
}

impl<'a> Session<'a> {
    pub fn new(dumper: &'a Dumper) -> Self {
        Self {
            scopes: ScopeStack::new(),
            dumper,
        }
    }

    pub fn walk(&mut self, ty: &Ty) -> Report {
        match ty {
            Ty::Message(message) => Report::leaf(&message.text),
            Ty::Simple(simple) => self.simple(simple),
            Ty::Enum(e) => self.enumeration(e),
            Ty::Compound(compound) => self.compound(compound),
            Ty::Array(array) => self.array(array),
            Ty::List(list) => self.list(list),
            Ty::Object(object) => self.object(object),
        }
    }

    /// Walk a captured failure node. A node with no internally marked parts
    /// failed as a whole (type mismatch, absence), so its full expected shape
    /// renders; a node with marks keeps the ambient filtering and shows them.
    fn walk_failure(&mut self, ty: &Ty) -> Report {
        if ty.is_invalid() {
            return self.walk(ty);
        }
        self.scopes.open(true);
        let report = self.walk(ty);
        self.scopes.close();
        report
    }

    /// Walk under a locked render-valid scope: the subtree renders fully no
    /// matter what ambient filtering says.
    fn walk_forced(&mut self, ty: &Ty) -> Report {
        self.scopes.open_locked(true);
        let report = self.walk(ty);
        self.scopes.close();
        report
    }

    // ------------------------------ Leaves -------------------------------- //

    fn simple(&mut self, simple: &SimpleTy) -> Report {
        match self.params_text(&simple.params) {
            Some(params) => Report::leaf(format!("{}({params})", simple.name)),
            None => Report::leaf(&simple.name),
        }
    }

    fn enumeration(&mut self, e: &EnumTy) -> Report {
        let cases = e
            .cases
            .iter()
            .map(|case| self.dumper.dump(case))
            .collect::<Vec<_>>()
            .join(", ");
        Report::leaf(format!("enum({cases})"))
    }

    /// Invalid parameters always render; the rest only under full rendering.
    fn params_text(&mut self, params: &Params) -> Option<String> {
        let render_valid = self.scopes.should_render_valid();
        let shown: Vec<String> = params
            .iter()
            .filter(|p| p.invalid || render_valid)
            .map(|p| match &p.value {
                Some(value) => format!("{}: {}", p.key, self.dumper.dump(value)),
                None => p.key.clone(),
            })
            .collect();
        if shown.is_empty() {
            None
        } else {
            Some(shown.join(", "))
        }
    }

    // ----------------------------- Compounds ------------------------------ //

    /// Invalid subtypes always render; pending ones only under full
    /// rendering; skipped ones never, they have no evaluated children.
    fn compound(&mut self, compound: &CompoundTy) -> Report {
        let render_valid = self.scopes.should_render_valid();
        let mut parts = Vec::new();
        for subtype in &compound.subtypes {
            match subtype.state {
                SlotState::Invalid => parts.push(self.walk_failure(&subtype.ty)),
                SlotState::Pending if render_valid => parts.push(self.walk(&subtype.ty)),
                SlotState::Pending | SlotState::Skipped => {}
            }
        }
        Report::Seq {
            sep: format!(" {} ", compound.operator.glyph()),
            parts,
        }
    }

    // ----------------------------- Containers ----------------------------- //

    fn array(&mut self, array: &ArrayTy) -> Report {
        let mut head = String::from("array");
        if self.scopes.should_render_valid() {
            let item = self.walk(&array.item).to_text();
            match &array.key {
                Some(key) => {
                    let key = self.walk(key).to_text();
                    head.push_str(&format!("<{key} => {item}>"));
                }
                None => head.push_str(&format!("<{item}>")),
            }
        }
        if let Some(params) = self.params_text(&array.params) {
            head.push_str(&format!("({params})"));
        }

        let mut entries = Vec::new();
        for (original_key, pair) in &array.invalid_pairs {
            let detail = match (&pair.key, &pair.value) {
                (Some(key_ty), Some(value_ty)) => Report::Seq {
                    sep: " => ".into(),
                    parts: vec![self.walk_failure(key_ty), self.walk_forced(value_ty)],
                },
                (Some(key_ty), None) => Report::Seq {
                    sep: " => ".into(),
                    parts: vec![
                        self.walk_failure(key_ty),
                        Report::leaf(VALID_VALUE_PLACEHOLDER),
                    ],
                },
                (None, Some(value_ty)) => self.walk_forced(value_ty),
                (None, None) => unreachable!("invalid pair always has at least one side"),
            };
            entries.push(Report::entry(original_key, detail));
        }
        Report::Group { head, entries }
    }

    fn list(&mut self, list: &ListTy) -> Report {
        let mut head = String::from("list");
        if self.scopes.should_render_valid() {
            let item = self.walk(&list.item).to_text();
            head.push_str(&format!("<{item}>"));
        }
        if let Some(params) = self.params_text(&list.params) {
            head.push_str(&format!("({params})"));
        }

        let entries = list
            .invalid_items
            .iter()
            .map(|(original_key, item_ty)| {
                Report::entry(original_key, self.walk_forced(item_ty))
            })
            .collect();
        Report::Group { head, entries }
    }

    // ----------------------------- Structures ----------------------------- //

    fn object(&mut self, object: &ObjectTy) -> Report {
        // A node that failed as a whole (wrong value kind) has nothing finer
        // to point at, so its full declared shape renders.
        let whole_node_failure = object.invalid
            && object.errors.is_empty()
            && object.invalid_fields().next().is_none();
        if whole_node_failure {
            self.scopes.open(true);
        }

        let render_valid = self.scopes.should_render_valid();
        let mut entries = Vec::new();
        for (name, slot) in &object.fields {
            if slot.invalid {
                entries.push(Report::entry(name, self.walk_failure(&slot.ty)));
            } else if render_valid {
                entries.push(Report::entry(name, self.walk(&slot.ty)));
            }
        }
        for error in &object.errors {
            entries.push(self.walk(error));
        }

        if whole_node_failure {
            self.scopes.close();
        }
        Report::Group {
            head: object.class.clone(),
            entries,
        }
    }
}
