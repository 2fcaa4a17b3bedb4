//! Error-aware formatter.
//!
//! Renders a (possibly partially invalid) type node, by default showing only
//! the invalid parts of an otherwise valid tree, and switching to full
//! rendering inside subtrees that demand it. A scope stack threaded through
//! the recursive walk decides, at every step, whether valid parts render.
//!
//! The walk produces an intermediate `Report` tree; the two back ends (text
//! and nested container) only differ in how they serialize it.

pub mod report;
mod render;

use crate::dump::Dumper;
use crate::model::Ty;

pub use report::Report;

// ------------------------------ Scope stack ------------------------------- //

#[derive(Clone, Copy, Debug)]
pub struct Scope {
    pub render_valid: bool,
    pub locked: bool,
}

/// Strictly nested render scopes.
///
/// `should_render_valid` reads the innermost LOCKED scope when one exists,
/// else the innermost scope, else defaults to false (render only invalid
/// parts). A locked scope resists being overridden by anything opened under
/// it. Unbalanced open/close is an engine bug and panics.
#[derive(Debug, Default)]
pub struct ScopeStack {
    stack: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, render_valid: bool) {
        self.stack.push(Scope {
            render_valid,
            locked: false,
        });
    }

    pub fn open_locked(&mut self, render_valid: bool) {
        self.stack.push(Scope {
            render_valid,
            locked: true,
        });
    }

    pub fn close(&mut self) {
        assert!(
            self.stack.pop().is_some(),
            "scope closed without a matching open"
        );
    }

    pub fn should_render_valid(&self) -> bool {
        if let Some(locked) = self.stack.iter().rev().find(|s| s.locked) {
            return locked.render_valid;
        }
        self.stack.last().map(|s| s.render_valid).unwrap_or(false)
    }

    pub fn assert_closed(&self) {
        assert!(
            self.stack.is_empty(),
            "{} scope(s) left open at end of render",
            self.stack.len()
        );
    }
}

// ------------------------------- Formatter -------------------------------- //

/// One formatter, reusable across sequential renders. Each top-level render
/// call owns a fresh scope stack; sharing one instance across threads or
/// nesting render calls is unsupported.
#[derive(Debug, Default)]
pub struct Formatter {
    dumper: Dumper,
}

impl Formatter {
    pub fn new() -> Self {
        Self {
            dumper: Dumper::default(),
        }
    }

    pub fn with_dumper(dumper: Dumper) -> Self {
        Self { dumper }
    }

    /// Default filtering: only invalid parts render.
    pub fn render(&self, ty: &Ty) -> String {
        self.report(ty, false).to_text()
    }

    /// Full-shape rendering: valid parts render too.
    pub fn render_full(&self, ty: &Ty) -> String {
        self.report(ty, true).to_text()
    }

    pub fn render_value(&self, ty: &Ty) -> serde_json::Value {
        self.report(ty, false).to_value()
    }

    pub fn render_value_full(&self, ty: &Ty) -> serde_json::Value {
        self.report(ty, true).to_value()
    }

    /// Path-prefixed rendering: `a > b > 0: <detail>`.
    pub fn render_at_path(&self, ty: &Ty, path: &[&str]) -> String {
        if path.is_empty() {
            return self.render(ty);
        }
        format!("{}: {}", path.join(" > "), self.render(ty))
    }

    pub fn report(&self, ty: &Ty, full: bool) -> Report {
        let mut session = render::Session::new(&self.dumper);
        if full {
            session.scopes.open(true);
        }
        let report = session.walk(ty);
        if full {
            session.scopes.close();
        }
        session.scopes.assert_closed();
        report
    }
}

/// Render with default options and filtering.
pub fn render(ty: &Ty) -> String {
    Formatter::new().render(ty)
}

// ------------------------------- Tests ------------------------------------ //
