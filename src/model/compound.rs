//! AND/OR compound nodes and the per-subtype slot state machine.

use super::Ty;

/// Operator joining a compound node's subtypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    /// Glyph used by the text report back end.
    pub fn glyph(self) -> &'static str {
        match self {
            Operator::And => "&&",
            Operator::Or => "||",
        }
    }
}

/// Evaluation state of one subtype slot.
///
/// Identity is set once at `add_subtype`; the state then transitions
/// `Pending -> Invalid` or `Pending -> Skipped` exactly once. Skipped is a
/// strictly weaker signal than invalid: the slot was never evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    Pending,
    Invalid,
    Skipped,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Subtype {
    pub ty: Ty,
    pub state: SlotState,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompoundTy {
    pub operator: Operator,
    pub subtypes: Vec<Subtype>,
}

impl CompoundTy {
    pub fn new(operator: Operator) -> Self {
        Self {
            operator,
            subtypes: Vec::new(),
        }
    }

    /// Add the subtype at `key`. Keys are dense indices assigned in order;
    /// re-adding a key is an engine bug.
    pub fn add_subtype(&mut self, key: usize, ty: Ty) {
        assert!(
            key == self.subtypes.len(),
            "subtype key {key} already added or out of order (next is {})",
            self.subtypes.len()
        );
        self.subtypes.push(Subtype {
            ty,
            state: SlotState::Pending,
        });
    }

    /// Replace a pending subtype with its captured failure node.
    pub fn overwrite_invalid_subtype(&mut self, key: usize, failure: Ty) {
        let slot = self.slot_mut(key);
        match slot.state {
            SlotState::Pending => {
                slot.ty = failure;
                slot.state = SlotState::Invalid;
            }
            SlotState::Invalid => panic!("subtype {key} overwritten twice"),
            SlotState::Skipped => panic!("cannot overwrite skipped subtype {key}"),
        }
    }

    /// Mark a pending subtype as never evaluated.
    pub fn set_subtype_skipped(&mut self, key: usize) {
        let slot = self.slot_mut(key);
        match slot.state {
            SlotState::Pending => slot.state = SlotState::Skipped,
            SlotState::Invalid => panic!("cannot skip overwritten subtype {key}"),
            SlotState::Skipped => panic!("subtype {key} skipped twice"),
        }
    }

    fn slot_mut(&mut self, key: usize) -> &mut Subtype {
        let len = self.subtypes.len();
        self.subtypes
            .get_mut(key)
            .unwrap_or_else(|| panic!("subtype {key} never added ({len} present)"))
    }

    pub fn has_invalid_subtype(&self) -> bool {
        self.subtypes.iter().any(|s| s.state == SlotState::Invalid)
    }

    pub fn state_of(&self, key: usize) -> SlotState {
        self.subtypes[key].state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SimpleTy;

    fn leaf(name: &str) -> Ty {
        Ty::Simple(SimpleTy::new(name))
    }

    fn pair() -> CompoundTy {
        let mut c = CompoundTy::new(Operator::And);
        c.add_subtype(0, leaf("int"));
        c.add_subtype(1, leaf("string"));
        c
    }

    #[test]
    fn slots_transition_once() {
        let mut c = pair();
        c.overwrite_invalid_subtype(0, Ty::message("boom"));
        c.set_subtype_skipped(1);
        assert_eq!(c.state_of(0), SlotState::Invalid);
        assert_eq!(c.state_of(1), SlotState::Skipped);
        assert!(c.has_invalid_subtype());
    }

    #[test]
    #[should_panic(expected = "already added")]
    fn re_adding_a_key_panics() {
        let mut c = pair();
        c.add_subtype(1, leaf("float"));
    }

    #[test]
    #[should_panic(expected = "never added")]
    fn skipping_an_unknown_slot_panics() {
        let mut c = pair();
        c.set_subtype_skipped(5);
    }

    #[test]
    #[should_panic(expected = "cannot skip overwritten")]
    fn skip_after_overwrite_panics() {
        let mut c = pair();
        c.overwrite_invalid_subtype(0, Ty::message("boom"));
        c.set_subtype_skipped(0);
    }

    #[test]
    #[should_panic(expected = "cannot overwrite skipped")]
    fn overwrite_after_skip_panics() {
        let mut c = pair();
        c.set_subtype_skipped(0);
        c.overwrite_invalid_subtype(0, Ty::message("boom"));
    }

    #[test]
    #[should_panic(expected = "overwritten twice")]
    fn double_overwrite_panics() {
        let mut c = pair();
        c.overwrite_invalid_subtype(0, Ty::message("a"));
        c.overwrite_invalid_subtype(0, Ty::message("b"));
    }
}
