//! Presence wrapper for raw input values.
//!
//! A field can be absent, present-but-null, or present with a value; `null`
//! and "no value at all" must stay distinguishable all the way into error
//! reports, so the raw `serde_json::Value` is never used bare at rule
//! boundaries.

use serde_json::Value;

/// An input slot: either absent or holding a raw value (possibly `null`).
#[derive(Clone, Debug, PartialEq)]
pub enum Presence {
    Absent,
    Present(Value),
}

impl Presence {
    pub fn present(value: Value) -> Self {
        Presence::Present(value)
    }

    pub fn absent() -> Self {
        Presence::Absent
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Presence::Present(_))
    }

    /// The held value, if any. `Some(Value::Null)` is a present null.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Presence::Absent => None,
            Presence::Present(v) => Some(v),
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Presence::Absent => None,
            Presence::Present(v) => Some(v),
        }
    }
}

impl From<Value> for Presence {
    fn from(value: Value) -> Self {
        Presence::Present(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn present_null_is_not_absent() {
        let null = Presence::present(json!(null));
        assert!(null.is_present());
        assert_eq!(null.value(), Some(&json!(null)));
        assert!(!Presence::absent().is_present());
        assert_eq!(Presence::absent().value(), None);
        assert_ne!(null, Presence::absent());
    }

    #[test]
    fn into_value_moves_the_payload() {
        let p = Presence::present(json!({"a": 1}));
        assert_eq!(p.into_value(), Some(json!({"a": 1})));
        assert_eq!(Presence::absent().into_value(), None);
    }
}
