//! Container nodes: keyed arrays and sequential lists.
//!
//! Item/key failures are recorded out-of-band in a map keyed by the ORIGINAL
//! container key, never a coerced replacement, so callers can locate elements
//! positionally in the input they supplied.

use indexmap::IndexMap;

use super::{Params, Ty};

/// Failure record for one array pair. At least one side is always populated;
/// the two sides are set independently and merge under the same key in
/// either order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvalidPair {
    pub key: Option<Ty>,
    pub value: Option<Ty>,
}

/// Keyed container type: item type, optional key type, structural parameters
/// and the out-of-band invalid-pairs map.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayTy {
    pub item: Box<Ty>,
    pub key: Option<Box<Ty>>,
    pub params: Params,
    pub invalid_pairs: IndexMap<String, InvalidPair>,
}

impl ArrayTy {
    pub fn new(item: Ty, key: Option<Ty>) -> Self {
        Self {
            item: Box::new(item),
            key: key.map(Box::new),
            params: Params::new(),
            invalid_pairs: IndexMap::new(),
        }
    }

    pub fn add_invalid_key(&mut self, original_key: impl Into<String>, key_ty: Ty) {
        let original_key = original_key.into();
        let pair = self.invalid_pairs.entry(original_key.clone()).or_default();
        assert!(
            pair.key.is_none(),
            "key side recorded twice for pair {original_key}"
        );
        pair.key = Some(key_ty);
    }

    pub fn add_invalid_value(&mut self, original_key: impl Into<String>, value_ty: Ty) {
        let original_key = original_key.into();
        let pair = self.invalid_pairs.entry(original_key.clone()).or_default();
        assert!(
            pair.value.is_none(),
            "value side recorded twice for pair {original_key}"
        );
        pair.value = Some(value_ty);
    }

    /// Record both sides at once. At least one side must be present.
    pub fn add_invalid_pair(
        &mut self,
        original_key: impl Into<String>,
        key_ty: Option<Ty>,
        value_ty: Option<Ty>,
    ) {
        let original_key = original_key.into();
        assert!(
            key_ty.is_some() || value_ty.is_some(),
            "invalid pair {original_key} needs at least one side"
        );
        if let Some(k) = key_ty {
            self.add_invalid_key(original_key.clone(), k);
        }
        if let Some(v) = value_ty {
            self.add_invalid_value(original_key, v);
        }
    }
}

/// Sequential container type: item type, structural parameters (including the
/// standalone dense-keys check) and the out-of-band invalid-items map.
#[derive(Clone, Debug, PartialEq)]
pub struct ListTy {
    pub item: Box<Ty>,
    pub params: Params,
    pub invalid_items: IndexMap<String, Ty>,
}

impl ListTy {
    pub fn new(item: Ty) -> Self {
        Self {
            item: Box::new(item),
            params: Params::new(),
            invalid_items: IndexMap::new(),
        }
    }

    pub fn add_invalid_item(&mut self, original_key: impl Into<String>, item_ty: Ty) {
        let original_key = original_key.into();
        let prior = self.invalid_items.insert(original_key.clone(), item_ty);
        assert!(
            prior.is_none(),
            "item recorded twice for key {original_key}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SimpleTy;

    fn leaf(name: &str) -> Ty {
        Ty::Simple(SimpleTy::new(name))
    }

    #[test]
    fn pair_sides_merge_in_either_order() {
        let mut a = ArrayTy::new(leaf("int"), Some(leaf("string")));
        a.add_invalid_key("foo", leaf("string"));
        a.add_invalid_value("foo", leaf("int"));

        let mut b = ArrayTy::new(leaf("int"), Some(leaf("string")));
        b.add_invalid_value("foo", leaf("int"));
        b.add_invalid_key("foo", leaf("string"));

        assert_eq!(a.invalid_pairs, b.invalid_pairs);
        let pair = &a.invalid_pairs["foo"];
        assert!(pair.key.is_some() && pair.value.is_some());
    }

    #[test]
    fn independent_sides_stay_independent() {
        let mut a = ArrayTy::new(leaf("int"), None);
        a.add_invalid_value("3", leaf("int"));
        a.add_invalid_key("baz", leaf("string"));
        assert!(a.invalid_pairs["3"].key.is_none());
        assert!(a.invalid_pairs["baz"].value.is_none());
    }

    #[test]
    #[should_panic(expected = "at least one side")]
    fn empty_pair_record_panics() {
        let mut a = ArrayTy::new(leaf("int"), None);
        a.add_invalid_pair("foo", None, None);
    }

    #[test]
    #[should_panic(expected = "recorded twice")]
    fn double_value_side_panics() {
        let mut a = ArrayTy::new(leaf("int"), None);
        a.add_invalid_value("foo", leaf("int"));
        a.add_invalid_value("foo", leaf("int"));
    }

    #[test]
    #[should_panic(expected = "recorded twice")]
    fn double_list_item_panics() {
        let mut l = ListTy::new(leaf("int"));
        l.add_invalid_item("2", leaf("int"));
        l.add_invalid_item("2", leaf("int"));
    }
}
