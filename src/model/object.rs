//! Structure nodes: the ordered field map of one compiled class.

use indexmap::IndexMap;

use super::Ty;

/// One named field: the schema type initially, replaced by the failure type
/// when the field's value did not match.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSlot {
    pub ty: Ty,
    pub invalid: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjectTy {
    /// Name of the compiled class this node describes.
    pub class: String,
    pub fields: IndexMap<String, FieldSlot>,
    /// Class-level errors that belong to no single field.
    pub errors: Vec<Ty>,
    pub invalid: bool,
}

impl ObjectTy {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            fields: IndexMap::new(),
            errors: Vec::new(),
            invalid: false,
        }
    }

    pub fn add_field(&mut self, name: impl Into<String>, ty: Ty) {
        let name = name.into();
        let prior = self.fields.insert(
            name.clone(),
            FieldSlot { ty, invalid: false },
        );
        assert!(prior.is_none(), "field added twice: {name}");
    }

    /// Replace a field's schema type with its failure type. Last write wins;
    /// the field must have been added first.
    pub fn overwrite_invalid_field(&mut self, name: &str, failure: Ty) {
        let slot = self
            .fields
            .get_mut(name)
            .unwrap_or_else(|| panic!("field never added: {name}"));
        slot.ty = failure;
        slot.invalid = true;
        self.invalid = true;
    }

    pub fn add_error(&mut self, error: Ty) {
        self.errors.push(error);
        self.invalid = true;
    }

    pub fn invalid_fields(&self) -> impl Iterator<Item = (&String, &FieldSlot)> {
        self.fields.iter().filter(|(_, slot)| slot.invalid)
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
    fn overwrite_marks_field_and_node() {
        let mut obj = ObjectTy::new("User");
        obj.add_field("name", leaf("string"));
        obj.add_field("age", leaf("int"));
        assert!(!obj.invalid);

        obj.overwrite_invalid_field("age", Ty::message("not an int"));
        assert!(obj.invalid);
        assert_eq!(obj.invalid_fields().count(), 1);
        assert_eq!(obj.fields["age"].ty, Ty::message("not an int"));
        // order of insertion is preserved
        let names: Vec<&String> = obj.fields.keys().collect();
        assert_eq!(names, ["name", "age"]);
    }

    #[test]
    fn last_write_wins_on_repeated_overwrite() {
        let mut obj = ObjectTy::new("User");
        obj.add_field("age", leaf("int"));
        obj.overwrite_invalid_field("age", Ty::message("first"));
        obj.overwrite_invalid_field("age", Ty::message("second"));
        assert_eq!(obj.fields["age"].ty, Ty::message("second"));
    }

    #[test]
    #[should_panic(expected = "added twice")]
    fn double_add_panics() {
        let mut obj = ObjectTy::new("User");
        obj.add_field("name", leaf("string"));
        obj.add_field("name", leaf("string"));
    }

    #[test]
    #[should_panic(expected = "never added")]
    fn overwriting_an_unknown_field_panics() {
        let mut obj = ObjectTy::new("User");
        obj.overwrite_invalid_field("ghost", Ty::message("boom"));
    }

    #[test]
    fn class_errors_flip_the_node() {
        let mut obj = ObjectTy::new("User");
        obj.add_field("name", leaf("string"));
        obj.add_error(Ty::message("unknown key 'extra'"));
        assert!(obj.invalid);
        assert_eq!(obj.invalid_fields().count(), 0);
    }
}
