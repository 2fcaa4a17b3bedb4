//! Compiled class metadata.
//!
//! Compiling class/field declarations into descriptors happens outside this
//! crate (with its own caching); the engine only ever sees the finished
//! product: an ordered field-name -> descriptor map per class, looked up by
//! class name through a registry.

use indexmap::IndexMap;

use crate::rules::Descriptor;

/// One compiled class: its name and its fields in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassMeta {
    pub name: String,
    pub fields: IndexMap<String, Descriptor>,
}

impl ClassMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, descriptor: Descriptor) -> Self {
        let name = name.into();
        let prior = self.fields.insert(name.clone(), descriptor);
        assert!(prior.is_none(), "field compiled twice: {name}");
        self
    }
}

/// Class lookup by name. The cache-backed store behind it is owned by the
/// caller; this is just the view the engine reads.
#[derive(Clone, Debug, Default)]
pub struct MetaRegistry {
    classes: IndexMap<String, ClassMeta>,
}

impl MetaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: ClassMeta) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn get(&self, name: &str) -> Option<&ClassMeta> {
        self.classes.get(name)
    }
}
