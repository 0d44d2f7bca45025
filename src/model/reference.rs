//! Typed references between entities

use serde::{Deserialize, Serialize};

macro_rules! entity_ref {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The referenced entity id.
            pub fn id(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

entity_ref! {
    /// Weak pointer to a collection
    CollectionRef
}
entity_ref! {
    /// Weak pointer to a deliverable unit
    DeliverableUnitRef
}
entity_ref! {
    /// Weak pointer to a file
    FileRef
}
entity_ref! {
    /// Weak pointer to a metadata blob in the byte-store
    MetadataRef
}
entity_ref! {
    /// Untyped pointer to any entity
    EntityRef
}

/// A typed edge: predicate URI plus an optional target reference.
///
/// The target may be absent while the relation itself is present; this is
/// the explicit-null form a reference takes inside the document model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub predicate: String,
    pub target: Option<EntityRef>,
}

impl Relation {
    pub fn new(predicate: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            target: Some(EntityRef::new(target)),
        }
    }

    /// A relation whose target reference is explicitly empty.
    pub fn dangling(predicate: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            target: None,
        }
    }
}
