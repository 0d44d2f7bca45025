//! Archival entity model
//!
//! A closed set of five entity variants plus the typed references and
//! relations that connect them. References are weak pointers by id; they
//! carry no ownership, and a reference slot inside a multi-valued
//! container may legitimately be empty.

mod entity;
mod reference;

pub use entity::{
    Collection, DeliverableUnit, Entity, EntityKind, Event, File, Fixity, FormatInfo,
    Manifestation, ManifestationFile, MetadataEntry,
};
pub use reference::{
    CollectionRef, DeliverableUnitRef, EntityRef, FileRef, MetadataRef, Relation,
};
