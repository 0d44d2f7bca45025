//! The five archival entity variants

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::reference::{CollectionRef, DeliverableUnitRef, EntityRef, FileRef, MetadataRef, Relation};

/// Entity type discriminator.
///
/// `ARCHIVE_ORDER` is the fixed order in which a whole-archive reindex
/// walks the byte-store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Collection,
    DeliverableUnit,
    Manifestation,
    File,
    Event,
}

impl EntityKind {
    pub const ARCHIVE_ORDER: [EntityKind; 5] = [
        EntityKind::Collection,
        EntityKind::Event,
        EntityKind::DeliverableUnit,
        EntityKind::File,
        EntityKind::Manifestation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Collection => "collection",
            EntityKind::DeliverableUnit => "deliverable_unit",
            EntityKind::Manifestation => "manifestation",
            EntityKind::File => "file",
            EntityKind::Event => "event",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "collection" => Some(EntityKind::Collection),
            "deliverable_unit" => Some(EntityKind::DeliverableUnit),
            "manifestation" => Some(EntityKind::Manifestation),
            "file" => Some(EntityKind::File),
            "event" => Some(EntityKind::Event),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One archival unit.
///
/// Adding a variant is a compile-time-enforced change: the codec and the
/// ancestry resolver both match exhaustively on this enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Collection(Collection),
    DeliverableUnit(DeliverableUnit),
    Manifestation(Manifestation),
    File(File),
    Event(Event),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::Collection(c) => &c.id,
            Entity::DeliverableUnit(d) => &d.id,
            Entity::Manifestation(m) => &m.id,
            Entity::File(f) => &f.id,
            Entity::Event(e) => &e.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Collection(_) => EntityKind::Collection,
            Entity::DeliverableUnit(_) => EntityKind::DeliverableUnit,
            Entity::Manifestation(_) => EntityKind::Manifestation,
            Entity::File(_) => EntityKind::File,
            Entity::Event(_) => EntityKind::Event,
        }
    }
}

/// A grouping of deliverable units, optionally nested under a parent
/// collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub code: Option<String>,
    pub title: Option<String>,
    pub security_tag: Option<String>,
    pub parent: Option<CollectionRef>,
}

impl Collection {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// An inline or referenced metadata fragment attached to a deliverable
/// unit. The reference resolves to an XML blob in the byte-store; the
/// text is an embedded XML fragment. Either may be absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub reference: Option<MetadataRef>,
    pub text: Option<String>,
}

/// The unit of description and delivery: what a consumer of the archive
/// asks for.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeliverableUnit {
    pub id: String,
    pub title: Option<String>,
    pub scope_content: Option<String>,
    pub security_tag: Option<String>,
    pub catalogue_ref: Option<String>,
    pub parents: Vec<DeliverableUnitRef>,
    /// Collection memberships; a slot may hold an explicitly empty
    /// reference.
    pub collections: Vec<Option<CollectionRef>>,
    pub relations: Vec<Relation>,
    pub subjects: Vec<Option<String>>,
    pub creators: Vec<Option<String>>,
    pub metadata: Vec<MetadataEntry>,
}

impl DeliverableUnit {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// One file entry within a manifestation, with its typed relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestationFile {
    pub reference: FileRef,
    pub relations: Vec<Relation>,
}

impl ManifestationFile {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: FileRef::new(reference),
            relations: Vec::new(),
        }
    }
}

/// A concrete rendering of a deliverable unit: the set of files that
/// together make one usable instance of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifestation {
    pub id: String,
    pub deliverable_unit: DeliverableUnitRef,
    pub originality: Option<bool>,
    pub manifestation_type: Option<String>,
    pub files: Vec<Option<ManifestationFile>>,
}

impl Manifestation {
    pub fn new(id: impl Into<String>, deliverable_unit: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            deliverable_unit: DeliverableUnitRef::new(deliverable_unit),
            originality: None,
            manifestation_type: None,
            files: Vec::new(),
        }
    }
}

/// A checksum recorded against a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixity {
    pub algorithm: String,
    pub value: String,
}

impl Fixity {
    pub fn new(algorithm: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            value: value.into(),
        }
    }
}

/// An identified file format, typically a PRONOM PUID plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatInfo {
    pub puid: String,
    pub name: String,
}

impl FormatInfo {
    pub fn new(puid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            puid: puid.into(),
            name: name.into(),
        }
    }
}

/// A stored byte-stream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct File {
    pub id: String,
    pub name: Option<String>,
    pub size: Option<i64>,
    pub working_path: Option<String>,
    pub fixities: Vec<Option<Fixity>>,
    pub formats: Vec<Option<FormatInfo>>,
}

impl File {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Something that happened to one or more entities. Events annotate;
/// they are never contained and have no ancestors.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub event_type: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub outcome: Option<String>,
    pub detail: Option<String>,
    pub targets: Vec<EntityRef>,
}

impl Event {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}
