//! Entity ↔ document mapping
//!
//! [`DocumentCodec`] owns the bidirectional mapping between the typed
//! entity model and the flat multi-valued document representation.
//! Single-valued fields are emitted only when present; absence alone
//! encodes null. Multi-valued fields are written slot-for-slot, nulls
//! included, so count and positional correspondence survive the round
//! trip; positionally-paired fields (fixity algorithm/value, relation
//! predicate/target) are re-paired by position on decode.
//!
//! Metadata full text is produced by [`xml::flatten_xml`]: inline XML
//! fragments always contribute, and a metadata reference contributes the
//! referenced blob when the byte-store can resolve it. An unresolvable
//! reference skips only that blob, since synthetic ids legitimately dangle.

mod xml;

pub use xml::flatten_xml;

use std::sync::Arc;

use chrono::Utc;
use itertools::{EitherOrBoth, Itertools};
use tracing::debug;

use crate::document::{Document, FieldValue, field};
use crate::error::{Result, StacksError};
use crate::model::{
    Collection, CollectionRef, DeliverableUnit, DeliverableUnitRef, Entity, EntityKind, EntityRef,
    Event, File, FileRef, Fixity, FormatInfo, Manifestation, ManifestationFile, MetadataEntry,
    MetadataRef, Relation,
};
use crate::store::ArchiveStore;

/// Bidirectional mapper between entities and documents.
#[derive(Default)]
pub struct DocumentCodec {
    content: Option<Arc<dyn ArchiveStore>>,
}

impl DocumentCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve metadata references against this byte-store during
    /// encoding. Without a store, referenced blobs are skipped and only
    /// inline metadata text reaches the full-text fields.
    pub fn with_content_store(mut self, store: Arc<dyn ArchiveStore>) -> Self {
        self.content = Some(store);
        self
    }

    /// Map an entity to its index document.
    pub fn encode(&self, entity: &Entity) -> Result<Document> {
        let mut doc = Document::new(entity.id());
        doc.set_text(field::KIND, entity.kind().as_str());
        doc.set(field::INDEXED_AT, FieldValue::Date(Utc::now()));

        match entity {
            Entity::Collection(c) => encode_collection(&mut doc, c),
            Entity::DeliverableUnit(d) => self.encode_deliverable_unit(&mut doc, d)?,
            Entity::Manifestation(m) => encode_manifestation(&mut doc, m),
            Entity::File(f) => encode_file(&mut doc, f),
            Entity::Event(e) => encode_event(&mut doc, e),
        }
        Ok(doc)
    }

    /// Map a document back to its entity.
    ///
    /// Fields the codec does not own (ancestry, propagated event
    /// fields, flattened metadata text) are ignored here; they belong
    /// to the index, not the entity.
    pub fn decode(&self, doc: &Document) -> Result<Entity> {
        let raw = doc.text(field::KIND).ok_or_else(|| {
            StacksError::Mapping(format!("document {} has no kind discriminator", doc.id()))
        })?;
        let kind = EntityKind::parse(raw).ok_or_else(|| {
            StacksError::Mapping(format!("document {} has unknown kind {raw:?}", doc.id()))
        })?;

        Ok(match kind {
            EntityKind::Collection => Entity::Collection(decode_collection(doc)),
            EntityKind::DeliverableUnit => Entity::DeliverableUnit(decode_deliverable_unit(doc)),
            EntityKind::Manifestation => Entity::Manifestation(decode_manifestation(doc)?),
            EntityKind::File => Entity::File(decode_file(doc)),
            EntityKind::Event => Entity::Event(decode_event(doc)),
        })
    }

    fn encode_deliverable_unit(&self, doc: &mut Document, unit: &DeliverableUnit) -> Result<()> {
        set_opt_text(doc, field::TITLE, unit.title.as_deref());
        set_opt_text(doc, field::SCOPE_CONTENT, unit.scope_content.as_deref());
        set_opt_text(doc, field::SECURITY_TAG, unit.security_tag.as_deref());
        set_opt_text(doc, field::CATALOGUE_REF, unit.catalogue_ref.as_deref());

        for parent in &unit.parents {
            doc.push_text_slot(field::PARENT_DELIVERABLE_UNIT, Some(parent.id().to_string()));
        }
        for collection in &unit.collections {
            doc.push_text_slot(
                field::COLLECTION_REF,
                collection.as_ref().map(|c| c.id().to_string()),
            );
        }
        for relation in &unit.relations {
            doc.push_text_slot(field::RELATION_PREDICATE, Some(relation.predicate.clone()));
            doc.push_text_slot(
                field::RELATION_TARGET,
                relation.target.as_ref().map(|t| t.id().to_string()),
            );
        }
        for subject in &unit.subjects {
            doc.push_text_slot(field::SUBJECT, subject.clone());
        }
        for creator in &unit.creators {
            doc.push_text_slot(field::CREATOR, creator.clone());
        }
        for entry in &unit.metadata {
            doc.push_text_slot(
                field::METADATA_REF,
                entry.reference.as_ref().map(|r| r.id().to_string()),
            );
            doc.push_text_slot(field::METADATA_TEXT, entry.text.clone());
            self.index_metadata_text(doc, &unit.id, entry)?;
        }
        Ok(())
    }

    /// Feed one metadata entry through the XML flattening. Inline text
    /// always contributes; a referenced blob contributes when the store
    /// resolves it.
    fn index_metadata_text(
        &self,
        doc: &mut Document,
        unit_id: &str,
        entry: &MetadataEntry,
    ) -> Result<()> {
        if let Some(text) = &entry.text {
            push_flat_fields(doc, flatten_xml(field::METADATA_PREFIX, text)?);
        }
        let Some(reference) = &entry.reference else {
            return Ok(());
        };
        let Some(store) = &self.content else {
            return Ok(());
        };
        match store.get_content(reference.id()) {
            Ok(bytes) => {
                let xml = String::from_utf8_lossy(&bytes);
                push_flat_fields(doc, flatten_xml(field::METADATA_PREFIX, &xml)?);
            }
            Err(err) => {
                debug!(
                    unit = unit_id,
                    reference = reference.id(),
                    "metadata reference unresolvable, skipping full text: {err}"
                );
            }
        }
        Ok(())
    }
}

fn set_opt_text(doc: &mut Document, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        doc.set_text(name, value);
    }
}

fn push_flat_fields(doc: &mut Document, flat: Vec<(String, String)>) {
    for (name, value) in flat {
        doc.push_text_slot(&name, Some(value));
    }
}

fn encode_collection(doc: &mut Document, collection: &Collection) {
    set_opt_text(doc, field::CODE, collection.code.as_deref());
    set_opt_text(doc, field::TITLE, collection.title.as_deref());
    set_opt_text(doc, field::SECURITY_TAG, collection.security_tag.as_deref());
    if let Some(parent) = &collection.parent {
        doc.set_text(field::PARENT_COLLECTION, parent.id());
    }
}

fn encode_manifestation(doc: &mut Document, manifestation: &Manifestation) {
    doc.set_text(field::DELIVERABLE_UNIT, manifestation.deliverable_unit.id());
    if let Some(originality) = manifestation.originality {
        doc.set(field::ORIGINALITY, FieldValue::Bool(originality));
    }
    set_opt_text(
        doc,
        field::MANIFESTATION_TYPE,
        manifestation.manifestation_type.as_deref(),
    );
    for entry in &manifestation.files {
        doc.push_text_slot(
            field::FILE_REF,
            entry.as_ref().map(|f| f.reference.id().to_string()),
        );
        if let Some(entry) = entry {
            if !entry.relations.is_empty() {
                doc.set_file_relations(entry.reference.id(), entry.relations.clone());
            }
        }
    }
}

fn encode_file(doc: &mut Document, file: &File) {
    set_opt_text(doc, field::NAME, file.name.as_deref());
    if let Some(size) = file.size {
        doc.set(field::SIZE, FieldValue::Long(size));
    }
    set_opt_text(doc, field::WORKING_PATH, file.working_path.as_deref());
    for fixity in &file.fixities {
        doc.push_text_slot(
            field::FIXITY_ALGORITHM,
            fixity.as_ref().map(|f| f.algorithm.clone()),
        );
        doc.push_text_slot(field::FIXITY_VALUE, fixity.as_ref().map(|f| f.value.clone()));
    }
    for format in &file.formats {
        doc.push_text_slot(field::FORMAT_PUID, format.as_ref().map(|f| f.puid.clone()));
        doc.push_text_slot(field::FORMAT_NAME, format.as_ref().map(|f| f.name.clone()));
    }
}

fn encode_event(doc: &mut Document, event: &Event) {
    set_opt_text(doc, field::EVENT_TYPE, event.event_type.as_deref());
    if let Some(date) = event.date {
        doc.set(field::EVENT_DATE, FieldValue::Date(date));
    }
    set_opt_text(doc, field::EVENT_OUTCOME, event.outcome.as_deref());
    set_opt_text(doc, field::EVENT_DETAIL, event.detail.as_deref());
    for target in &event.targets {
        doc.push_text_slot(field::EVENT_TARGET, Some(target.id().to_string()));
    }
}

fn decode_collection(doc: &Document) -> Collection {
    Collection {
        id: doc.id().to_string(),
        code: doc.text(field::CODE).map(str::to_string),
        title: doc.text(field::TITLE).map(str::to_string),
        security_tag: doc.text(field::SECURITY_TAG).map(str::to_string),
        parent: doc.text(field::PARENT_COLLECTION).map(CollectionRef::new),
    }
}

fn decode_deliverable_unit(doc: &Document) -> DeliverableUnit {
    let relations = paired_slots(doc, field::RELATION_PREDICATE, field::RELATION_TARGET)
        .into_iter()
        .filter_map(|(predicate, target)| {
            predicate.map(|predicate| Relation {
                predicate,
                target: target.map(EntityRef::new),
            })
        })
        .collect();
    let metadata = paired_slots(doc, field::METADATA_REF, field::METADATA_TEXT)
        .into_iter()
        .map(|(reference, text)| MetadataEntry {
            reference: reference.map(MetadataRef::new),
            text,
        })
        .collect();

    DeliverableUnit {
        id: doc.id().to_string(),
        title: doc.text(field::TITLE).map(str::to_string),
        scope_content: doc.text(field::SCOPE_CONTENT).map(str::to_string),
        security_tag: doc.text(field::SECURITY_TAG).map(str::to_string),
        catalogue_ref: doc.text(field::CATALOGUE_REF).map(str::to_string),
        parents: doc
            .text_slots(field::PARENT_DELIVERABLE_UNIT)
            .into_iter()
            .flatten()
            .map(DeliverableUnitRef::new)
            .collect(),
        collections: doc
            .text_slots(field::COLLECTION_REF)
            .into_iter()
            .map(|slot| slot.map(CollectionRef::new))
            .collect(),
        relations,
        subjects: doc.text_slots(field::SUBJECT),
        creators: doc.text_slots(field::CREATOR),
        metadata,
    }
}

fn decode_manifestation(doc: &Document) -> Result<Manifestation> {
    let deliverable_unit = doc.text(field::DELIVERABLE_UNIT).ok_or_else(|| {
        StacksError::Mapping(format!(
            "manifestation {} has no deliverable unit reference",
            doc.id()
        ))
    })?;
    let files = doc
        .text_slots(field::FILE_REF)
        .into_iter()
        .map(|slot| {
            slot.map(|reference| ManifestationFile {
                relations: doc
                    .file_relations()
                    .get(&reference)
                    .cloned()
                    .unwrap_or_default(),
                reference: FileRef::new(reference),
            })
        })
        .collect();

    Ok(Manifestation {
        id: doc.id().to_string(),
        deliverable_unit: DeliverableUnitRef::new(deliverable_unit),
        originality: doc.boolean(field::ORIGINALITY),
        manifestation_type: doc.text(field::MANIFESTATION_TYPE).map(str::to_string),
        files,
    })
}

fn decode_file(doc: &Document) -> File {
    let fixities = paired_slots(doc, field::FIXITY_ALGORITHM, field::FIXITY_VALUE)
        .into_iter()
        .map(|pair| match pair {
            (Some(algorithm), Some(value)) => Some(Fixity { algorithm, value }),
            _ => None,
        })
        .collect();
    let formats = paired_slots(doc, field::FORMAT_PUID, field::FORMAT_NAME)
        .into_iter()
        .map(|pair| match pair {
            (Some(puid), Some(name)) => Some(FormatInfo { puid, name }),
            _ => None,
        })
        .collect();

    File {
        id: doc.id().to_string(),
        name: doc.text(field::NAME).map(str::to_string),
        size: doc.long(field::SIZE),
        working_path: doc.text(field::WORKING_PATH).map(str::to_string),
        fixities,
        formats,
    }
}

fn decode_event(doc: &Document) -> Event {
    Event {
        id: doc.id().to_string(),
        event_type: doc.text(field::EVENT_TYPE).map(str::to_string),
        date: doc.date(field::EVENT_DATE),
        outcome: doc.text(field::EVENT_OUTCOME).map(str::to_string),
        detail: doc.text(field::EVENT_DETAIL).map(str::to_string),
        targets: doc
            .text_slots(field::EVENT_TARGET)
            .into_iter()
            .flatten()
            .map(EntityRef::new)
            .collect(),
    }
}

/// Re-pair two positionally-aligned multi-valued fields. Lengths match
/// for documents this codec produced; a foreign document with ragged
/// lengths pads the short side with nulls rather than truncating.
fn paired_slots(doc: &Document, left: &str, right: &str) -> Vec<(Option<String>, Option<String>)> {
    doc.text_slots(left)
        .into_iter()
        .zip_longest(doc.text_slots(right))
        .map(|pair| match pair {
            EitherOrBoth::Both(l, r) => (l, r),
            EitherOrBoth::Left(l) => (l, None),
            EitherOrBoth::Right(r) => (None, r),
        })
        .collect()
}
