//! Flat multi-valued document model
//!
//! A [`Document`] is the search-engine-native projection of one entity: a
//! map from field name to an ordered list of value slots. A slot is
//! `Option<FieldValue>`; `None` is a logical null that still occupies a
//! position, so positionally-paired fields (fixity algorithm/value,
//! relation predicate/target) stay aligned. Consumers must treat a `None`
//! slot as absent and must never reorder slots.
//!
//! Per-file relations and per-event-type dates are explicit nested maps
//! rather than string-concatenated dynamic field names; [`Document::flatten`]
//! lowers them for engines that only store flat fields.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{EntityKind, Relation};

/// Field name constants shared by the codec, the materialization passes
/// and the query layer.
pub mod field {
    pub const KIND: &str = "kind";
    pub const INDEXED_AT: &str = "indexed_at";
    pub const ANCESTORS: &str = "ancestors";

    pub const CODE: &str = "code";
    pub const TITLE: &str = "title";
    pub const SECURITY_TAG: &str = "security_tag";
    pub const PARENT_COLLECTION: &str = "parent_collection";

    pub const SCOPE_CONTENT: &str = "scope_content";
    pub const CATALOGUE_REF: &str = "catalogue_ref";
    pub const PARENT_DELIVERABLE_UNIT: &str = "parent_deliverable_unit";
    pub const COLLECTION_REF: &str = "collection_ref";
    pub const RELATION_PREDICATE: &str = "relation_predicate";
    pub const RELATION_TARGET: &str = "relation_target";
    pub const SUBJECT: &str = "subject";
    pub const CREATOR: &str = "creator";
    pub const METADATA_REF: &str = "metadata_ref";
    pub const METADATA_TEXT: &str = "metadata_text";

    pub const DELIVERABLE_UNIT: &str = "deliverable_unit";
    pub const ORIGINALITY: &str = "originality";
    pub const MANIFESTATION_TYPE: &str = "manifestation_type";
    pub const FILE_REF: &str = "file_ref";

    pub const NAME: &str = "name";
    pub const SIZE: &str = "size";
    pub const WORKING_PATH: &str = "working_path";
    pub const FIXITY_ALGORITHM: &str = "fixity_algorithm";
    pub const FIXITY_VALUE: &str = "fixity_value";
    pub const FORMAT_PUID: &str = "format_puid";
    pub const FORMAT_NAME: &str = "format_name";

    pub const EVENT_TYPE: &str = "event_type";
    pub const EVENT_DATE: &str = "event_date";
    pub const EVENT_OUTCOME: &str = "event_outcome";
    pub const EVENT_DETAIL: &str = "event_detail";
    pub const EVENT_TARGET: &str = "event_target";

    /// Field-name prefix for flattened metadata XML; element text lands
    /// under `metadata/<path>`, attributes under `metadata/<path>@<attr>`,
    /// and the whole-document full text under the bare prefix.
    pub const METADATA_PREFIX: &str = "metadata";

    /// Flat-form prefixes used only by [`super::Document::flatten`].
    pub const FILE_LINK_PREFIX: &str = "file_";
    pub const EVENT_DATE_PREFIX: &str = "event_";
}

/// One scalar value inside a document field slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Long(i64),
    Bool(bool),
    Date(DateTime<Utc>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            FieldValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Text rendering used for term matching and highlighting.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Long(v) => v.to_string(),
            FieldValue::Bool(v) => v.to_string(),
            FieldValue::Date(d) => d.to_rfc3339(),
        }
    }
}

/// The flat index representation of one entity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    id: String,
    fields: BTreeMap<String, Vec<Option<FieldValue>>>,
    /// Relations of file-within-manifestation links, keyed by file ref
    file_relations: BTreeMap<String, Vec<Relation>>,
    /// Latest date per event type, retained across propagated events
    event_dates: BTreeMap<String, DateTime<Utc>>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The type discriminator, when present and recognized.
    pub fn kind(&self) -> Option<EntityKind> {
        self.text(field::KIND).and_then(EntityKind::parse)
    }

    /// Replace a field with one non-null value.
    pub fn set(&mut self, name: &str, value: FieldValue) {
        self.fields.insert(name.to_string(), vec![Some(value)]);
    }

    pub fn set_text(&mut self, name: &str, value: impl Into<String>) {
        self.set(name, FieldValue::Text(value.into()));
    }

    /// Append one slot to a multi-valued field, preserving position.
    pub fn push_slot(&mut self, name: &str, slot: Option<FieldValue>) {
        self.fields.entry(name.to_string()).or_default().push(slot);
    }

    pub fn push_text_slot(&mut self, name: &str, slot: Option<String>) {
        self.push_slot(name, slot.map(FieldValue::Text));
    }

    /// All slots of a field, nulls included, in encode order.
    pub fn slots(&self, name: &str) -> &[Option<FieldValue>] {
        self.fields.get(name).map_or(&[], Vec::as_slice)
    }

    /// First non-null value of a field.
    pub fn first(&self, name: &str) -> Option<&FieldValue> {
        self.slots(name).iter().flatten().next()
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.first(name).and_then(FieldValue::as_text)
    }

    pub fn long(&self, name: &str) -> Option<i64> {
        self.first(name).and_then(FieldValue::as_long)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.first(name).and_then(FieldValue::as_bool)
    }

    pub fn date(&self, name: &str) -> Option<DateTime<Utc>> {
        self.first(name).and_then(FieldValue::as_date)
    }

    /// Text slots of a multi-valued field, nulls preserved.
    pub fn text_slots(&self, name: &str) -> Vec<Option<String>> {
        self.slots(name)
            .iter()
            .map(|slot| slot.as_ref().and_then(FieldValue::as_text).map(str::to_string))
            .collect()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn indexed_at(&self) -> Option<DateTime<Utc>> {
        self.date(field::INDEXED_AT)
    }

    /// Derived transitive-containment ids; empty until the ancestry pass
    /// has run.
    pub fn ancestors(&self) -> Vec<String> {
        self.text_slots(field::ANCESTORS).into_iter().flatten().collect()
    }

    pub fn set_ancestors(&mut self, ancestors: impl IntoIterator<Item = String>) {
        let slots: Vec<Option<FieldValue>> = ancestors
            .into_iter()
            .map(|id| Some(FieldValue::Text(id)))
            .collect();
        self.fields.insert(field::ANCESTORS.to_string(), slots);
    }

    pub fn file_relations(&self) -> &BTreeMap<String, Vec<Relation>> {
        &self.file_relations
    }

    pub fn set_file_relations(&mut self, file_ref: impl Into<String>, relations: Vec<Relation>) {
        self.file_relations.insert(file_ref.into(), relations);
    }

    pub fn event_dates(&self) -> &BTreeMap<String, DateTime<Utc>> {
        &self.event_dates
    }

    pub fn set_event_date(&mut self, event_type: impl Into<String>, date: DateTime<Utc>) {
        self.event_dates.insert(event_type.into(), date);
    }

    /// Lower the nested structures into flat multi-valued fields, for
    /// engine drivers that cannot store nested maps. Relation slots stay
    /// positionally aligned: `file_<ref>_relation[i]` pairs with
    /// `file_<ref>_target[i]`.
    pub fn flatten(&self) -> BTreeMap<String, Vec<Option<FieldValue>>> {
        let mut flat = self.fields.clone();
        for (file_ref, relations) in &self.file_relations {
            let predicate_key = format!("{}{}_relation", field::FILE_LINK_PREFIX, file_ref);
            let target_key = format!("{}{}_target", field::FILE_LINK_PREFIX, file_ref);
            for relation in relations {
                flat.entry(predicate_key.clone())
                    .or_default()
                    .push(Some(FieldValue::Text(relation.predicate.clone())));
                flat.entry(target_key.clone())
                    .or_default()
                    .push(relation.target.as_ref().map(|t| FieldValue::Text(t.id().to_string())));
            }
        }
        for (event_type, date) in &self.event_dates {
            let key = format!("{}{}_date", field::EVENT_DATE_PREFIX, event_type);
            flat.insert(key, vec![Some(FieldValue::Date(*date))]);
        }
        flat
    }
}
