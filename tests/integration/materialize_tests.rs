//! Ancestry resolution and event propagation scenarios

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use stacks::codec::DocumentCodec;
use stacks::config::IndexConfig;
use stacks::document::field;
use stacks::engine::MemoryEngine;
use stacks::index::{IndexWriter, QueryExecutor};
use stacks::model::{DeliverableUnit, Entity, MetadataEntry, MetadataRef};

use crate::common::{collection, event, file, init_tracing, manifestation, unit_in_collections};

struct Harness {
    engine: Arc<MemoryEngine>,
    writer: IndexWriter,
    config: IndexConfig,
}

impl Harness {
    fn new() -> Self {
        init_tracing();
        let config = IndexConfig::default();
        let engine = Arc::new(MemoryEngine::new());
        let writer = IndexWriter::new(engine.clone(), DocumentCodec::new(), &config);
        Self {
            engine,
            writer,
            config,
        }
    }

    fn index(&mut self, entities: &[Entity]) {
        for entity in entities {
            self.writer.add(entity).unwrap();
        }
        self.writer.close().unwrap();
    }

    fn executor(&self) -> QueryExecutor {
        QueryExecutor::new(self.engine.clone(), &self.config)
    }

    fn ancestors_of(&self, id: &str) -> Vec<String> {
        let doc = self.executor().lookup_by_id(id).unwrap().unwrap();
        let mut ancestors = doc.ancestors();
        ancestors.sort();
        ancestors
    }
}

#[test]
fn collection_chain_ancestry() {
    let mut h = Harness::new();
    h.index(&[
        collection("col-a", None),
        collection("col-b", Some("col-a")),
        unit_in_collections("deu-d", &["col-b"]),
    ]);

    assert!(h.ancestors_of("col-a").is_empty());
    assert_eq!(h.ancestors_of("col-b"), vec!["col-a"]);
    assert_eq!(h.ancestors_of("deu-d"), vec!["col-a", "col-b"]);
}

#[test]
fn manifestation_inherits_unit_chain() {
    let mut h = Harness::new();
    h.index(&[
        collection("col-a", None),
        unit_in_collections("deu-d", &["col-a"]),
        manifestation("man-m", "deu-d", &[]),
    ]);

    assert_eq!(h.ancestors_of("man-m"), vec!["col-a", "deu-d"]);
}

#[test]
fn file_ancestry_via_reverse_search() {
    let mut h = Harness::new();
    h.index(&[
        collection("col-a", None),
        unit_in_collections("deu-d", &["col-a"]),
        manifestation("man-m", "deu-d", &["file-f"]),
        file("file-f"),
    ]);

    // the file names no containers; they are found by searching for
    // manifestation-file entries pointing at it
    assert_eq!(h.ancestors_of("file-f"), vec!["col-a", "deu-d", "man-m"]);
}

#[test]
fn file_ancestry_via_metadata_reference() {
    let mut h = Harness::new();
    let mut unit = DeliverableUnit::new("deu-d");
    unit.metadata = vec![MetadataEntry {
        reference: Some(MetadataRef::new("file-f")),
        text: None,
    }];
    h.index(&[Entity::DeliverableUnit(unit), file("file-f")]);

    assert_eq!(h.ancestors_of("file-f"), vec!["deu-d"]);
}

#[test]
fn reference_cycles_terminate() {
    let mut h = Harness::new();
    // malformed data: two collections claiming each other as parent
    h.index(&[
        collection("col-x", Some("col-y")),
        collection("col-y", Some("col-x")),
    ]);

    assert_eq!(h.ancestors_of("col-x"), vec!["col-y"]);
    assert_eq!(h.ancestors_of("col-y"), vec!["col-x"]);
}

#[test]
fn dangling_parent_keeps_id() {
    let mut h = Harness::new();
    h.index(&[collection("col-b", Some("col-missing"))]);

    assert_eq!(h.ancestors_of("col-b"), vec!["col-missing"]);
}

#[test]
fn event_fields_propagate_to_targets() {
    let d1 = Utc.with_ymd_and_hms(2013, 4, 1, 10, 0, 0).unwrap();
    let d2 = Utc.with_ymd_and_hms(2013, 4, 2, 11, 0, 0).unwrap();

    let mut h = Harness::new();
    h.index(&[
        unit_in_collections("deu-d", &[]),
        event("evt-1", "ingest", d1, &["deu-d"]),
        event("evt-2", "validate", d2, &["deu-d"]),
    ]);

    let doc = h.executor().lookup_by_id("deu-d").unwrap().unwrap();
    // the generic pair carries the latest event
    assert_eq!(doc.text(field::EVENT_TYPE), Some("validate"));
    assert_eq!(doc.text(field::EVENT_OUTCOME), Some("validate ok"));
    assert_eq!(doc.text(field::EVENT_DETAIL), Some("validate detail"));
    // one dated entry per event type survives
    assert_eq!(doc.event_dates().get("ingest"), Some(&d1));
    assert_eq!(doc.event_dates().get("validate"), Some(&d2));
}

#[test]
fn event_propagation_reaches_every_target() {
    let d1 = Utc.with_ymd_and_hms(2013, 5, 1, 9, 0, 0).unwrap();

    let mut h = Harness::new();
    h.index(&[
        unit_in_collections("deu-a", &[]),
        unit_in_collections("deu-b", &[]),
        event("evt-1", "migrate", d1, &["deu-a", "deu-b"]),
    ]);

    for id in ["deu-a", "deu-b"] {
        let doc = h.executor().lookup_by_id(id).unwrap().unwrap();
        assert_eq!(doc.text(field::EVENT_TYPE), Some("migrate"));
        assert_eq!(doc.event_dates().get("migrate"), Some(&d1));
    }
}

#[test]
fn event_with_missing_target_is_tolerated() {
    let d1 = Utc.with_ymd_and_hms(2013, 6, 1, 9, 0, 0).unwrap();

    let mut h = Harness::new();
    h.index(&[event("evt-1", "ingest", d1, &["nowhere"])]);

    // close succeeded; the event document itself is indexed
    let doc = h.executor().lookup_by_id("evt-1").unwrap().unwrap();
    assert_eq!(doc.text(field::EVENT_TYPE), Some("ingest"));
}

#[test]
fn ancestry_lands_after_event_propagation_too() {
    // an entity with both ancestry and a propagated event keeps both
    let d1 = Utc.with_ymd_and_hms(2013, 7, 1, 9, 0, 0).unwrap();

    let mut h = Harness::new();
    h.index(&[
        collection("col-a", None),
        unit_in_collections("deu-d", &["col-a"]),
        event("evt-1", "ingest", d1, &["deu-d"]),
    ]);

    let doc = h.executor().lookup_by_id("deu-d").unwrap().unwrap();
    assert_eq!(doc.ancestors(), vec!["col-a"]);
    assert_eq!(doc.text(field::EVENT_TYPE), Some("ingest"));
}
