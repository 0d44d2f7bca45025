//! Second-pass materialization over the committed index
//!
//! Both passes run only after the visibility barrier: every lookup here
//! reads documents a prior commit made durable. The ancestry pass walks
//! containment edges upward and rewrites each document with its
//! transitive ancestor set; the event pass copies event metadata onto
//! each target document, committing once per event so a later event
//! observes an earlier event's write to the same target.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::codec::DocumentCodec;
use crate::document::{Document, FieldValue, field};
use crate::engine::{Query, SearchEngine};
use crate::error::Result;
use crate::model::{Entity, EntityKind, Event};

use super::executor::QueryExecutor;

/// Resolve and write the ancestor set for every added id. The caller
/// commits once after the whole pass.
pub(super) fn apply_ancestry(
    executor: &QueryExecutor,
    engine: &dyn SearchEngine,
    codec: &DocumentCodec,
    added_ids: &[String],
) -> Result<()> {
    for id in added_ids {
        let Some(doc) = executor.lookup_by_id(id)? else {
            debug!("added id {id} no longer in index, skipping ancestry");
            continue;
        };
        let entity = match codec.decode(&doc) {
            Ok(entity) => entity,
            Err(err) => {
                warn!("undecodable document {id}, skipping ancestry: {err}");
                continue;
            }
        };

        let mut visited: BTreeSet<String> = BTreeSet::new();
        visited.insert(id.clone());
        let mut ancestors: Vec<String> = Vec::new();
        collect_ancestors(executor, codec, &entity, &mut visited, &mut ancestors)?;

        if ancestors.is_empty() {
            continue;
        }
        debug!("writing {} ancestors for {id}", ancestors.len());
        let mut duplicate = doc;
        duplicate.set_ancestors(ancestors);
        engine.add_batch(&[duplicate])?;
    }
    Ok(())
}

/// Walk one entity's containment edges, depth-first. The visited set
/// guards against reference cycles in malformed data; each ancestor id
/// is contributed exactly once, in discovery order.
fn collect_ancestors(
    executor: &QueryExecutor,
    codec: &DocumentCodec,
    entity: &Entity,
    visited: &mut BTreeSet<String>,
    out: &mut Vec<String>,
) -> Result<()> {
    match entity {
        Entity::Collection(collection) => {
            if let Some(parent) = &collection.parent {
                add_ancestor(executor, codec, parent.id(), visited, out)?;
            }
        }
        Entity::DeliverableUnit(unit) => {
            for parent in &unit.parents {
                add_ancestor(executor, codec, parent.id(), visited, out)?;
            }
            for collection in unit.collections.iter().flatten() {
                add_ancestor(executor, codec, collection.id(), visited, out)?;
            }
        }
        Entity::Manifestation(manifestation) => {
            add_ancestor(executor, codec, manifestation.deliverable_unit.id(), visited, out)?;
        }
        Entity::File(file) => {
            // A file cannot name its containers; reverse-search for
            // manifestation-file and metadata-ref entries pointing at it.
            let query = Query::Any(vec![
                Query::term(field::FILE_REF, &file.id),
                Query::term(field::METADATA_REF, &file.id),
            ]);
            let container_ids: Vec<String> = executor
                .scroll(query)
                .map(|page| {
                    page.map(|hits| {
                        hits.into_iter()
                            .map(|hit| hit.document.id().to_string())
                            .collect::<Vec<_>>()
                    })
                })
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .flatten()
                .collect();
            for container in container_ids {
                add_ancestor(executor, codec, &container, visited, out)?;
            }
        }
        // events annotate, they are not contained
        Entity::Event(_) => {}
    }
    Ok(())
}

fn add_ancestor(
    executor: &QueryExecutor,
    codec: &DocumentCodec,
    id: &str,
    visited: &mut BTreeSet<String>,
    out: &mut Vec<String>,
) -> Result<()> {
    if !visited.insert(id.to_string()) {
        return Ok(());
    }
    out.push(id.to_string());

    let Some(doc) = executor.lookup_by_id(id)? else {
        debug!("ancestor {id} not in index, keeping id without recursing");
        return Ok(());
    };
    match codec.decode(&doc) {
        Ok(ancestor) => collect_ancestors(executor, codec, &ancestor, visited, out),
        Err(err) => {
            debug!("undecodable ancestor {id}, keeping id without recursing: {err}");
            Ok(())
        }
    }
}

/// Copy event metadata onto every target of every added event. Commits
/// once per event, after its full target list.
pub(super) fn propagate_events(
    executor: &QueryExecutor,
    engine: &dyn SearchEngine,
    codec: &DocumentCodec,
    added_ids: &[String],
) -> Result<()> {
    for id in added_ids {
        let Some(doc) = executor.lookup_by_id(id)? else {
            continue;
        };
        if doc.kind() != Some(EntityKind::Event) {
            continue;
        }
        let event = match codec.decode(&doc) {
            Ok(Entity::Event(event)) => event,
            Ok(_) => continue,
            Err(err) => {
                warn!("undecodable event document {id}, skipping propagation: {err}");
                continue;
            }
        };

        for target in &event.targets {
            let Some(target_doc) = executor.lookup_by_id(target.id())? else {
                debug!("target {} of event {id} not in index", target.id());
                continue;
            };
            engine.add_batch(&[annotate_target(target_doc, &event)])?;
        }
        engine.commit()?;
    }
    Ok(())
}

/// Duplicate a target document with the event's fields copied on top.
/// The generic fields carry the latest event; the per-type date map
/// retains one date per event type across multiple events.
fn annotate_target(mut doc: Document, event: &Event) -> Document {
    if let Some(event_type) = &event.event_type {
        doc.set_text(field::EVENT_TYPE, event_type);
    }
    if let Some(date) = event.date {
        doc.set(field::EVENT_DATE, FieldValue::Date(date));
    }
    if let Some(outcome) = &event.outcome {
        doc.set_text(field::EVENT_OUTCOME, outcome);
    }
    if let Some(detail) = &event.detail {
        doc.set_text(field::EVENT_DETAIL, detail);
    }
    if let (Some(event_type), Some(date)) = (&event.event_type, event.date) {
        doc.set_event_date(event_type.clone(), date);
    }
    doc
}
