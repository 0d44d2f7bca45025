//! Shared fixtures for the integration suites

use parking_lot::Mutex;
use uuid::Uuid;

use stacks::document::Document;
use stacks::engine::{EngineResponse, MemoryEngine, SearchEngine, SearchRequest};
use stacks::error::Result;
use stacks::model::{
    Collection, CollectionRef, DeliverableUnit, Entity, EntityRef, Event, File, Manifestation,
    ManifestationFile,
};

/// Install a test tracing subscriber once; respects `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// A unique entity id for tests that must not collide across runs.
pub fn unique_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

pub fn collection(id: &str, parent: Option<&str>) -> Entity {
    let mut c = Collection::new(id);
    c.parent = parent.map(CollectionRef::new);
    Entity::Collection(c)
}

pub fn unit_in_collections(id: &str, collections: &[&str]) -> Entity {
    let mut unit = DeliverableUnit::new(id);
    unit.collections = collections
        .iter()
        .map(|c| Some(CollectionRef::new(*c)))
        .collect();
    Entity::DeliverableUnit(unit)
}

pub fn file(id: &str) -> Entity {
    Entity::File(File::new(id))
}

pub fn manifestation(id: &str, deliverable_unit: &str, files: &[&str]) -> Entity {
    let mut m = Manifestation::new(id, deliverable_unit);
    m.files = files
        .iter()
        .map(|f| Some(ManifestationFile::new(*f)))
        .collect();
    Entity::Manifestation(m)
}

pub fn event(id: &str, event_type: &str, date: chrono::DateTime<chrono::Utc>, targets: &[&str]) -> Entity {
    let mut e = Event::new(id);
    e.event_type = Some(event_type.to_string());
    e.date = Some(date);
    e.outcome = Some(format!("{event_type} ok"));
    e.detail = Some(format!("{event_type} detail"));
    e.targets = targets.iter().map(|t| EntityRef::new(*t)).collect();
    Entity::Event(e)
}

/// Engine wrapper that records the order of driver calls, for asserting
/// flush/commit sequencing.
pub struct RecordingEngine {
    inner: MemoryEngine,
    ops: Mutex<Vec<String>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            inner: MemoryEngine::new(),
            ops: Mutex::new(Vec::new()),
        }
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().clone()
    }

    fn record(&self, op: &str) {
        self.ops.lock().push(op.to_string());
    }
}

impl SearchEngine for RecordingEngine {
    fn add_batch(&self, documents: &[Document]) -> Result<()> {
        self.record(&format!("add_batch:{}", documents.len()));
        self.inner.add_batch(documents)
    }

    fn commit(&self) -> Result<()> {
        self.record("commit");
        self.inner.commit()
    }

    fn optimize(&self) -> Result<()> {
        self.record("optimize");
        self.inner.optimize()
    }

    fn delete_by_id(&self, id: &str) -> Result<()> {
        self.record("delete_by_id");
        self.inner.delete_by_id(id)
    }

    fn delete_all(&self) -> Result<()> {
        self.record("delete_all");
        self.inner.delete_all()
    }

    fn query(&self, request: &SearchRequest) -> Result<EngineResponse> {
        self.inner.query(request)
    }
}
