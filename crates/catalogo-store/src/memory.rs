//! ---
//! cat_section: "02-storage"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Document store abstractions and backend bindings."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::record::{NewProject, ProjectRecord, WriteBatch, WriteOp};
use crate::{DocumentStore, Result, StoreError};

/// In-process store used for development and tests.
///
/// Commits are staged against a copy of the collection and only swapped in
/// once every write has succeeded.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    documents: Arc<RwLock<BTreeMap<String, ProjectRecord>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `records`, keyed by their identifiers.
    pub fn with_records(records: impl IntoIterator<Item = ProjectRecord>) -> Self {
        let store = Self::new();
        {
            let mut documents = store.documents.write();
            for record in records {
                documents.insert(record.id.clone(), record);
            }
        }
        store
    }

    /// Simulate an outage: every subsequent call fails with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Copy of every stored record, keyed by identifier.
    pub fn snapshot(&self) -> BTreeMap<String, ProjectRecord> {
        self.documents.read().clone()
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> Result<Vec<ProjectRecord>> {
        self.ensure_available()?;
        Ok(self.documents.read().values().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<ProjectRecord>> {
        self.ensure_available()?;
        Ok(self.documents.read().get(id).cloned())
    }

    async fn count(&self) -> Result<usize> {
        self.ensure_available()?;
        Ok(self.documents.read().len())
    }

    async fn insert(&self, project: NewProject) -> Result<ProjectRecord> {
        self.ensure_available()?;
        let record = ProjectRecord {
            id: Uuid::new_v4().simple().to_string(),
            nombre: project.nombre,
            codigo: project.codigo,
            descripcion: project.descripcion,
            orden: Some(project.orden),
        };
        self.documents
            .write()
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.ensure_available()?;
        let mut documents = self.documents.write();
        let mut staged = documents.clone();
        let writes = batch.len();
        for write in batch.into_writes() {
            match write {
                WriteOp::Update { id, patch } => {
                    let record = staged.get_mut(&id).ok_or(StoreError::Missing(id))?;
                    record.apply(&patch);
                }
                WriteOp::Delete { id } => {
                    staged.remove(&id).ok_or(StoreError::Missing(id))?;
                }
            }
        }
        *documents = staged;
        debug!(writes, "memory batch committed");
        Ok(())
    }
}
