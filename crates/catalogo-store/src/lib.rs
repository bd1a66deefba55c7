//! ---
//! cat_section: "02-storage"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Document store abstractions and backend bindings."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Document store abstraction for the project collection.
//!
//! The store is the single source of truth for project records. Multi-record
//! mutations go through [`WriteBatch`], which every backend commits
//! all-or-nothing.

use std::sync::Arc;

use async_trait::async_trait;
use catalogo_common::config::{StoreBackend, StoreConfig};
use tracing::info;

mod credentials;
pub mod firestore;
pub mod memory;
pub mod record;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use record::{NewProject, ProjectPatch, ProjectRecord, WriteBatch, WriteOp};

/// Result alias used throughout the store crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error type for the document store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A write or lookup referenced a document that does not exist.
    #[error("document not found: {0}")]
    Missing(String),
    /// Transport failure talking to the remote store.
    #[error("store transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The remote store rejected the request.
    #[error("store responded with status {status}: {message}")]
    Remote {
        /// HTTP status code returned by the store.
        status: u16,
        /// Message extracted from the error payload.
        message: String,
    },
    /// A stored document could not be decoded into a project.
    #[error("malformed document: {0}")]
    Malformed(String),
    /// Wrapper for JSON serialization issues.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// The backend is configured incorrectly.
    #[error("invalid store configuration: {0}")]
    Config(String),
    /// Service-account credentials could not be loaded or exchanged.
    #[error("store credentials error: {0}")]
    Credentials(String),
    /// The backend is temporarily unable to serve requests.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence contract for the project collection.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Short backend identifier for diagnostics.
    fn backend(&self) -> &'static str;

    /// Read every project record, in no particular order.
    async fn list(&self) -> Result<Vec<ProjectRecord>>;

    /// Read a single record, returning `None` when it does not exist.
    async fn get(&self, id: &str) -> Result<Option<ProjectRecord>>;

    /// Count every record in the collection.
    async fn count(&self) -> Result<usize>;

    /// Persist a new record and return it with its store-assigned identifier.
    async fn insert(&self, project: NewProject) -> Result<ProjectRecord>;

    /// Apply every write in `batch` atomically. Updates and deletes require the
    /// target document to exist; if any write fails nothing is applied.
    async fn commit(&self, batch: WriteBatch) -> Result<()>;
}

/// Shared handle to a document store.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Build the backend selected by configuration.
pub fn open_store(config: &StoreConfig) -> Result<SharedStore> {
    let store: SharedStore = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Firestore => Arc::new(FirestoreStore::from_config(&config.firestore)?),
    };
    info!(backend = store.backend(), "document store opened");
    Ok(store)
}
