//! ---
//! cat_section: "01-core-functionality"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Project ordering service and re-sequencing rules."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
//! Project ordering service.
//!
//! [`ordering`] holds the pure planning rules that decide which records move
//! when one is inserted, moved, or removed; [`service::ProjectService`] reads
//! the collection, applies those rules, and commits the resulting writes as a
//! single atomic batch.

pub mod metrics;
pub mod ordering;
pub mod service;

use catalogo_store::StoreError;

pub use metrics::OrderingMetrics;
pub use ordering::{Direction, OrdenShift, MISSING_ORDEN};
pub use service::{CreateProject, ProjectService, UpdateProject};

/// Result alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors surfaced by the ordering service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A required field is missing or a value is out of range.
    #[error("{0}")]
    Validation(String),
    /// The identifier does not resolve to an existing project.
    #[error("project {0} not found")]
    NotFound(String),
    /// The document store failed.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
