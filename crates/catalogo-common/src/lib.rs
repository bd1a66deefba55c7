//! ---
//! cat_section: "01-core-functionality"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Shared primitives and utilities for the Catalogo services."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
//! Shared primitives for the Catalogo workspace.
//! This crate exposes configuration loading and logging initialisation
//! consumed by the daemon and its libraries.

pub mod config;
pub mod logging;

pub use config::{
    ApiConfig, AppConfig, AuthConfig, FirestoreConfig, LoadedAppConfig, LoggingConfig,
    MetricsConfig, SameSitePolicy, SessionConfig, StoreBackend, StoreConfig,
};
pub use logging::{init_tracing, LogFormat};
