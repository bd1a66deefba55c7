//! ---
//! cat_section: "06-security-access-control"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Admin password verification and cookie sessions."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Admin gate primitives: password verification, signed sessions, and metrics.

pub mod metrics;
pub mod password;
pub mod session;

pub use metrics::SecurityMetrics;
pub use password::{hash_password, AdminCredential};
pub use session::{find_cookie, Session, SessionStore, SigningKey};

/// Result alias used throughout the security crate.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors returned by the security subsystem.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The configured admin hash is not a valid PHC string.
    #[error("invalid admin password hash: {0}")]
    InvalidHash(String),
    /// Hashing a new password failed.
    #[error("password hashing failed: {0}")]
    Hashing(String),
    /// The session signing key could not be initialised.
    #[error("invalid session signing key: {0}")]
    SigningKey(String),
    /// Session settings cannot be honoured.
    #[error("invalid session configuration: {0}")]
    Config(String),
    /// A blocking verification task panicked or was cancelled.
    #[error("password verification task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
