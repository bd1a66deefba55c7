//! ---
//! cat_section: "01-core-functionality"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Shared primitives and utilities for the Catalogo services."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_api_listen() -> SocketAddr {
    "0.0.0.0:3000".parse().expect("valid default api address")
}

fn default_static_dir() -> Option<PathBuf> {
    Some(PathBuf::from("public"))
}

fn default_cookie_name() -> String {
    "catalogo_session".to_owned()
}

fn default_session_ttl() -> Duration {
    Duration::from_secs(8 * 60 * 60)
}

fn default_firestore_database() -> String {
    "(default)".to_owned()
}

fn default_firestore_collection() -> String {
    "projects".to_owned()
}

fn default_firestore_base_url() -> String {
    "https://firestore.googleapis.com".to_owned()
}

fn default_firestore_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_metrics_enabled() -> bool {
    true
}

/// Primary configuration object for the Catalogo daemon.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &'static str = "CATALOGO_CONFIG";
    pub const ENV_PORT: &'static str = "PORT";
    pub const ENV_ADMIN_PASSWORD_HASH: &'static str = "CATALOGO_ADMIN_PASSWORD_HASH";
    pub const ENV_SESSION_SECRET: &'static str = "CATALOGO_SESSION_SECRET";
    pub const ENV_FIRESTORE_TOKEN: &'static str = "CATALOGO_FIRESTORE_TOKEN";
    pub const ENV_FIRESTORE_EMULATOR: &'static str = "FIRESTORE_EMULATOR_HOST";
    pub const ENV_SERVICE_ACCOUNT: &'static str = "FIREBASE_SERVICE_ACCOUNT";
    pub const ENV_CREDENTIALS_FILE: &'static str = "GOOGLE_APPLICATION_CREDENTIALS";

    /// Load configuration from disk, respecting the `CATALOGO_CONFIG` override,
    /// together with the effective source path.
    ///
    /// Environment overrides are applied after parsing and before validation,
    /// so secrets may be left out of the file entirely.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let mut config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply deployment overrides looked up through `lookup`.
    ///
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(port) = value(Self::ENV_PORT).and_then(|raw| raw.trim().parse::<u16>().ok())
        {
            self.api.listen.set_port(port);
        }
        if let Some(hash) = value(Self::ENV_ADMIN_PASSWORD_HASH) {
            self.auth.admin_password_hash = hash.trim().to_owned();
        }
        if let Some(secret) = value(Self::ENV_SESSION_SECRET) {
            self.session.secret = Some(secret);
        }
        if let Some(token) = value(Self::ENV_FIRESTORE_TOKEN) {
            self.store.firestore.token = Some(token);
        }
        if let Some(key) = value(Self::ENV_SERVICE_ACCOUNT) {
            self.store.firestore.service_account = Some(key);
        }
        if self.store.firestore.credentials_file.is_none() {
            if let Some(path) = value(Self::ENV_CREDENTIALS_FILE) {
                self.store.firestore.credentials_file = Some(PathBuf::from(path.trim()));
            }
        }
        if let Some(host) = value(Self::ENV_FIRESTORE_EMULATOR) {
            self.store.firestore.base_url = format!("http://{}", host.trim());
            if self.store.firestore.token.is_none() {
                self.store.firestore.token = Some("owner".to_owned());
            }
        }
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.auth.validate()?;
        self.session.validate()?;
        self.store.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_listen")]
    pub listen: SocketAddr,
    #[serde(default = "default_static_dir")]
    pub static_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: default_api_listen(),
            static_dir: default_static_dir(),
        }
    }
}

/// Credentials guarding the admin session.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Argon2 PHC string for the shared admin password.
    #[serde(default)]
    pub admin_password_hash: String,
}

impl AuthConfig {
    pub fn validate(&self) -> Result<()> {
        let hash = self.admin_password_hash.trim();
        if hash.is_empty() {
            return Err(anyhow!(
                "auth.admin_password_hash must be set (see `catalogod hash-password`)"
            ));
        }
        if !hash.starts_with('$') {
            return Err(anyhow!(
                "auth.admin_password_hash must be a PHC formatted hash string"
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSitePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSitePolicy::Strict => "Strict",
            SameSitePolicy::Lax => "Lax",
            SameSitePolicy::None => "None",
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Signing secret for session cookies. A random key is generated at startup when absent.
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_session_ttl")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub ttl: Duration,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: SameSitePolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: None,
            cookie_name: default_cookie_name(),
            ttl: default_session_ttl(),
            secure: false,
            same_site: SameSitePolicy::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cookie_name.is_empty()
            || !self
                .cookie_name
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
        {
            return Err(anyhow!(
                "session.cookie_name '{}' is not a valid cookie name",
                self.cookie_name
            ));
        }
        if self.ttl.is_zero() {
            return Err(anyhow!("session.ttl must be greater than zero"));
        }
        if matches!(self.same_site, SameSitePolicy::None) && !self.secure {
            return Err(anyhow!("session.same_site = \"none\" requires session.secure = true"));
        }
        if let Some(secret) = &self.secret {
            if secret.len() < 16 {
                return Err(anyhow!("session.secret must be at least 16 bytes long"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Firestore,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub firestore: FirestoreConfig,
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if matches!(self.backend, StoreBackend::Firestore) {
            self.firestore.validate()?;
        }
        Ok(())
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirestoreConfig {
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_firestore_database")]
    pub database: String,
    #[serde(default = "default_firestore_collection")]
    pub collection: String,
    #[serde(default = "default_firestore_base_url")]
    pub base_url: String,
    /// Static OAuth bearer token; takes precedence over a service account.
    #[serde(default)]
    pub token: Option<String>,
    /// Path to a Google service-account key file.
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
    /// Inline service-account key JSON, usually injected through the
    /// environment. Preferred over `credentials_file` when both are set.
    #[serde(default)]
    pub service_account: Option<String>,
    #[serde(default = "default_firestore_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            database: default_firestore_database(),
            collection: default_firestore_collection(),
            base_url: default_firestore_base_url(),
            token: None,
            credentials_file: None,
            service_account: None,
            timeout: default_firestore_timeout(),
        }
    }
}

impl FirestoreConfig {
    /// True when a service-account key is configured, inline or on disk.
    pub fn has_service_account(&self) -> bool {
        self.service_account.is_some() || self.credentials_file.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        // The project id may come from the service-account key instead.
        if self.project_id.trim().is_empty() && !self.has_service_account() {
            return Err(anyhow!(
                "store.firestore.project_id must be set when no service account is configured"
            ));
        }
        if self.collection.trim().is_empty() || self.collection.contains('/') {
            return Err(anyhow!(
                "store.firestore.collection '{}' must be a top-level collection id",
                self.collection
            ));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(anyhow!(
                "store.firestore.base_url '{}' must be an http(s) URL",
                self.base_url
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}
