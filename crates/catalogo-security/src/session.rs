//! ---
//! cat_section: "06-security-access-control"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Admin password verification and cookie sessions."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
//! Server-held admin sessions addressed by a signed cookie.
//!
//! Cookie values have the form `<id>.<mac>` where `id` is 32 random bytes in
//! URL-safe base64 and `mac` is the hex HMAC-SHA256 of `id` under the
//! process signing key. Only the signed id travels to the browser; the
//! session state stays in memory.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use catalogo_common::config::{SameSitePolicy, SessionConfig};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use parking_lot::RwLock;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::{AuthError, Result};

type HmacSha256 = Hmac<Sha256>;

/// HMAC key used to sign session identifiers.
#[derive(Clone)]
pub struct SigningKey {
    mac: HmacSha256,
    fingerprint: String,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

impl SigningKey {
    /// Derive a key from a configured secret.
    pub fn from_secret(secret: &[u8]) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|err| AuthError::SigningKey(err.to_string()))?;
        let fingerprint = hex::encode(Sha256::digest(secret))[..16].to_string();
        Ok(Self { mac, fingerprint })
    }

    /// Generate an ephemeral random key. Sessions signed with it do not
    /// survive a restart.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::from_secret(&bytes)
    }

    /// Short SHA-256 fingerprint for logs.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn sign(&self, id: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn verify(&self, id: &str, signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}

/// State attached to a live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Whether the holder passed the admin login.
    pub is_admin: bool,
    /// The session is rejected from this instant on.
    pub expires_at: DateTime<Utc>,
}

/// In-memory session table plus the cookie attributes used to address it.
#[derive(Debug, Clone)]
pub struct SessionStore {
    key: SigningKey,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    cookie_name: String,
    ttl: Duration,
    secure: bool,
    same_site: SameSitePolicy,
}

impl SessionStore {
    /// Build a store from configuration. Without a configured secret an
    /// ephemeral key is generated.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        let key = match config.secret.as_deref() {
            Some(secret) => SigningKey::from_secret(secret.as_bytes())?,
            None => {
                let key = SigningKey::generate()?;
                warn!(
                    fingerprint = key.fingerprint(),
                    "no session secret configured; sessions will not survive a restart"
                );
                key
            }
        };
        Self::new(key, config)
    }

    /// Build a store around an explicit signing key.
    pub fn new(key: SigningKey, config: &SessionConfig) -> Result<Self> {
        chrono::Duration::from_std(config.ttl)
            .map_err(|err| AuthError::Config(format!("session ttl out of range: {err}")))?;
        Ok(Self {
            key,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            cookie_name: config.cookie_name.clone(),
            ttl: config.ttl,
            secure: config.secure,
            same_site: config.same_site,
        })
    }

    /// Name of the session cookie.
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Number of sessions currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// True when no sessions are held.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Open a fresh admin session and return its signed cookie value.
    pub fn issue(&self) -> String {
        self.issue_at(Utc::now())
    }

    fn issue_at(&self, now: DateTime<Utc>) -> String {
        self.purge_expired_at(now);

        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let id = URL_SAFE_NO_PAD.encode(bytes);
        let session = Session {
            is_admin: true,
            expires_at: now + self.chrono_ttl(),
        };
        self.sessions.write().insert(id.clone(), session);
        format!("{id}.{}", self.key.sign(&id))
    }

    /// Look up the session behind a cookie value. Forged, unknown, and expired
    /// values resolve to `None`; expired entries are dropped on the way.
    pub fn resolve(&self, value: &str) -> Option<Session> {
        self.resolve_at(value, Utc::now())
    }

    fn resolve_at(&self, value: &str, now: DateTime<Utc>) -> Option<Session> {
        let id = self.verified_id(value)?;
        let session = self.sessions.read().get(id).cloned()?;
        if session.expires_at <= now {
            self.sessions.write().remove(id);
            debug!("expired session rejected");
            return None;
        }
        Some(session)
    }

    /// True when `value` addresses a live admin session.
    pub fn is_admin(&self, value: &str) -> bool {
        self.resolve(value).is_some_and(|session| session.is_admin)
    }

    /// Destroy the session behind `value`, if any.
    pub fn revoke(&self, value: &str) -> bool {
        match self.verified_id(value) {
            Some(id) => self.sessions.write().remove(id).is_some(),
            None => false,
        }
    }

    /// Drop every expired session, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        before - sessions.len()
    }

    /// `Set-Cookie` value that installs `value` in the browser.
    pub fn set_cookie(&self, value: &str) -> String {
        self.cookie_header(value, self.ttl.as_secs())
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn clear_cookie(&self) -> String {
        self.cookie_header("", 0)
    }

    fn cookie_header(&self, value: &str, max_age: u64) -> String {
        let mut header = format!(
            "{}={value}; Path=/; HttpOnly; SameSite={}; Max-Age={max_age}",
            self.cookie_name,
            self.same_site.as_str()
        );
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }

    fn verified_id<'a>(&self, value: &'a str) -> Option<&'a str> {
        let (id, signature) = value.split_once('.')?;
        self.key.verify(id, signature).then_some(id)
    }

    fn chrono_ttl(&self) -> chrono::Duration {
        // Range checked in `new`.
        chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero())
    }
}

/// Extract the value of cookie `name` from a `Cookie` request header.
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
