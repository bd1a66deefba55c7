//! ---
//! cat_section: "02-storage"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Document store abstractions and backend bindings."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
//! Google service-account authentication for the Firestore backend.
//!
//! An RS256 assertion signed with the account's private key is exchanged at
//! the key's `token_uri` for a short-lived access token (the OAuth 2.0 JWT
//! bearer grant). Tokens are cached and refreshed shortly before they expire.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{Result, StoreError};

const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_owned()
}

/// The fields of a service-account key file this backend needs.
#[derive(Clone, Deserialize)]
pub(crate) struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("project_id", &self.project_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|err| StoreError::Credentials(format!("service account key: {err}")))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            StoreError::Credentials(format!("reading {}: {err}", path.display()))
        })?;
        Self::from_json(&raw)
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Access tokens minted from a service-account key.
pub(crate) struct ServiceAccountTokens {
    client: Client,
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for ServiceAccountTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountTokens")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountTokens {
    pub fn new(client: Client, key: ServiceAccountKey) -> Result<Self> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|err| StoreError::Credentials(format!("private_key: {err}")))?;
        Ok(Self {
            client,
            key,
            signing_key,
            cached: Mutex::new(None),
        })
    }

    pub fn project_id(&self) -> Option<&str> {
        self.key.project_id.as_deref()
    }

    /// A token valid for at least the refresh margin. Concurrent callers wait
    /// on a single exchange.
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref() {
            if token.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now {
                return Ok(token.value.clone());
            }
        }
        let fresh = self.exchange(now).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    /// Drop the cached token, forcing the next call to exchange again.
    pub async fn invalidate(&self) {
        self.cached.lock().await.take();
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        encode(&header, &claims, &self.signing_key)
            .map_err(|err| StoreError::Credentials(format!("signing assertion: {err}")))
    }

    async fn exchange(&self, now: DateTime<Utc>) -> Result<CachedToken> {
        let assertion = self.assertion(now)?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "service account token exchange rejected");
            return Err(StoreError::Credentials(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }
        let token: TokenResponse = response.json().await?;
        debug!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "service account token refreshed"
        );
        Ok(CachedToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}

/// Key JSON for the RSA key under `testdata/`, exchanging at `token_uri`.
#[cfg(test)]
pub(crate) fn test_key_json(token_uri: &str) -> String {
    serde_json::json!({
        "type": "service_account",
        "project_id": "demo",
        "private_key_id": "k1",
        "private_key": include_str!("../testdata/service-account-key.pem"),
        "client_email": "catalogo@demo.iam.gserviceaccount.com",
        "token_uri": token_uri,
    })
    .to_string()
}
