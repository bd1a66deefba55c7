//! ---
//! cat_section: "06-security-access-control"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Admin password verification and cookie sessions."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::{AuthError, Result};

/// The single admin password, held as an Argon2 PHC string.
#[derive(Debug, Clone)]
pub struct AdminCredential {
    phc: Arc<str>,
}

impl AdminCredential {
    /// Parse and keep a PHC string such as `$argon2id$v=19$...`.
    pub fn parse(phc: &str) -> Result<Self> {
        PasswordHash::new(phc).map_err(|err| AuthError::InvalidHash(err.to_string()))?;
        Ok(Self { phc: phc.into() })
    }

    /// Check `password` against the stored hash on the blocking pool.
    ///
    /// The comparison itself is constant-time; a mismatch is `Ok(false)`.
    pub async fn verify(&self, password: String) -> Result<bool> {
        let phc = self.phc.clone();
        tokio::task::spawn_blocking(move || -> Result<bool> {
            let parsed =
                PasswordHash::new(&phc).map_err(|err| AuthError::InvalidHash(err.to_string()))?;
            Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok())
        })
        .await?
    }
}

/// Produce an Argon2id PHC string for `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Hashing(err.to_string()))
}
