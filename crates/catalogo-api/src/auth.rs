//! ---
//! cat_section: "05-networking-external-interfaces"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "HTTP surface for the project catalogue."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
//! Admin login, logout, and the session gate for mutating routes.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use catalogo_security::find_cookie;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::ApiError;
use crate::{Ack, ApiState};

/// Proof that the request carries a live admin session.
///
/// Declared before any body extractor, so unauthenticated requests are
/// rejected before their payload is read.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let authorised = session_cookie(&parts.headers, state.sessions.cookie_name())
            .is_some_and(|value| state.sessions.is_admin(&value));
        if authorised {
            return Ok(AdminSession);
        }
        if let Some(metrics) = &state.security {
            metrics.inc_auth_denial();
        }
        debug!(method = %parts.method, path = %parts.uri.path(), "admin session required");
        Err(ApiError::unauthorized("No autorizado"))
    }
}

fn session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| find_cookie(header, name))
        .map(str::to_owned)
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionStatus {
    is_admin: bool,
}

pub(crate) async fn login(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let password = request
        .password
        .filter(|password| !password.is_empty())
        .ok_or_else(|| ApiError::bad_request("Falta contraseña"))?;

    if let Some(metrics) = &state.security {
        metrics.inc_auth_attempt();
    }
    let verified = state.credential.verify(password).await.map_err(|err| {
        error!(error = %err, "admin password verification failed");
        ApiError::internal("Error en login")
    })?;
    if !verified {
        if let Some(metrics) = &state.security {
            metrics.inc_auth_failure();
        }
        warn!("admin login rejected");
        return Err(ApiError::unauthorized("Contraseña incorrecta"));
    }

    if let Some(previous) = session_cookie(&headers, state.sessions.cookie_name()) {
        state.sessions.revoke(&previous);
    }
    let value = state.sessions.issue();
    info!(active_sessions = state.sessions.len(), "admin login accepted");
    Ok((
        [(SET_COOKIE, state.sessions.set_cookie(&value))],
        Json(Ack::OK),
    )
        .into_response())
}

pub(crate) async fn logout(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    if let Some(value) = session_cookie(&headers, state.sessions.cookie_name()) {
        if state.sessions.revoke(&value) {
            info!("admin session closed");
        }
    }
    (
        [(SET_COOKIE, state.sessions.clear_cookie())],
        Json(Ack::OK),
    )
        .into_response()
}

pub(crate) async fn session_status(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Json<SessionStatus> {
    let is_admin = session_cookie(&headers, state.sessions.cookie_name())
        .is_some_and(|value| state.sessions.is_admin(&value));
    Json(SessionStatus { is_admin })
}
