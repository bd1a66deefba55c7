//! ---
//! cat_section: "05-networking-external-interfaces"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "HTTP surface for the project catalogue."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use catalogo_core::{CreateProject, Direction, UpdateProject};
use catalogo_store::ProjectRecord;
use serde::{Deserialize, Serialize};

use crate::auth::AdminSession;
use crate::error::{service_error, ApiError};
use crate::{Ack, ApiState};

#[derive(Debug, Deserialize)]
pub(crate) struct MoveRequest {
    direction: Direction,
}

#[derive(Debug, Serialize)]
pub(crate) struct MoveAck {
    ok: bool,
    moved: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResequenceAck {
    ok: bool,
    updated: usize,
}

pub(crate) async fn list(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<ProjectRecord>>, ApiError> {
    state
        .projects
        .list()
        .await
        .map(Json)
        .map_err(service_error("Error leyendo proyectos"))
}

pub(crate) async fn create(
    _admin: AdminSession,
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<CreateProject>, JsonRejection>,
) -> Result<Json<ProjectRecord>, ApiError> {
    let Json(input) = payload?;
    state
        .projects
        .create(input)
        .await
        .map(Json)
        .map_err(service_error("Error creando proyecto"))
}

pub(crate) async fn update(
    _admin: AdminSession,
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProject>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let Json(input) = payload?;
    state
        .projects
        .update(&id, input)
        .await
        .map_err(service_error("Error actualizando proyecto"))?;
    Ok(Json(Ack::OK))
}

pub(crate) async fn remove(
    _admin: AdminSession,
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    state
        .projects
        .delete(&id)
        .await
        .map_err(service_error("Error borrando proyecto"))?;
    Ok(Json(Ack::OK))
}

pub(crate) async fn move_adjacent(
    _admin: AdminSession,
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<MoveAck>, ApiError> {
    let Json(request) = payload?;
    let moved = state
        .projects
        .swap_adjacent(&id, request.direction)
        .await
        .map_err(service_error("Error moviendo proyecto"))?;
    Ok(Json(MoveAck { ok: true, moved }))
}

pub(crate) async fn resequence(
    _admin: AdminSession,
    State(state): State<Arc<ApiState>>,
) -> Result<Json<ResequenceAck>, ApiError> {
    let updated = state
        .projects
        .resequence()
        .await
        .map_err(service_error("Error reordenando proyectos"))?;
    Ok(Json(ResequenceAck { ok: true, updated }))
}
