//! ---
//! cat_section: "05-networking-external-interfaces"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "HTTP surface for the project catalogue."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---

use std::fmt;
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, get_service, post, put};
use axum::Router;
use catalogo_common::config::AppConfig;
use catalogo_core::{OrderingMetrics, ProjectService};
use catalogo_security::{AdminCredential, SecurityMetrics, SessionStore};
use catalogo_store::SharedStore;
use prometheus::{Registry, TextEncoder, TEXT_FORMAT};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

mod auth;
mod error;
mod projects;

pub use auth::AdminSession;
pub use error::ApiError;

/// Shared API state exposed to handlers.
pub struct ApiState {
    projects: ProjectService,
    credential: AdminCredential,
    sessions: SessionStore,
    security: Option<SecurityMetrics>,
    registry: Option<Arc<Registry>>,
}

impl ApiState {
    pub fn new(
        projects: ProjectService,
        credential: AdminCredential,
        sessions: SessionStore,
    ) -> Self {
        Self {
            projects,
            credential,
            sessions,
            security: None,
            registry: None,
        }
    }

    /// Expose `registry` at `/metrics` and count login outcomes into it.
    pub fn with_metrics(mut self, registry: Arc<Registry>, security: SecurityMetrics) -> Self {
        self.registry = Some(registry);
        self.security = Some(security);
        self
    }

    /// Wire the service, credential, and session store described by `config`
    /// around an already opened document store.
    pub fn from_config(config: &AppConfig, store: SharedStore) -> Result<Self> {
        let credential = AdminCredential::parse(&config.auth.admin_password_hash)
            .context("failed to load admin password hash")?;
        let sessions =
            SessionStore::from_config(&config.session).context("failed to build session store")?;
        let projects = ProjectService::new(store);

        if !config.metrics.enabled {
            return Ok(Self::new(projects, credential, sessions));
        }
        let registry = Arc::new(Registry::new());
        let ordering = OrderingMetrics::new(&registry)?;
        let security = SecurityMetrics::new(&registry)?;
        Ok(Self::new(projects.with_metrics(ordering), credential, sessions)
            .with_metrics(registry, security))
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

impl fmt::Debug for ApiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiState")
            .field("backend", &self.projects.store().backend())
            .field("sessions", &self.sessions.len())
            .field("metrics", &self.registry.is_some())
            .finish_non_exhaustive()
    }
}

/// Handle to the running API server.
#[derive(Debug)]
pub struct ApiServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl ApiServer {
    /// Address the listener is actually bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.task.await {
            Ok(result) => result,
            Err(err) => Err(err.into()),
        }
    }
}

/// Build the application router with optional static asset hosting.
pub fn router(state: Arc<ApiState>, static_dir: Option<PathBuf>) -> Router {
    let api_routes = Router::new()
        .route("/api/projects", get(projects::list).post(projects::create))
        .route("/api/projects/resequence", post(projects::resequence))
        .route(
            "/api/projects/:id",
            put(projects::update).delete(projects::remove),
        )
        .route("/api/projects/:id/move", post(projects::move_adjacent))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/session", get(auth::session_status))
        .route("/healthz", get(healthz))
        .route("/metrics", get(get_metrics))
        .with_state(state);

    if let Some(dir) = static_dir {
        let service = get_service(ServeDir::new(dir).append_index_html_on_directories(true));
        api_routes
            .fallback_service(service)
            .layer(TraceLayer::new_for_http())
    } else {
        api_routes.layer(TraceLayer::new_for_http())
    }
}

/// Spawn the REST API with optional static asset hosting.
pub fn spawn_api_server(
    state: Arc<ApiState>,
    addr: SocketAddr,
    static_dir: Option<PathBuf>,
) -> Result<ApiServer> {
    let router = router(state, static_dir);

    let listener = StdTcpListener::bind(addr)
        .with_context(|| format!("failed to bind API listener {addr}"))?;
    listener
        .set_nonblocking(true)
        .context("failed to configure API listener as non-blocking")?;
    let addr = listener
        .local_addr()
        .context("failed to read API listener address")?;
    let tcp_listener =
        TcpListener::from_std(listener).context("failed to create tokio listener")?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle: JoinHandle<Result<()>> = tokio::spawn(async move {
        info!(address = %addr, "api server listening");
        if let Err(err) = axum::serve(tcp_listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
        {
            error!(address = %addr, error = %err, "api server exited with error");
            return Err(err.into());
        }
        Ok(())
    });

    Ok(ApiServer {
        addr,
        shutdown: Some(shutdown_tx),
        task: handle,
    })
}

#[derive(Debug, Serialize)]
pub(crate) struct Ack {
    ok: bool,
}

impl Ack {
    pub(crate) const OK: Ack = Ack { ok: true };
}

async fn healthz() -> &'static str {
    "ok"
}

async fn get_metrics(State(state): State<Arc<ApiState>>) -> Response {
    let Some(registry) = &state.registry else {
        return (StatusCode::SERVICE_UNAVAILABLE, "metrics disabled").into_response();
    };

    let encoder = TextEncoder::new();
    let families = registry.gather();
    match encoder.encode_to_string(&families) {
        Ok(body) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static(TEXT_FORMAT),
            )],
            body,
        )
            .into_response(),
        Err(err) => {
            warn!(error = %err, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
