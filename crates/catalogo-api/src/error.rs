//! ---
//! cat_section: "05-networking-external-interfaces"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "HTTP surface for the project catalogue."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use catalogo_core::ServiceError;
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Error returned by every handler, rendered as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

/// Map a service failure, using `context` as the opaque message for store
/// errors. The store detail only goes to the log.
pub fn service_error(context: &'static str) -> impl FnOnce(ServiceError) -> ApiError {
    move |err| match err {
        ServiceError::Validation(message) => ApiError::bad_request(message),
        ServiceError::NotFound(id) => {
            ApiError::new(StatusCode::NOT_FOUND, format!("Proyecto {id} no encontrado"))
        }
        ServiceError::Store(source) => {
            error!(error = %source, context, "store operation failed");
            ApiError::internal(context)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalogo_store::StoreError;

    #[test]
    fn store_failures_are_opaque() {
        let err = service_error("Error leyendo proyectos")(ServiceError::Store(
            StoreError::Unavailable("connection refused to 10.0.0.4".into()),
        ));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Error leyendo proyectos");
    }

    #[test]
    fn service_errors_keep_their_status() {
        let validation = service_error("ctx")(ServiceError::Validation("Faltan campos".into()));
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.message(), "Faltan campos");

        let missing = service_error("ctx")(ServiceError::NotFound("abc".into()));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
