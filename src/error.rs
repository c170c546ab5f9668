use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Expected outcomes of dispatch and lifecycle operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DispatchError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("courier {0} is not available")]
    CourierUnavailable(Uuid),

    #[error("courier {courier_id} lacks required tags: {}", .missing.join(", "))]
    MissingCapability {
        courier_id: Uuid,
        missing: Vec<String>,
    },

    #[error("no available courier found within the outer radius ({radius_km} km)")]
    NoCourierInRange { radius_km: f64 },
}

impl DispatchError {
    pub fn order_not_found(id: Uuid) -> Self {
        DispatchError::NotFound(format!("order {id} not found"))
    }

    pub fn courier_not_found(id: Uuid) -> Self {
        DispatchError::NotFound(format!("courier {id} not found"))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::NotFound(_) => "not_found",
            DispatchError::InvalidState(_) => "invalid_state",
            DispatchError::CourierUnavailable(_) => "courier_unavailable",
            DispatchError::MissingCapability { .. } => "missing_capability",
            DispatchError::NoCourierInRange { .. } => "no_courier_in_range",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::NotFound(_) => StatusCode::NOT_FOUND,
            DispatchError::InvalidState(_)
            | DispatchError::CourierUnavailable(_)
            | DispatchError::NoCourierInRange { .. } => StatusCode::CONFLICT,
            DispatchError::MissingCapability { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::NotFound(msg) => AppError::NotFound(msg),
            other => AppError::Conflict(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
