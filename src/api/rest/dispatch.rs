use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::manual::manual_dispatch;
use crate::engine::matcher::auto_dispatch;
use crate::engine::outcome::DispatchResult;
use crate::error::DispatchError;
use crate::models::dispatch_log::DispatchLogEntry;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dispatch/auto/:order_id", post(dispatch_auto))
        .route("/dispatch/manual", post(dispatch_manual))
        .route("/dispatch-logs", get(list_dispatch_logs))
}

#[derive(Deserialize)]
pub struct ManualDispatchRequest {
    pub order_id: Uuid,
    pub courier_id: Uuid,
}

async fn dispatch_auto(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Response {
    let result = auto_dispatch(&state, order_id);
    respond(
        DispatchResult::from_auto(order_id, &result),
        result.as_ref().err(),
    )
}

async fn dispatch_manual(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ManualDispatchRequest>,
) -> Response {
    let result = manual_dispatch(&state, payload.order_id, payload.courier_id);
    respond(
        DispatchResult::from_manual(payload.order_id, &result),
        result.as_ref().err(),
    )
}

async fn list_dispatch_logs(State(state): State<Arc<AppState>>) -> Json<Vec<DispatchLogEntry>> {
    Json(state.store.dispatch_logs())
}

fn respond(body: DispatchResult, err: Option<&DispatchError>) -> Response {
    let status = err.map_or(StatusCode::OK, DispatchError::status_code);
    (status, Json(body)).into_response()
}
