use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::courier::{Courier, CourierStatus};
use crate::models::dispatch_log::DispatchLogEntry;
use crate::models::tags::TagSet;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/couriers", post(create_courier).get(list_couriers))
        .route("/couriers/:id", get(get_courier))
        .route("/couriers/:id/status", patch(update_courier_status))
        .route("/couriers/:id/location", patch(update_courier_location))
        .route("/couriers/:id/dispatch-logs", get(courier_dispatch_logs))
}

#[derive(Deserialize)]
pub struct CreateCourierRequest {
    pub name: String,
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub tags: TagSet,
    pub status: Option<CourierStatus>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: CourierStatus,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoPoint,
}

async fn create_courier(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCourierRequest>,
) -> Result<Json<Courier>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    if let Some(location) = &payload.location {
        location.validate()?;
    }

    let status = payload.status.unwrap_or(CourierStatus::Offline);
    if status == CourierStatus::Busy {
        return Err(AppError::BadRequest(
            "a courier cannot register as busy".to_string(),
        ));
    }

    let mut courier = Courier::new(payload.name.trim(), payload.location, payload.tags);
    courier.status = status;

    Ok(Json(state.store.insert_courier(courier)))
}

async fn list_couriers(State(state): State<Arc<AppState>>) -> Json<Vec<Courier>> {
    Json(state.store.list_couriers())
}

async fn get_courier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Courier>, AppError> {
    Ok(Json(state.store.get_courier(id)?))
}

async fn update_courier_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Courier>, AppError> {
    Ok(Json(state.store.update_courier_status(id, payload.status)?))
}

async fn update_courier_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Courier>, AppError> {
    payload.location.validate()?;
    Ok(Json(state.store.update_courier_location(id, payload.location)?))
}

async fn courier_dispatch_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DispatchLogEntry>>, AppError> {
    state.store.get_courier(id)?;
    Ok(Json(state.store.dispatch_logs_for_courier(id)))
}
