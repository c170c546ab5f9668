use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::lifecycle;
use crate::engine::matcher::available_couriers_for_order;
use crate::engine::ranking::CandidateView;
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::dispatch_log::DispatchLogEntry;
use crate::models::order::Order;
use crate::models::tags::TagSet;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/pickup", post(pickup_order))
        .route("/orders/:id/deliver", post(deliver_order))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/dispatch-logs", get(order_dispatch_logs))
        .route("/orders/:id/available-couriers", get(available_couriers))
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    #[serde(default)]
    pub is_vip: bool,
    #[serde(default)]
    pub required_tags: TagSet,
}

#[derive(Deserialize)]
pub struct AvailableCouriersQuery {
    pub radius_km: Option<f64>,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    payload.pickup.validate()?;
    payload.dropoff.validate()?;

    let order = Order::new(
        payload.pickup,
        payload.dropoff,
        payload.is_vip,
        payload.required_tags,
    );

    Ok(Json(state.store.insert_order(order)))
}

async fn list_orders(State(state): State<Arc<AppState>>) -> Json<Vec<Order>> {
    Json(state.store.list_orders())
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.store.get_order(id)?))
}

async fn pickup_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(lifecycle::pickup(&state, id)?))
}

async fn deliver_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(lifecycle::deliver(&state, id)?))
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(lifecycle::cancel(&state, id)?))
}

async fn order_dispatch_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DispatchLogEntry>>, AppError> {
    state.store.get_order(id)?;
    Ok(Json(state.store.dispatch_logs_for_order(id)))
}

async fn available_couriers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailableCouriersQuery>,
) -> Result<Json<Vec<CandidateView>>, AppError> {
    let radius_km = query.radius_km.unwrap_or(state.settings.phase1_radius_km);
    if !(radius_km.is_finite() && radius_km > 0.0) {
        return Err(AppError::BadRequest(format!(
            "radius_km must be positive, got {radius_km}"
        )));
    }

    Ok(Json(available_couriers_for_order(&state, id, radius_km)?))
}
