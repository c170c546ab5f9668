use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::models::courier::CourierStatus;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

/// ASSIGNED -> PICKED.
pub fn pickup(state: &AppState, order_id: Uuid) -> Result<Order, DispatchError> {
    transition(state, order_id, OrderStatus::Picked)
}

/// PICKED -> DELIVERED, releasing the courier.
pub fn deliver(state: &AppState, order_id: Uuid) -> Result<Order, DispatchError> {
    transition(state, order_id, OrderStatus::Delivered)
}

/// Any live state -> CANCELLED, releasing the courier if one is held.
pub fn cancel(state: &AppState, order_id: Uuid) -> Result<Order, DispatchError> {
    transition(state, order_id, OrderStatus::Cancelled)
}

fn transition(state: &AppState, order_id: Uuid, next: OrderStatus) -> Result<Order, DispatchError> {
    let (order, released) = {
        let mut order = state
            .store
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| DispatchError::order_not_found(order_id))?;

        if !order.status.can_transition_to(next) {
            return Err(DispatchError::InvalidState(format!(
                "order {order_id} cannot move from {} to {next}",
                order.status
            )));
        }

        let releases_courier = order.status.holds_courier() && !next.holds_courier();
        let released = if releases_courier {
            release_courier(state, &mut *order)
        } else {
            None
        };

        order.status = next;
        order.updated_at = Utc::now();
        (order.clone(), released)
    };

    state
        .metrics
        .lifecycle_transitions_total
        .with_label_values(&[next.as_str()])
        .inc();

    info!(
        order_id = %order_id,
        status = %next,
        released_courier = ?released,
        "order status changed"
    );

    Ok(order)
}

/// Frees the order's courier while the order entry is still held, keeping the
/// busy-iff-holding invariant intact for concurrent readers.
fn release_courier(state: &AppState, order: &mut Order) -> Option<Uuid> {
    let courier_id = order.courier_id.take()?;

    match state.store.couriers.get_mut(&courier_id) {
        Some(mut courier) if courier.status == CourierStatus::Busy => {
            courier.status = CourierStatus::Available;
            courier.updated_at = Utc::now();
            state.metrics.couriers_busy.dec();
        }
        Some(courier) => {
            warn!(
                order_id = %order.id,
                courier_id = %courier_id,
                status = %courier.status,
                "released courier was not busy"
            );
        }
        None => {
            warn!(
                order_id = %order.id,
                courier_id = %courier_id,
                "released courier no longer exists"
            );
        }
    }

    Some(courier_id)
}
