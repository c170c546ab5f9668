use std::time::Instant;

use tracing::info;
use uuid::Uuid;

use crate::engine::assignment::{self, Assignment};
use crate::engine::matcher::ensure_dispatchable;
use crate::error::DispatchError;
use crate::models::courier::CourierStatus;
use crate::models::dispatch_log::DispatchAction;
use crate::state::AppState;

/// Operator override: assigns a specific courier, skipping distance and
/// ranking. Checks run in order and stop at the first failure; the commit
/// re-checks availability under lock.
pub fn manual_dispatch(
    state: &AppState,
    order_id: Uuid,
    courier_id: Uuid,
) -> Result<Assignment, DispatchError> {
    let start = Instant::now();
    let result = run_manual_dispatch(state, order_id, courier_id);

    let outcome = match &result {
        Ok(_) => "success",
        Err(err) => err.kind(),
    };
    state
        .metrics
        .record_dispatch("manual", outcome, start.elapsed().as_secs_f64());

    result
}

fn run_manual_dispatch(
    state: &AppState,
    order_id: Uuid,
    courier_id: Uuid,
) -> Result<Assignment, DispatchError> {
    let order = state.store.get_order(order_id).map_err(|_| {
        DispatchError::InvalidState(format!("order {order_id} not found or not dispatchable"))
    })?;
    ensure_dispatchable(&order)?;

    let courier = state.store.get_courier(courier_id)?;

    if courier.status != CourierStatus::Available {
        return Err(DispatchError::CourierUnavailable(courier_id));
    }

    if !order.required_tags.is_empty() && !courier.tags.is_superset_of(&order.required_tags) {
        return Err(DispatchError::MissingCapability {
            courier_id,
            missing: courier
                .tags
                .missing_from(&order.required_tags)
                .into_iter()
                .map(str::to_string)
                .collect(),
        });
    }

    let assignment =
        assignment::commit(state, order_id, courier_id, DispatchAction::ManualAssigned)?;

    info!(
        order_id = %order_id,
        courier_id = %courier_id,
        "manual dispatch succeeded"
    );

    Ok(assignment)
}
