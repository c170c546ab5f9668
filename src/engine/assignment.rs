use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::models::courier::{Courier, CourierStatus};
use crate::models::dispatch_log::{DispatchAction, DispatchLogEntry};
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

/// A committed courier-to-order match.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub order: Order,
    pub courier: Courier,
    pub log: DispatchLogEntry,
}

/// Commits `courier_id` to `order_id` as one atomic unit.
///
/// Both entries stay locked (order first, then courier) from the re-check
/// through the writes and the audit append, so "available -> busy" succeeds
/// for exactly one concurrent caller per courier and an order never receives
/// two couriers. A failed re-check leaves every record untouched.
pub fn commit(
    state: &AppState,
    order_id: Uuid,
    courier_id: Uuid,
    action: DispatchAction,
) -> Result<Assignment, DispatchError> {
    let store = &state.store;

    let assignment = {
        let mut order = store
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| DispatchError::order_not_found(order_id))?;
        let mut courier = store
            .couriers
            .get_mut(&courier_id)
            .ok_or_else(|| DispatchError::courier_not_found(courier_id))?;

        if !order.status.is_dispatchable() {
            warn!(
                order_id = %order_id,
                courier_id = %courier_id,
                status = %order.status,
                "assignment aborted: order no longer dispatchable"
            );
            return Err(DispatchError::InvalidState(format!(
                "order {order_id} is {} and cannot be dispatched",
                order.status
            )));
        }

        if courier.status != CourierStatus::Available {
            warn!(
                order_id = %order_id,
                courier_id = %courier_id,
                status = %courier.status,
                "assignment aborted: courier no longer available"
            );
            return Err(DispatchError::CourierUnavailable(courier_id));
        }

        let now = Utc::now();

        order.courier_id = Some(courier_id);
        order.status = OrderStatus::Assigned;
        order.updated_at = now;

        courier.status = CourierStatus::Busy;
        courier.updated_at = now;

        let log = store.create_dispatch_log(order_id, Some(courier_id), action);

        Assignment {
            order: order.clone(),
            courier: courier.clone(),
            log,
        }
    };

    state.metrics.couriers_busy.inc();
    state.publish(&assignment.log);

    info!(
        order_id = %order_id,
        courier_id = %courier_id,
        action = %action,
        "order assigned"
    );

    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;

    use super::commit;
    use crate::config::DispatchSettings;
    use crate::error::DispatchError;
    use crate::geo::GeoPoint;
    use crate::models::courier::{Courier, CourierStatus};
    use crate::models::dispatch_log::DispatchAction;
    use crate::models::order::{Order, OrderStatus};
    use crate::models::tags::TagSet;
    use crate::state::AppState;

    fn state() -> AppState {
        AppState::new(DispatchSettings::default(), 16)
    }

    fn add_order(state: &AppState) -> Order {
        let point = GeoPoint::new(50.0815, 14.4195);
        state
            .store
            .insert_order(Order::new(point, point, false, TagSet::new()))
    }

    fn add_available_courier(state: &AppState) -> Courier {
        let mut courier = Courier::new(
            "courier",
            Some(GeoPoint::new(50.0905, 14.4195)),
            TagSet::new(),
        );
        courier.status = CourierStatus::Available;
        state.store.insert_courier(courier)
    }

    #[test]
    fn commit_marks_order_assigned_and_courier_busy() {
        let state = state();
        let order = add_order(&state);
        let courier = add_available_courier(&state);

        let assignment = commit(&state, order.id, courier.id, DispatchAction::ManualAssigned)
            .unwrap();

        assert_eq!(assignment.order.status, OrderStatus::Assigned);
        assert_eq!(assignment.order.courier_id, Some(courier.id));
        assert_eq!(assignment.courier.status, CourierStatus::Busy);
        assert_eq!(assignment.log.action, DispatchAction::ManualAssigned);

        let stored = state.store.get_order(order.id).unwrap();
        assert_eq!(stored.status, OrderStatus::Assigned);
        assert_eq!(state.store.dispatch_logs_for_order(order.id).len(), 1);
    }

    #[test]
    fn commit_against_busy_courier_changes_nothing() {
        let state = state();
        let first = add_order(&state);
        let second = add_order(&state);
        let courier = add_available_courier(&state);

        commit(&state, first.id, courier.id, DispatchAction::ManualAssigned).unwrap();
        let err = commit(&state, second.id, courier.id, DispatchAction::ManualAssigned)
            .unwrap_err();

        assert_eq!(err, DispatchError::CourierUnavailable(courier.id));
        let untouched = state.store.get_order(second.id).unwrap();
        assert_eq!(untouched.status, OrderStatus::Created);
        assert_eq!(untouched.courier_id, None);
        assert!(state.store.dispatch_logs_for_order(second.id).is_empty());
    }

    #[test]
    fn commit_against_assigned_order_changes_nothing() {
        let state = state();
        let order = add_order(&state);
        let first = add_available_courier(&state);
        let second = add_available_courier(&state);

        commit(&state, order.id, first.id, DispatchAction::ManualAssigned).unwrap();
        let err = commit(&state, order.id, second.id, DispatchAction::ManualAssigned)
            .unwrap_err();

        assert_eq!(err.kind(), "invalid_state");
        let courier = state.store.get_courier(second.id).unwrap();
        assert_eq!(courier.status, CourierStatus::Available);
        assert_eq!(
            state.store.get_order(order.id).unwrap().courier_id,
            Some(first.id)
        );
    }

    #[test]
    fn concurrent_commits_for_one_courier_have_a_single_winner() {
        const CONTENDERS: usize = 8;

        let state = state();
        let courier = add_available_courier(&state);
        let orders: Vec<Order> = (0..CONTENDERS).map(|_| add_order(&state)).collect();
        let barrier = Barrier::new(CONTENDERS);

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = orders
                .iter()
                .map(|order| {
                    let state = &state;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        commit(state, order.id, courier.id, DispatchAction::ManualAssigned)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|err| *err == DispatchError::CourierUnavailable(courier.id)));

        let holding: Vec<_> = state
            .store
            .list_orders()
            .into_iter()
            .filter(|o| o.courier_id == Some(courier.id))
            .collect();
        assert_eq!(holding.len(), 1);
        assert_eq!(holding[0].status, OrderStatus::Assigned);
        assert_eq!(state.store.dispatch_logs().len(), 1);
    }
}
