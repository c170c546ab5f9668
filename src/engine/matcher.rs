use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::assignment::{self, Assignment};
use crate::engine::eligibility::is_eligible;
use crate::engine::ranking::{rank, Candidate, CandidateView};
use crate::error::DispatchError;
use crate::geo::haversine_km;
use crate::models::dispatch_log::{DispatchAction, SearchPhase};
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

/// Successful automatic dispatch.
#[derive(Debug, Clone)]
pub struct AutoDispatch {
    pub assignment: Assignment,
    pub phase: SearchPhase,
    pub distance_km: f64,
}

/// Eligible couriers within `radius_km` of the order's pickup point, ranked.
/// Works on a snapshot of the courier pool and never writes.
pub fn find_candidates(state: &AppState, order: &Order, radius_km: f64) -> Vec<Candidate> {
    let candidates: Vec<Candidate> = state
        .store
        .get_available_couriers()
        .into_iter()
        .filter(|courier| is_eligible(courier, order))
        .filter_map(|courier| {
            let location = courier.location?;
            let distance_km = haversine_km(&location, &order.pickup);
            (distance_km <= radius_km).then_some(Candidate {
                courier,
                distance_km,
            })
        })
        .collect();

    rank(candidates, order.is_vip)
}

pub fn available_couriers_for_order(
    state: &AppState,
    order_id: Uuid,
    radius_km: f64,
) -> Result<Vec<CandidateView>, DispatchError> {
    let order = state.store.get_order(order_id)?;
    Ok(find_candidates(state, &order, radius_km)
        .iter()
        .map(CandidateView::from)
        .collect())
}

/// Two-phase expanding radius search. The best candidate of the first phase
/// with any candidates is committed; if neither phase finds one the order is
/// parked in SEARCHING and an `auto_failed` entry is logged.
pub fn auto_dispatch(state: &AppState, order_id: Uuid) -> Result<AutoDispatch, DispatchError> {
    let start = Instant::now();
    let result = run_auto_dispatch(state, order_id);

    let outcome = match &result {
        Ok(_) => "success",
        Err(err) => err.kind(),
    };
    state
        .metrics
        .record_dispatch("auto", outcome, start.elapsed().as_secs_f64());

    result
}

fn run_auto_dispatch(state: &AppState, order_id: Uuid) -> Result<AutoDispatch, DispatchError> {
    let order = state.store.get_order(order_id)?;
    ensure_dispatchable(&order)?;

    let phases = [
        (SearchPhase::Phase1, state.settings.phase1_radius_km),
        (SearchPhase::Phase2, state.settings.phase2_radius_km),
    ];

    for (phase, radius_km) in phases {
        let candidates = find_candidates(state, &order, radius_km);
        debug!(
            order_id = %order_id,
            phase = phase.number(),
            radius_km,
            candidates = candidates.len(),
            "radius search finished"
        );

        let Some(best) = candidates.into_iter().next() else {
            continue;
        };

        let assignment = assignment::commit(
            state,
            order_id,
            best.courier.id,
            DispatchAction::AutoAssigned(phase),
        )?;

        info!(
            order_id = %order_id,
            courier_id = %best.courier.id,
            phase = phase.number(),
            distance_km = best.distance_km,
            "auto dispatch succeeded"
        );

        return Ok(AutoDispatch {
            assignment,
            phase,
            distance_km: best.distance_km,
        });
    }

    state
        .store
        .set_order_status(order_id, OrderStatus::Searching)?;
    let entry = state
        .store
        .create_dispatch_log(order_id, None, DispatchAction::AutoFailed);
    state.publish(&entry);

    warn!(
        order_id = %order_id,
        radius_km = state.settings.phase2_radius_km,
        "auto dispatch found no courier"
    );

    Err(DispatchError::NoCourierInRange {
        radius_km: state.settings.phase2_radius_km,
    })
}

pub(crate) fn ensure_dispatchable(order: &Order) -> Result<(), DispatchError> {
    if order.status.is_dispatchable() {
        Ok(())
    } else {
        Err(DispatchError::InvalidState(format!(
            "order {} is {} and cannot be dispatched",
            order.id, order.status
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::{auto_dispatch, available_couriers_for_order};
    use crate::config::DispatchSettings;
    use crate::error::DispatchError;
    use crate::geo::GeoPoint;
    use crate::models::courier::{Courier, CourierStatus};
    use crate::models::dispatch_log::{DispatchAction, SearchPhase};
    use crate::models::order::{Order, OrderStatus};
    use crate::models::tags::TagSet;
    use crate::state::AppState;

    const PICKUP: GeoPoint = GeoPoint {
        lat: 50.0815,
        lng: 14.4195,
    };

    /// Roughly `km` kilometres due north of the pickup point.
    fn north_of_pickup(km: f64) -> GeoPoint {
        GeoPoint::new(PICKUP.lat + km / 111.195, PICKUP.lng)
    }

    fn city_state() -> AppState {
        AppState::new(DispatchSettings::new(2.0, 5.0).unwrap(), 16)
    }

    fn add_order(state: &AppState, is_vip: bool, required: &[&str]) -> Order {
        state.store.insert_order(Order::new(
            PICKUP,
            GeoPoint::new(50.1, 14.45),
            is_vip,
            required.iter().collect(),
        ))
    }

    fn add_courier(state: &AppState, km: f64, tags: &[&str]) -> Courier {
        let mut courier = Courier::new(
            format!("courier-{km}"),
            Some(north_of_pickup(km)),
            tags.iter().collect(),
        );
        courier.status = CourierStatus::Available;
        state.store.insert_courier(courier)
    }

    #[test]
    fn example_scenario_assigns_courier_one_km_away() {
        let state = AppState::new(DispatchSettings::default(), 16);
        let order = add_order(&state, false, &[]);
        let mut courier = Courier::new(
            "C",
            Some(GeoPoint::new(50.0905, 14.4195)),
            ["bike"].into_iter().collect(),
        );
        courier.status = CourierStatus::Available;
        let courier = state.store.insert_courier(courier);

        let dispatched = auto_dispatch(&state, order.id).unwrap();

        assert_eq!(dispatched.assignment.courier.id, courier.id);
        assert_eq!(dispatched.phase, SearchPhase::Phase1);
        assert!((dispatched.distance_km - 1.0).abs() < 0.05);
        assert_eq!(
            state.store.get_order(order.id).unwrap().status,
            OrderStatus::Assigned
        );
        assert_eq!(
            state.store.get_courier(courier.id).unwrap().status,
            CourierStatus::Busy
        );
    }

    #[test]
    fn nearest_courier_wins() {
        let state = city_state();
        let order = add_order(&state, false, &[]);
        let near = add_courier(&state, 1.0, &[]);
        let _far = add_courier(&state, 1.8, &[]);

        let dispatched = auto_dispatch(&state, order.id).unwrap();
        assert_eq!(dispatched.assignment.courier.id, near.id);
    }

    #[test]
    fn vip_order_prefers_vip_courier_over_closer_one() {
        let state = AppState::new(DispatchSettings::new(5.0, 10.0).unwrap(), 16);
        let order = add_order(&state, true, &[]);
        let _close = add_courier(&state, 1.0, &[]);
        let vip = add_courier(&state, 2.0, &["vip"]);

        let dispatched = auto_dispatch(&state, order.id).unwrap();
        assert_eq!(dispatched.assignment.courier.id, vip.id);
    }

    #[test]
    fn vip_order_falls_back_to_non_vip_courier() {
        let state = city_state();
        let order = add_order(&state, true, &[]);
        let plain = add_courier(&state, 1.0, &["bike"]);

        let dispatched = auto_dispatch(&state, order.id).unwrap();
        assert_eq!(dispatched.assignment.courier.id, plain.id);
    }

    #[test]
    fn non_vip_order_ignores_vip_tag() {
        let state = city_state();
        let order = add_order(&state, false, &[]);
        let close = add_courier(&state, 0.5, &[]);
        let _vip = add_courier(&state, 1.5, &["vip"]);

        let dispatched = auto_dispatch(&state, order.id).unwrap();
        assert_eq!(dispatched.assignment.courier.id, close.id);
    }

    #[test]
    fn required_tags_exclude_closer_courier() {
        let state = city_state();
        let order = add_order(&state, false, &["fragile_ok"]);
        let bike = add_courier(&state, 0.5, &["bike"]);
        let fragile = add_courier(&state, 1.5, &["bike", "fragile_ok"]);

        let dispatched = auto_dispatch(&state, order.id).unwrap();
        assert_eq!(dispatched.assignment.courier.id, fragile.id);
        assert_eq!(
            state.store.get_courier(bike.id).unwrap().status,
            CourierStatus::Available
        );
    }

    #[test]
    fn second_phase_widens_the_search() {
        let state = city_state();
        let order = add_order(&state, false, &[]);
        let courier = add_courier(&state, 3.5, &[]);

        let dispatched = auto_dispatch(&state, order.id).unwrap();
        assert_eq!(dispatched.assignment.courier.id, courier.id);
        assert_eq!(dispatched.phase, SearchPhase::Phase2);
        assert_eq!(
            dispatched.assignment.log.action,
            DispatchAction::AutoAssigned(SearchPhase::Phase2)
        );
    }

    #[test]
    fn failed_search_parks_order_in_searching_and_is_repeatable() {
        let state = city_state();
        let order = add_order(&state, false, &[]);
        let _too_far = add_courier(&state, 8.0, &[]);

        for _ in 0..2 {
            let err = auto_dispatch(&state, order.id).unwrap_err();
            assert!(matches!(err, DispatchError::NoCourierInRange { .. }));
            assert_eq!(
                state.store.get_order(order.id).unwrap().status,
                OrderStatus::Searching
            );
        }

        assert_eq!(state.store.count_couriers_with_status(CourierStatus::Busy), 0);
        let logs = state.store.dispatch_logs_for_order(order.id);
        assert_eq!(logs.len(), 2);
        assert!(logs
            .iter()
            .all(|entry| entry.action == DispatchAction::AutoFailed && entry.courier_id.is_none()));
    }

    #[test]
    fn redispatch_succeeds_once_a_courier_appears() {
        let state = city_state();
        let order = add_order(&state, false, &["fragile_ok"]);

        assert!(auto_dispatch(&state, order.id).is_err());

        let courier = state.store.insert_courier(Courier::new(
            "late",
            None,
            ["fragile_ok"].into_iter().collect(),
        ));
        state
            .store
            .update_courier_status(courier.id, CourierStatus::Available)
            .unwrap();
        state
            .store
            .update_courier_location(courier.id, north_of_pickup(0.8))
            .unwrap();

        let dispatched = auto_dispatch(&state, order.id).unwrap();
        assert_eq!(dispatched.assignment.courier.id, courier.id);
        assert_eq!(dispatched.phase, SearchPhase::Phase1);
    }

    #[test]
    fn assigned_order_cannot_be_dispatched_again() {
        let state = city_state();
        let order = add_order(&state, false, &[]);
        add_courier(&state, 1.0, &[]);
        add_courier(&state, 1.2, &[]);

        auto_dispatch(&state, order.id).unwrap();
        let err = auto_dispatch(&state, order.id).unwrap_err();

        assert_eq!(err.kind(), "invalid_state");
        assert_eq!(state.store.count_couriers_with_status(CourierStatus::Busy), 1);
    }

    #[test]
    fn unknown_order_is_not_found() {
        let state = city_state();
        let err = auto_dispatch(&state, uuid::Uuid::new_v4()).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn available_couriers_query_ranks_without_committing() {
        let state = city_state();
        let order = add_order(&state, true, &[]);
        let plain = add_courier(&state, 0.5, &[]);
        let vip = add_courier(&state, 1.5, &["vip"]);
        let _outside = add_courier(&state, 3.0, &["vip"]);

        let views = available_couriers_for_order(&state, order.id, 2.0).unwrap();

        let ids: Vec<_> = views.iter().map(|v| v.courier_id).collect();
        assert_eq!(ids, vec![vip.id, plain.id]);
        assert!(views[0].is_vip);
        assert_eq!(
            state.store.get_order(order.id).unwrap().status,
            OrderStatus::Created
        );
        assert!(state.store.dispatch_logs().is_empty());
    }
}
