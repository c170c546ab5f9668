use crate::models::courier::{Courier, CourierStatus};
use crate::models::order::Order;

/// A courier may be considered for an order when it is available, has
/// reported a location and carries every tag the order requires.
pub fn is_eligible(courier: &Courier, order: &Order) -> bool {
    courier.status == CourierStatus::Available
        && courier.location.is_some()
        && courier.tags.is_superset_of(&order.required_tags)
}
