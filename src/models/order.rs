use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::tags::TagSet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    Searching,
    Assigned,
    Picked,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Searching => "SEARCHING",
            OrderStatus::Assigned => "ASSIGNED",
            OrderStatus::Picked => "PICKED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Orders in these states may still receive a courier.
    pub fn is_dispatchable(&self) -> bool {
        matches!(self, OrderStatus::Created | OrderStatus::Searching)
    }

    /// An order holds a courier exactly while ASSIGNED or PICKED.
    pub fn holds_courier(&self) -> bool {
        matches!(self, OrderStatus::Assigned | OrderStatus::Picked)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        match (self, next) {
            (Created, Searching) | (Searching, Searching) => true,
            (Created | Searching, Assigned) => true,
            (Assigned, Picked) => true,
            (Picked, Delivered) => true,
            (Created | Searching | Assigned | Picked, Cancelled) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    pub is_vip: bool,
    pub required_tags: TagSet,
    pub status: OrderStatus,
    pub courier_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(pickup: GeoPoint, dropoff: GeoPoint, is_vip: bool, required_tags: TagSet) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            pickup,
            dropoff,
            is_vip,
            required_tags,
            status: OrderStatus::Created,
            courier_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::{self, *};

    const ALL: [OrderStatus; 6] = [Created, Searching, Assigned, Picked, Delivered, Cancelled];

    #[test]
    fn happy_path_is_legal() {
        assert!(Created.can_transition_to(Searching));
        assert!(Searching.can_transition_to(Assigned));
        assert!(Created.can_transition_to(Assigned));
        assert!(Assigned.can_transition_to(Picked));
        assert!(Picked.can_transition_to(Delivered));
    }

    #[test]
    fn states_cannot_be_skipped() {
        assert!(!Assigned.can_transition_to(Delivered));
        assert!(!Created.can_transition_to(Picked));
        assert!(!Searching.can_transition_to(Delivered));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for next in ALL {
            assert!(!Delivered.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn every_live_state_can_be_cancelled() {
        for status in [Created, Searching, Assigned, Picked] {
            assert!(status.can_transition_to(Cancelled), "{status} should cancel");
        }
    }

    #[test]
    fn courier_is_held_only_while_assigned_or_picked() {
        let holding: Vec<_> = ALL.into_iter().filter(|s| s.holds_courier()).collect();
        assert_eq!(holding, vec![Assigned, Picked]);
    }

    #[test]
    fn status_serializes_screaming_case() {
        assert_eq!(serde_json::to_string(&Searching).unwrap(), "\"SEARCHING\"");
    }
}
