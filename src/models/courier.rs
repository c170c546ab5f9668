use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::tags::{TagSet, VIP_TAG};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CourierStatus {
    Offline,
    Available,
    Busy,
}

impl CourierStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourierStatus::Offline => "offline",
            CourierStatus::Available => "available",
            CourierStatus::Busy => "busy",
        }
    }

    /// Legal moves of the courier state machine: offline <-> available <-> busy.
    pub fn can_transition_to(&self, next: CourierStatus) -> bool {
        matches!(
            (self, next),
            (CourierStatus::Offline, CourierStatus::Available)
                | (CourierStatus::Available, CourierStatus::Offline)
                | (CourierStatus::Available, CourierStatus::Busy)
                | (CourierStatus::Busy, CourierStatus::Available)
        )
    }

    /// Moves a courier may report for itself. `busy` is owned by dispatch.
    pub fn can_self_report(&self, next: CourierStatus) -> bool {
        match (self, next) {
            (CourierStatus::Busy, _) | (_, CourierStatus::Busy) => false,
            (current, next) if *current == next => true,
            (current, next) => current.can_transition_to(next),
        }
    }
}

impl std::fmt::Display for CourierStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Courier {
    pub id: Uuid,
    pub name: String,
    pub location: Option<GeoPoint>,
    pub status: CourierStatus,
    pub tags: TagSet,
    pub updated_at: DateTime<Utc>,
}

impl Courier {
    pub fn new(name: impl Into<String>, location: Option<GeoPoint>, tags: TagSet) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            location,
            status: CourierStatus::Offline,
            tags,
            updated_at: Utc::now(),
        }
    }

    pub fn is_vip(&self) -> bool {
        self.tags.contains(VIP_TAG)
    }
}
