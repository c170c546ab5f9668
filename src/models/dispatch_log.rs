use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Radius tier of the automatic search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchPhase {
    Phase1,
    Phase2,
}

impl SearchPhase {
    pub fn number(&self) -> u8 {
        match self {
            SearchPhase::Phase1 => 1,
            SearchPhase::Phase2 => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchAction {
    AutoAssigned(SearchPhase),
    ManualAssigned,
    AutoFailed,
}

impl DispatchAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchAction::AutoAssigned(SearchPhase::Phase1) => "auto_assigned_phase1",
            DispatchAction::AutoAssigned(SearchPhase::Phase2) => "auto_assigned_phase2",
            DispatchAction::ManualAssigned => "manual_assigned",
            DispatchAction::AutoFailed => "auto_failed",
        }
    }
}

impl std::fmt::Display for DispatchAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DispatchAction {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "auto_assigned_phase1" => Ok(DispatchAction::AutoAssigned(SearchPhase::Phase1)),
            "auto_assigned_phase2" => Ok(DispatchAction::AutoAssigned(SearchPhase::Phase2)),
            "manual_assigned" => Ok(DispatchAction::ManualAssigned),
            "auto_failed" => Ok(DispatchAction::AutoFailed),
            other => Err(format!("unknown dispatch action: {other}")),
        }
    }
}

impl Serialize for DispatchAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DispatchAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Append-only audit record. `courier_id` is empty for `auto_failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchLogEntry {
    pub id: Uuid,
    pub seq: u64,
    pub order_id: Uuid,
    pub courier_id: Option<Uuid>,
    pub action: DispatchAction,
    pub created_at: DateTime<Utc>,
}
