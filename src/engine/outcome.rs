use serde::Serialize;
use uuid::Uuid;

use crate::engine::assignment::Assignment;
use crate::engine::matcher::AutoDispatch;
use crate::error::DispatchError;
use crate::models::dispatch_log::DispatchAction;

/// Structured answer to a dispatch request. Expected failures are reported
/// here rather than as errors so the caller chooses how to surface them.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub success: bool,
    pub message: String,
    pub order_id: Uuid,
    pub courier_id: Option<Uuid>,
    pub distance_km: Option<f64>,
    pub action: Option<DispatchAction>,
    pub error: Option<&'static str>,
}

impl DispatchResult {
    pub fn from_auto(order_id: Uuid, result: &Result<AutoDispatch, DispatchError>) -> Self {
        match result {
            Ok(dispatched) => Self {
                success: true,
                message: format!(
                    "order assigned to courier {} in phase {} ({:.2} km away)",
                    dispatched.assignment.courier.id,
                    dispatched.phase.number(),
                    dispatched.distance_km
                ),
                order_id,
                courier_id: Some(dispatched.assignment.courier.id),
                distance_km: Some(dispatched.distance_km),
                action: Some(dispatched.assignment.log.action),
                error: None,
            },
            Err(err) => Self::failed(order_id, err),
        }
    }

    pub fn from_manual(order_id: Uuid, result: &Result<Assignment, DispatchError>) -> Self {
        match result {
            Ok(assignment) => Self {
                success: true,
                message: format!(
                    "order manually assigned to courier {}",
                    assignment.courier.id
                ),
                order_id,
                courier_id: Some(assignment.courier.id),
                distance_km: None,
                action: Some(assignment.log.action),
                error: None,
            },
            Err(err) => Self::failed(order_id, err),
        }
    }

    fn failed(order_id: Uuid, err: &DispatchError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            order_id,
            courier_id: None,
            distance_km: None,
            action: None,
            error: Some(err.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::DispatchResult;
    use crate::error::DispatchError;

    #[test]
    fn failure_carries_kind_and_message() {
        let order_id = Uuid::new_v4();
        let result = DispatchResult::from_auto(
            order_id,
            &Err(DispatchError::NoCourierInRange { radius_km: 5.0 }),
        );

        assert!(!result.success);
        assert_eq!(result.error, Some("no_courier_in_range"));
        assert!(result
            .message
            .contains("no available courier found within the outer radius"));
        assert_eq!(result.courier_id, None);
    }
}
