use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::DispatchError;
use crate::geo::GeoPoint;
use crate::models::courier::{Courier, CourierStatus};
use crate::models::dispatch_log::{DispatchAction, DispatchLogEntry};
use crate::models::order::{Order, OrderStatus};

/// In-memory record store. Each record lives behind its own map entry, so
/// writers contend only on the rows they touch.
///
/// Lock order: an operation that needs both an order and a courier entry
/// takes the order entry first.
#[derive(Default)]
pub struct Store {
    pub couriers: DashMap<Uuid, Courier>,
    pub orders: DashMap<Uuid, Order>,
    pub dispatch_logs: DashMap<Uuid, DispatchLogEntry>,
    log_seq: AtomicU64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_order(&self, order: Order) -> Order {
        self.orders.insert(order.id, order.clone());
        order
    }

    pub fn insert_courier(&self, courier: Courier) -> Courier {
        self.couriers.insert(courier.id, courier.clone());
        courier
    }

    pub fn get_order(&self, id: Uuid) -> Result<Order, DispatchError> {
        self.orders
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DispatchError::order_not_found(id))
    }

    pub fn get_courier(&self, id: Uuid) -> Result<Courier, DispatchError> {
        self.couriers
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DispatchError::courier_not_found(id))
    }

    pub fn list_orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by_key(|order| (order.created_at, order.id));
        orders
    }

    pub fn list_couriers(&self) -> Vec<Courier> {
        let mut couriers: Vec<Courier> = self
            .couriers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        couriers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        couriers
    }

    /// Snapshot of couriers currently `available`. Takes no lock beyond the
    /// per-shard read locks of the iteration.
    pub fn get_available_couriers(&self) -> Vec<Courier> {
        self.couriers
            .iter()
            .filter(|entry| entry.status == CourierStatus::Available)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn count_couriers_with_status(&self, status: CourierStatus) -> usize {
        self.couriers
            .iter()
            .filter(|entry| entry.status == status)
            .count()
    }

    /// Self-reported availability change. Only `offline <-> available` is
    /// accepted; `busy` is owned by assignment and delivery/cancellation.
    pub fn update_courier_status(
        &self,
        id: Uuid,
        status: CourierStatus,
    ) -> Result<Courier, DispatchError> {
        let mut courier = self
            .couriers
            .get_mut(&id)
            .ok_or_else(|| DispatchError::courier_not_found(id))?;

        if !courier.status.can_self_report(status) {
            return Err(DispatchError::InvalidState(format!(
                "courier {id} cannot change status from {} to {status}",
                courier.status
            )));
        }

        if courier.status != status {
            courier.status = status;
            courier.updated_at = Utc::now();
        }

        Ok(courier.clone())
    }

    pub fn update_courier_location(
        &self,
        id: Uuid,
        location: GeoPoint,
    ) -> Result<Courier, DispatchError> {
        let mut courier = self
            .couriers
            .get_mut(&id)
            .ok_or_else(|| DispatchError::courier_not_found(id))?;

        courier.location = Some(location);
        courier.updated_at = Utc::now();

        Ok(courier.clone())
    }

    /// Moves an order along a courier-free edge of its state machine
    /// (e.g. CREATED -> SEARCHING). Edges that grant or release a courier go
    /// through the assignment and lifecycle operations instead.
    pub fn set_order_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, DispatchError> {
        let mut order = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| DispatchError::order_not_found(id))?;

        let grants_or_releases = status.holds_courier() || order.status.holds_courier();
        if grants_or_releases || !order.status.can_transition_to(status) {
            return Err(DispatchError::InvalidState(format!(
                "order {id} cannot move from {} to {status}",
                order.status
            )));
        }

        if order.status != status {
            order.status = status;
            order.updated_at = Utc::now();
        }

        Ok(order.clone())
    }

    pub fn create_dispatch_log(
        &self,
        order_id: Uuid,
        courier_id: Option<Uuid>,
        action: DispatchAction,
    ) -> DispatchLogEntry {
        let entry = DispatchLogEntry {
            id: Uuid::new_v4(),
            seq: self.log_seq.fetch_add(1, Ordering::SeqCst),
            order_id,
            courier_id,
            action,
            created_at: Utc::now(),
        };

        self.dispatch_logs.insert(entry.id, entry.clone());
        entry
    }

    pub fn dispatch_logs(&self) -> Vec<DispatchLogEntry> {
        self.collect_logs(|_| true)
    }

    pub fn dispatch_logs_for_order(&self, order_id: Uuid) -> Vec<DispatchLogEntry> {
        self.collect_logs(|entry| entry.order_id == order_id)
    }

    pub fn dispatch_logs_for_courier(&self, courier_id: Uuid) -> Vec<DispatchLogEntry> {
        self.collect_logs(|entry| entry.courier_id == Some(courier_id))
    }

    fn collect_logs<F>(&self, keep: F) -> Vec<DispatchLogEntry>
    where
        F: Fn(&DispatchLogEntry) -> bool,
    {
        let mut entries: Vec<DispatchLogEntry> = self
            .dispatch_logs
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
    }
}
