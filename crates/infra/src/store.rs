//! Shared, lock-guarded owner of the warehouse ledger.
//!
//! `WarehouseStore` is the only way application code reaches warehouse state.
//! It serializes every mutation behind one write lock:
//!
//! ```text
//! call (create_location / accept_receipt / move_item / ...)
//!   ↓
//! 1. Take the write lock
//!   ↓
//! 2. Decide (Warehouse::handle, pure; rejects leave state untouched)
//!   ↓
//! 3. Evolve (Warehouse::apply for each event)
//!   ↓
//! 4. Append envelopes to the audit journal and publish them on the bus
//!   ↓
//! 5. Read the result back while still holding the lock
//! ```
//!
//! Reads take the read lock and may run concurrently with each other, never with
//! a mutation, so callers never observe a half-applied command.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use storehouse_core::{AggregateRoot, DomainError, ItemId, LocationId, MovementId, ReceiptId, WarehouseId};
use storehouse_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription};
use storehouse_warehouse::{
    AcceptReceipt, CapacityPolicy, CreateLocation, DeleteLocation, DeleteReceipt, Location, LocationPatch, MoveItem,
    Movement, NewLocation, NewMovement, NewReceipt, Receipt, ReceiptPatch, StorageMetrics, UpdateLocation,
    UpdateReceipt, Warehouse, WarehouseCommand, WarehouseEvent, WarehouseSnapshot,
};

use crate::config::StoreConfig;

/// Stream name recorded on every journal envelope.
pub const AGGREGATE_TYPE: &str = "warehouse";

/// Envelope type carried by the journal and the bus.
pub type WarehouseEnvelope = EventEnvelope<WarehouseEvent>;

/// Default bus: in-process fan-out.
pub type InMemoryWarehouseBus = Arc<InMemoryEventBus<WarehouseEnvelope>>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The ledger rejected the operation (validation, not found, capacity, conflict).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A thread panicked while holding the state lock.
    #[error("warehouse state lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// The domain error, if this failure came from the ledger itself.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            StoreError::Domain(e) => Some(e),
            StoreError::Poisoned => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
struct State {
    warehouse: Warehouse,
    journal: Vec<WarehouseEnvelope>,
    /// Survives `restore`, so sequence numbers never repeat within a process.
    last_sequence: u64,
}

/// In-memory authoritative warehouse store.
#[derive(Debug)]
pub struct WarehouseStore<B = InMemoryWarehouseBus> {
    state: RwLock<State>,
    bus: B,
}

impl WarehouseStore<InMemoryWarehouseBus> {
    pub fn new(policy: CapacityPolicy) -> Self {
        Self::with_bus(policy, Arc::new(InMemoryEventBus::new()))
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.capacity_policy)
    }
}

impl<B> WarehouseStore<B>
where
    B: EventBus<WarehouseEnvelope>,
{
    pub fn with_bus(policy: CapacityPolicy, bus: B) -> Self {
        Self {
            state: RwLock::new(State {
                warehouse: Warehouse::new(WarehouseId::new(), policy),
                journal: Vec::new(),
                last_sequence: 0,
            }),
            bus,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    // ----- Location registry -----

    pub fn create_location(&self, location: NewLocation) -> StoreResult<Location> {
        let location_id = LocationId::new();
        let command = WarehouseCommand::CreateLocation(CreateLocation {
            location_id,
            location,
            occurred_at: Utc::now(),
        });
        self.commit(command, |w| w.location(&location_id).cloned())?
            .ok_or_else(|| missing("location", location_id))
    }

    pub fn update_location(&self, location_id: LocationId, patch: LocationPatch) -> StoreResult<Location> {
        let command = WarehouseCommand::UpdateLocation(UpdateLocation {
            location_id,
            patch,
            occurred_at: Utc::now(),
        });
        self.commit(command, |w| w.location(&location_id).cloned())?
            .ok_or_else(|| missing("location", location_id))
    }

    pub fn delete_location(&self, location_id: LocationId) -> StoreResult<()> {
        let command = WarehouseCommand::DeleteLocation(DeleteLocation {
            location_id,
            occurred_at: Utc::now(),
        });
        self.commit(command, |_| ())
    }

    pub fn location(&self, location_id: &LocationId) -> StoreResult<Option<Location>> {
        self.read(|w| w.location(location_id).cloned())
    }

    pub fn locations(&self) -> StoreResult<Vec<Location>> {
        self.read(|w| w.locations().cloned().collect())
    }

    // ----- Receipt ledger -----

    pub fn accept_receipt(&self, receipt: NewReceipt) -> StoreResult<Receipt> {
        let receipt_id = ReceiptId::new();
        let command = WarehouseCommand::AcceptReceipt(AcceptReceipt {
            receipt_id,
            receipt,
            occurred_at: Utc::now(),
        });
        self.commit(command, |w| w.receipt(&receipt_id).cloned())?
            .ok_or_else(|| missing("receipt", receipt_id))
    }

    /// Correct a receipt record. Location occupancy is not reconciled.
    pub fn update_receipt(&self, receipt_id: ReceiptId, patch: ReceiptPatch) -> StoreResult<Receipt> {
        let command = WarehouseCommand::UpdateReceipt(UpdateReceipt {
            receipt_id,
            patch,
            occurred_at: Utc::now(),
        });
        self.commit(command, |w| w.receipt(&receipt_id).cloned())?
            .ok_or_else(|| missing("receipt", receipt_id))
    }

    /// Remove a receipt record. Location occupancy is not reconciled.
    pub fn delete_receipt(&self, receipt_id: ReceiptId) -> StoreResult<()> {
        let command = WarehouseCommand::DeleteReceipt(DeleteReceipt {
            receipt_id,
            occurred_at: Utc::now(),
        });
        self.commit(command, |_| ())
    }

    pub fn receipt(&self, receipt_id: &ReceiptId) -> StoreResult<Option<Receipt>> {
        self.read(|w| w.receipt(receipt_id).cloned())
    }

    pub fn receipts(&self) -> StoreResult<Vec<Receipt>> {
        self.read(|w| w.receipts().cloned().collect())
    }

    pub fn receipts_for_location(&self, location_id: &LocationId) -> StoreResult<Vec<Receipt>> {
        self.read(|w| w.receipts_for_location(location_id).cloned().collect())
    }

    // ----- Movement engine -----

    pub fn move_item(&self, movement: NewMovement) -> StoreResult<Movement> {
        let movement_id = MovementId::new();
        let command = WarehouseCommand::MoveItem(MoveItem {
            movement_id,
            movement,
            occurred_at: Utc::now(),
        });
        self.commit(command, |w| w.movement(&movement_id).cloned())?
            .ok_or_else(|| missing("movement", movement_id))
    }

    pub fn movements(&self) -> StoreResult<Vec<Movement>> {
        self.read(|w| w.movements().cloned().collect())
    }

    pub fn movements_for_item(&self, item_id: &ItemId) -> StoreResult<Vec<Movement>> {
        self.read(|w| w.movements_for_item(item_id).cloned().collect())
    }

    // ----- Metrics -----

    pub fn storage_metrics(&self) -> StoreResult<StorageMetrics> {
        self.read(Warehouse::storage_metrics)
    }

    pub fn location_utilization(&self, location_id: &LocationId) -> StoreResult<f64> {
        Ok(self.read(|w| w.location_utilization(location_id))??)
    }

    pub fn item_location(&self, item_id: &ItemId) -> StoreResult<Option<Location>> {
        self.read(|w| w.item_location(item_id).cloned())
    }

    pub fn item_locations(&self, item_id: &ItemId) -> StoreResult<Vec<Location>> {
        self.read(|w| w.item_locations(item_id).cloned().collect())
    }

    pub fn item_total(&self, item_id: &ItemId) -> StoreResult<u64> {
        self.read(|w| w.item_total(item_id))
    }

    // ----- Snapshot / journal -----

    pub fn policy(&self) -> StoreResult<CapacityPolicy> {
        self.read(Warehouse::policy)
    }

    /// Number of events applied since creation or the last restore.
    pub fn version(&self) -> StoreResult<u64> {
        self.read(|w| w.version())
    }

    pub fn snapshot(&self) -> StoreResult<WarehouseSnapshot> {
        self.read(Warehouse::snapshot)
    }

    /// Replace the whole ledger with `snapshot`.
    ///
    /// The snapshot is validated before the swap; on error current state is kept.
    /// The journal is cleared but sequence numbers keep counting up.
    pub fn restore(&self, snapshot: WarehouseSnapshot) -> StoreResult<()> {
        let mut state = self.write()?;
        let restored = Warehouse::restore(state.warehouse.id_typed(), state.warehouse.policy(), snapshot)
            .inspect_err(|err| warn!(error = %err, "warehouse snapshot rejected"))?;

        info!(
            locations = restored.locations().count(),
            receipts = restored.receipts().count(),
            movements = restored.movements().count(),
            "warehouse restored from snapshot"
        );
        state.warehouse = restored;
        state.journal.clear();
        Ok(())
    }

    /// Every envelope recorded since creation or the last restore.
    pub fn journal(&self) -> StoreResult<Vec<WarehouseEnvelope>> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.journal.clone())
    }

    /// Envelopes with a sequence number strictly greater than `sequence`.
    pub fn journal_since(&self, sequence: u64) -> StoreResult<Vec<WarehouseEnvelope>> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state
            .journal
            .iter()
            .filter(|env| env.sequence_number() > sequence)
            .cloned()
            .collect())
    }

    /// Subscribe to envelopes committed from now on.
    ///
    /// Each subscription buffers without bound: a subscription that is kept
    /// alive but never read holds a copy of every later envelope. Drop it when
    /// done, or use `journal_since` for catch-up reads instead.
    pub fn subscribe(&self) -> Subscription<WarehouseEnvelope> {
        self.bus.subscribe()
    }

    fn read<T>(&self, f: impl FnOnce(&Warehouse) -> T) -> StoreResult<T> {
        let state: RwLockReadGuard<'_, State> = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&state.warehouse))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }

    fn commit<T>(&self, command: WarehouseCommand, read_back: impl FnOnce(&Warehouse) -> T) -> StoreResult<T> {
        let mut guard = self.write()?;
        let state = &mut *guard;

        let events = storehouse_events::execute(&mut state.warehouse, &command).map_err(|err| {
            warn!(command = command_name(&command), error = %err, "warehouse command rejected");
            StoreError::from(err)
        })?;

        let aggregate_id = state.warehouse.id_typed();
        for event in events {
            state.last_sequence += 1;
            let envelope = EventEnvelope::new(Uuid::now_v7(), aggregate_id, AGGREGATE_TYPE, state.last_sequence, event);
            info!(
                event_type = envelope.event_type(),
                sequence = envelope.sequence_number(),
                subject = %envelope.subject_id(),
                "warehouse event committed"
            );

            // Published under the write lock so subscribers see sequence order.
            if let Err(err) = self.bus.publish(envelope.clone()) {
                warn!(sequence = envelope.sequence_number(), error = ?err, "failed to publish warehouse event");
            }
            state.journal.push(envelope);
        }

        let result = read_back(&state.warehouse);
        debug!(command = command_name(&command), "warehouse command applied");
        Ok(result)
    }
}

fn missing(kind: &str, id: impl core::fmt::Display) -> StoreError {
    StoreError::Domain(DomainError::not_found(format!("{kind} {id}")))
}

fn command_name(command: &WarehouseCommand) -> &'static str {
    match command {
        WarehouseCommand::CreateLocation(_) => "create_location",
        WarehouseCommand::UpdateLocation(_) => "update_location",
        WarehouseCommand::DeleteLocation(_) => "delete_location",
        WarehouseCommand::AcceptReceipt(_) => "accept_receipt",
        WarehouseCommand::UpdateReceipt(_) => "update_receipt",
        WarehouseCommand::DeleteReceipt(_) => "delete_receipt",
        WarehouseCommand::MoveItem(_) => "move_item",
    }
}
