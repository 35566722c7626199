//! Warehouse inventory ledger (command/event domain model).
//!
//! Locations with bounded capacity, an append-only receipt ledger, an
//! append-only movement log, and read-only storage metrics. Pure domain logic:
//! no IO, no locking, no logging.

pub mod location;
pub mod metrics;
pub mod movement;
pub mod receipt;
pub mod snapshot;
pub mod warehouse;

pub use location::{Environment, Location, LocationKind, LocationPatch, NewLocation};
pub use metrics::StorageMetrics;
pub use movement::{Movement, NewMovement};
pub use receipt::{NewReceipt, Receipt, ReceiptCondition, ReceiptPatch, ReceiptSource};
pub use snapshot::WarehouseSnapshot;
pub use warehouse::{
    AcceptReceipt, CapacityPolicy, CreateLocation, DeleteLocation, DeleteReceipt, ItemMoved, LocationCreated,
    LocationDeleted, LocationUpdated, MoveItem, ReceiptAccepted, ReceiptDeleted, ReceiptUpdated, UpdateLocation,
    UpdateReceipt, Warehouse, WarehouseCommand, WarehouseEvent,
};
