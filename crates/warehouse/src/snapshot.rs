//! Structure-preserving export/import of the three record collections.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use storehouse_core::{Aggregate, DomainError, DomainResult, Entity, WarehouseId};

use crate::location::Location;
use crate::movement::Movement;
use crate::receipt::Receipt;
use crate::warehouse::{CapacityPolicy, Warehouse};

/// Plain-data copy of a warehouse: one ordered sequence per collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarehouseSnapshot {
    pub locations: Vec<Location>,
    pub receipts: Vec<Receipt>,
    pub movements: Vec<Movement>,
}

impl Warehouse {
    pub fn snapshot(&self) -> WarehouseSnapshot {
        WarehouseSnapshot {
            locations: self.locations().cloned().collect(),
            receipts: self.receipts().cloned().collect(),
            movements: self.movements().cloned().collect(),
        }
    }

    /// Rebuild a warehouse from a snapshot.
    ///
    /// Occupancy must match item totals, zero-quantity entries and same-location
    /// movements are refused, and under `CapacityPolicy::Uniform` no location may
    /// exceed its capacity. Every rejection is a `Validation` error. Receipts and
    /// movements may reference locations that were deleted since.
    pub fn restore(id: WarehouseId, policy: CapacityPolicy, snapshot: WarehouseSnapshot) -> DomainResult<Self> {
        let locations = index_unique(snapshot.locations)?;
        let receipts = index_unique(snapshot.receipts)?;
        let movements = index_unique(snapshot.movements)?;

        if let Some(r) = receipts.values().find(|r| r.quantity == 0) {
            return Err(DomainError::validation(format!("{} has zero quantity", r.label())));
        }
        if let Some(m) = movements.values().find(|m| m.quantity == 0) {
            return Err(DomainError::validation(format!("{} has zero quantity", m.label())));
        }
        if let Some(m) = movements.values().find(|m| m.from_location == m.to_location) {
            return Err(DomainError::validation(format!(
                "{} moves from and to location {}",
                m.label(),
                m.from_location
            )));
        }

        let warehouse = Warehouse::from_parts(id, policy, locations, receipts, movements);
        warehouse.check_invariants().map_err(|err| match err {
            DomainError::CapacityExceeded {
                location,
                capacity,
                occupancy,
                ..
            } => DomainError::validation(format!(
                "location {location} holds {occupancy} units over its capacity of {capacity}"
            )),
            other => other,
        })?;
        Ok(warehouse)
    }
}

fn index_unique<E: Entity>(records: Vec<E>) -> DomainResult<IndexMap<E::Id, E>> {
    let mut indexed = IndexMap::with_capacity(records.len());
    for record in records {
        let id = *record.id();
        if indexed.contains_key(&id) {
            return Err(DomainError::validation(format!("duplicate {} id {id}", E::KIND)));
        }
        indexed.insert(id, record);
    }
    Ok(indexed)
}
