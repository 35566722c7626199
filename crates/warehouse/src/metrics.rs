//! Read-only storage statistics derived from the registry.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use storehouse_core::{DomainResult, ItemId, LocationId};

use crate::location::Location;
use crate::warehouse::Warehouse;

/// Aggregate storage statistics. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageMetrics {
    pub total_capacity: u64,
    pub used_capacity: u64,
    /// Percentage of capacity in use; 0 when total capacity is 0.
    pub utilization_rate: f64,
    /// Occupancy per location, in registry order.
    pub items_by_location: IndexMap<LocationId, u64>,
    /// Always empty: item expiry is not tracked by the ledger.
    pub expiring_items: Vec<ItemId>,
}

fn percentage(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    used as f64 / total as f64 * 100.0
}

impl Warehouse {
    pub fn storage_metrics(&self) -> StorageMetrics {
        let mut total_capacity = 0u64;
        let mut used_capacity = 0u64;
        let mut items_by_location = IndexMap::new();

        for location in self.locations() {
            total_capacity = total_capacity.saturating_add(location.capacity());
            used_capacity = used_capacity.saturating_add(location.current_occupancy());
            items_by_location.insert(location.id_typed(), location.current_occupancy());
        }

        StorageMetrics {
            total_capacity,
            used_capacity,
            utilization_rate: percentage(used_capacity, total_capacity),
            items_by_location,
            expiring_items: Vec::new(),
        }
    }

    /// Occupancy of one location as a percentage of its capacity.
    ///
    /// Unknown locations are reported as `NotFound` rather than 0%.
    pub fn location_utilization(&self, id: &LocationId) -> DomainResult<f64> {
        self.require_location(id).map(Location::utilization)
    }

    /// First location (registry order) holding `item_id`.
    ///
    /// Items split across several locations only report the first one; use
    /// [`Warehouse::item_locations`] to see all of them.
    pub fn item_location(&self, item_id: &ItemId) -> Option<&Location> {
        self.locations().find(|l| l.holds(item_id))
    }

    /// Every location holding `item_id`, in registry order.
    pub fn item_locations<'a>(&'a self, item_id: &'a ItemId) -> impl Iterator<Item = &'a Location> + 'a {
        self.locations().filter(move |l| l.holds(item_id))
    }

    /// Quantity of `item_id` across all locations.
    pub fn item_total(&self, item_id: &ItemId) -> u64 {
        self.locations().map(|l| l.quantity_of(item_id)).sum()
    }
}
