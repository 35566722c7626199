//! Location registry records: storage units, their capacity and what they hold.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use storehouse_core::{DomainError, DomainResult, Entity, ItemId, LocationId};

/// Physical kind of a storage location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Shelf,
    Bin,
    Rack,
    Zone,
}

/// Descriptive environmental attributes. No invariant depends on them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

impl Environment {
    pub(crate) fn validate(&self) -> DomainResult<()> {
        ensure_finite("temperature", self.temperature)?;
        ensure_finite("humidity", self.humidity)
    }
}

fn ensure_finite(field: &str, value: Option<f64>) -> DomainResult<()> {
    match value {
        Some(v) if !v.is_finite() => Err(DomainError::validation(format!("{field} must be a finite number"))),
        _ => Ok(()),
    }
}

/// A storage location (shelf, bin, rack, zone).
///
/// `current_occupancy` is a cached sum of `items`; it is recomputed on every
/// mutation and never set directly. Items reaching zero are removed from the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    id: LocationId,
    name: String,
    kind: LocationKind,
    capacity: u64,
    current_occupancy: u64,
    items: BTreeMap<ItemId, u64>,
    #[serde(default)]
    environment: Environment,
}

impl Location {
    pub(crate) fn new(id: LocationId, name: String, kind: LocationKind, capacity: u64, environment: Environment) -> Self {
        Self {
            id,
            name,
            kind,
            capacity,
            current_occupancy: 0,
            items: BTreeMap::new(),
            environment,
        }
    }

    pub fn id_typed(&self) -> LocationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> LocationKind {
        self.kind
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn current_occupancy(&self) -> u64 {
        self.current_occupancy
    }

    /// Quantity held per item; every value is > 0.
    pub fn items(&self) -> &BTreeMap<ItemId, u64> {
        &self.items
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Quantity of `item_id` held here (0 when absent).
    pub fn quantity_of(&self, item_id: &ItemId) -> u64 {
        self.items.get(item_id).copied().unwrap_or(0)
    }

    pub fn holds(&self, item_id: &ItemId) -> bool {
        self.items.contains_key(item_id)
    }

    /// Remaining room before the capacity limit (0 when already at or above it).
    pub fn free_capacity(&self) -> u64 {
        self.capacity.saturating_sub(self.current_occupancy)
    }

    /// Occupancy as a percentage of capacity; 0 for a zero-capacity location.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.current_occupancy as f64 / self.capacity as f64 * 100.0
    }

    /// Occupancy after adding `quantity`, or a validation error on overflow.
    pub(crate) fn occupancy_after_adding(&self, quantity: u64) -> DomainResult<u64> {
        self.current_occupancy
            .checked_add(quantity)
            .ok_or_else(|| DomainError::validation("quantity overflows location occupancy"))
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_capacity(&mut self, capacity: u64) {
        self.capacity = capacity;
    }

    pub(crate) fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    /// Upsert: increments an existing entry or inserts a new one.
    pub(crate) fn add_item(&mut self, item_id: &ItemId, quantity: u64) {
        *self.items.entry(item_id.clone()).or_insert(0) += quantity;
        self.recompute_occupancy();
    }

    /// Decrements an entry, removing it when it reaches zero.
    ///
    /// Callers validate that at least `quantity` is held; the subtraction saturates
    /// so a bypassed check cannot wrap.
    pub(crate) fn remove_item(&mut self, item_id: &ItemId, quantity: u64) {
        if let Some(held) = self.items.get_mut(item_id) {
            *held = held.saturating_sub(quantity);
            if *held == 0 {
                self.items.remove(item_id);
            }
        }
        self.recompute_occupancy();
    }

    fn recompute_occupancy(&mut self) {
        self.current_occupancy = self.items.values().sum();
    }

    /// Structural checks used when accepting externally supplied state.
    pub(crate) fn check_consistency(&self, enforce_capacity: bool) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation(format!("location {} has an empty name", self.id)));
        }
        self.environment.validate()?;
        if let Some((item, _)) = self.items.iter().find(|(_, qty)| **qty == 0) {
            return Err(DomainError::validation(format!(
                "location {} holds a zero quantity entry for {item}",
                self.id
            )));
        }
        let sum = self
            .items
            .values()
            .try_fold(0u64, |acc, qty| acc.checked_add(*qty))
            .ok_or_else(|| DomainError::validation(format!("location {} item total overflows", self.id)))?;
        if sum != self.current_occupancy {
            return Err(DomainError::validation(format!(
                "location {} occupancy {} does not match item total {sum}",
                self.id, self.current_occupancy
            )));
        }
        if enforce_capacity && self.current_occupancy > self.capacity {
            return Err(DomainError::capacity_exceeded(self.id, self.capacity, self.current_occupancy, 0));
        }
        Ok(())
    }
}

impl Entity for Location {
    const KIND: &'static str = "location";

    type Id = LocationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a location. Occupancy and items always start empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocation {
    pub name: String,
    pub kind: LocationKind,
    pub capacity: u64,
    #[serde(default)]
    pub environment: Environment,
}

impl NewLocation {
    pub fn new(name: impl Into<String>, kind: LocationKind, capacity: u64) -> Self {
        Self {
            name: name.into(),
            kind,
            capacity,
            environment: Environment::default(),
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub(crate) fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("location name cannot be empty"));
        }
        self.environment.validate()
    }
}

/// Partial update for a location.
///
/// Only descriptive fields and capacity can change; occupancy and items are
/// derived from receipts and movements. For the environment fields,
/// `Some(None)` clears the value and `None` leaves it untouched. On the wire a
/// clear is an explicit `null` and an untouched field is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capacity: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub temperature: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub humidity: Option<Option<f64>>,
}

impl LocationPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.capacity.is_none() && self.temperature.is_none() && self.humidity.is_none()
    }

    pub(crate) fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("location name cannot be empty"));
            }
        }
        ensure_finite("temperature", self.temperature.flatten())?;
        ensure_finite("humidity", self.humidity.flatten())
    }

    pub(crate) fn apply_to(&self, location: &mut Location) {
        if let Some(name) = &self.name {
            location.rename(name.clone());
        }
        if let Some(capacity) = self.capacity {
            location.set_capacity(capacity);
        }
        let env = location.environment_mut();
        if let Some(temperature) = self.temperature {
            env.temperature = temperature;
        }
        if let Some(humidity) = self.humidity {
            env.humidity = humidity;
        }
    }
}
