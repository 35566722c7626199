use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storehouse_core::{
    Aggregate, AggregateRoot, DomainError, DomainResult, ItemId, LocationId, MovementId, ReceiptId, WarehouseId,
};
use storehouse_events::Event;

use crate::location::{Environment, Location, LocationKind, LocationPatch, NewLocation};
use crate::movement::{Movement, NewMovement};
use crate::receipt::{NewReceipt, Receipt, ReceiptPatch};

/// Where location capacity is enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicy {
    /// Receipts and moves both respect the destination's capacity.
    #[default]
    Uniform,
    /// Only moves are checked; receiving may overfill a location.
    MovesOnly,
}

impl CapacityPolicy {
    pub fn enforces_on_receipt(self) -> bool {
        matches!(self, CapacityPolicy::Uniform)
    }
}

/// Aggregate root: Warehouse.
///
/// Owns every location, the receipt ledger, and the movement log. Location
/// occupancy only changes through events produced by `handle`, so the
/// `occupancy == sum(items)` invariant has exactly one code path.
#[derive(Debug, Clone, PartialEq)]
pub struct Warehouse {
    id: WarehouseId,
    policy: CapacityPolicy,
    locations: IndexMap<LocationId, Location>,
    receipts: IndexMap<ReceiptId, Receipt>,
    movements: IndexMap<MovementId, Movement>,
    version: u64,
}

impl Warehouse {
    pub fn new(id: WarehouseId, policy: CapacityPolicy) -> Self {
        Self {
            id,
            policy,
            locations: IndexMap::new(),
            receipts: IndexMap::new(),
            movements: IndexMap::new(),
            version: 0,
        }
    }

    pub(crate) fn from_parts(
        id: WarehouseId,
        policy: CapacityPolicy,
        locations: IndexMap<LocationId, Location>,
        receipts: IndexMap<ReceiptId, Receipt>,
        movements: IndexMap<MovementId, Movement>,
    ) -> Self {
        Self {
            id,
            policy,
            locations,
            receipts,
            movements,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> WarehouseId {
        self.id
    }

    pub fn policy(&self) -> CapacityPolicy {
        self.policy
    }

    pub fn location(&self, id: &LocationId) -> Option<&Location> {
        self.locations.get(id)
    }

    /// Locations in registry (creation) order.
    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    pub fn receipt(&self, id: &ReceiptId) -> Option<&Receipt> {
        self.receipts.get(id)
    }

    /// Receipts in acceptance order.
    pub fn receipts(&self) -> impl Iterator<Item = &Receipt> {
        self.receipts.values()
    }

    pub fn receipts_for_location<'a>(&'a self, location_id: &'a LocationId) -> impl Iterator<Item = &'a Receipt> + 'a {
        self.receipts.values().filter(move |r| &r.location_id == location_id)
    }

    pub fn movement(&self, id: &MovementId) -> Option<&Movement> {
        self.movements.get(id)
    }

    /// Movements in commit order.
    pub fn movements(&self) -> impl Iterator<Item = &Movement> {
        self.movements.values()
    }

    pub fn movements_for_item<'a>(&'a self, item_id: &'a ItemId) -> impl Iterator<Item = &'a Movement> + 'a {
        self.movements.values().filter(move |m| &m.item_id == item_id)
    }

    pub(crate) fn require_location(&self, id: &LocationId) -> DomainResult<&Location> {
        self.locations
            .get(id)
            .ok_or_else(|| DomainError::not_found(format!("location {id}")))
    }

    fn require_receipt(&self, id: &ReceiptId) -> DomainResult<&Receipt> {
        self.receipts
            .get(id)
            .ok_or_else(|| DomainError::not_found(format!("receipt {id}")))
    }
}

impl AggregateRoot for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateLocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLocation {
    pub location_id: LocationId,
    pub location: NewLocation,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateLocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateLocation {
    pub location_id: LocationId,
    pub patch: LocationPatch,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteLocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteLocation {
    pub location_id: LocationId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AcceptReceipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptReceipt {
    pub receipt_id: ReceiptId,
    pub receipt: NewReceipt,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateReceipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReceipt {
    pub receipt_id: ReceiptId,
    pub patch: ReceiptPatch,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteReceipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReceipt {
    pub receipt_id: ReceiptId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MoveItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveItem {
    pub movement_id: MovementId,
    pub movement: NewMovement,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WarehouseCommand {
    CreateLocation(CreateLocation),
    UpdateLocation(UpdateLocation),
    DeleteLocation(DeleteLocation),
    AcceptReceipt(AcceptReceipt),
    UpdateReceipt(UpdateReceipt),
    DeleteReceipt(DeleteReceipt),
    MoveItem(MoveItem),
}

/// Event: LocationCreated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCreated {
    pub location_id: LocationId,
    pub name: String,
    pub kind: LocationKind,
    pub capacity: u64,
    pub environment: Environment,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LocationUpdated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdated {
    pub location_id: LocationId,
    pub patch: LocationPatch,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LocationDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationDeleted {
    pub location_id: LocationId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReceiptAccepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptAccepted {
    pub receipt: Receipt,
}

/// Event: ReceiptUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptUpdated {
    pub receipt_id: ReceiptId,
    pub patch: ReceiptPatch,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReceiptDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptDeleted {
    pub receipt_id: ReceiptId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemMoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMoved {
    pub movement: Movement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WarehouseEvent {
    LocationCreated(LocationCreated),
    LocationUpdated(LocationUpdated),
    LocationDeleted(LocationDeleted),
    ReceiptAccepted(ReceiptAccepted),
    ReceiptUpdated(ReceiptUpdated),
    ReceiptDeleted(ReceiptDeleted),
    ItemMoved(ItemMoved),
}

impl Event for WarehouseEvent {
    fn event_type(&self) -> &'static str {
        match self {
            WarehouseEvent::LocationCreated(_) => "warehouse.location.created",
            WarehouseEvent::LocationUpdated(_) => "warehouse.location.updated",
            WarehouseEvent::LocationDeleted(_) => "warehouse.location.deleted",
            WarehouseEvent::ReceiptAccepted(_) => "warehouse.receipt.accepted",
            WarehouseEvent::ReceiptUpdated(_) => "warehouse.receipt.updated",
            WarehouseEvent::ReceiptDeleted(_) => "warehouse.receipt.deleted",
            WarehouseEvent::ItemMoved(_) => "warehouse.item.moved",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            WarehouseEvent::LocationCreated(e) => e.occurred_at,
            WarehouseEvent::LocationUpdated(e) => e.occurred_at,
            WarehouseEvent::LocationDeleted(e) => e.occurred_at,
            WarehouseEvent::ReceiptAccepted(e) => e.receipt.received_at,
            WarehouseEvent::ReceiptUpdated(e) => e.occurred_at,
            WarehouseEvent::ReceiptDeleted(e) => e.occurred_at,
            WarehouseEvent::ItemMoved(e) => e.movement.moved_at,
        }
    }

    fn subject_id(&self) -> Uuid {
        match self {
            WarehouseEvent::LocationCreated(e) => e.location_id.into(),
            WarehouseEvent::LocationUpdated(e) => e.location_id.into(),
            WarehouseEvent::LocationDeleted(e) => e.location_id.into(),
            WarehouseEvent::ReceiptAccepted(e) => e.receipt.id.into(),
            WarehouseEvent::ReceiptUpdated(e) => e.receipt_id.into(),
            WarehouseEvent::ReceiptDeleted(e) => e.receipt_id.into(),
            WarehouseEvent::ItemMoved(e) => e.movement.id.into(),
        }
    }
}

impl Aggregate for Warehouse {
    type Command = WarehouseCommand;
    type Event = WarehouseEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            WarehouseEvent::LocationCreated(e) => {
                self.locations.insert(
                    e.location_id,
                    Location::new(e.location_id, e.name.clone(), e.kind, e.capacity, e.environment),
                );
            }
            WarehouseEvent::LocationUpdated(e) => {
                if let Some(location) = self.locations.get_mut(&e.location_id) {
                    e.patch.apply_to(location);
                }
            }
            WarehouseEvent::LocationDeleted(e) => {
                self.locations.shift_remove(&e.location_id);
            }
            WarehouseEvent::ReceiptAccepted(e) => {
                let receipt = &e.receipt;
                if let Some(location) = self.locations.get_mut(&receipt.location_id) {
                    location.add_item(&receipt.item_id, receipt.quantity);
                }
                self.receipts.insert(receipt.id, receipt.clone());
            }
            WarehouseEvent::ReceiptUpdated(e) => {
                if let Some(receipt) = self.receipts.get_mut(&e.receipt_id) {
                    e.patch.apply_to(receipt);
                }
            }
            WarehouseEvent::ReceiptDeleted(e) => {
                self.receipts.shift_remove(&e.receipt_id);
            }
            WarehouseEvent::ItemMoved(e) => {
                let movement = &e.movement;
                if let Some(source) = self.locations.get_mut(&movement.from_location) {
                    source.remove_item(&movement.item_id, movement.quantity);
                }
                if let Some(destination) = self.locations.get_mut(&movement.to_location) {
                    destination.add_item(&movement.item_id, movement.quantity);
                }
                self.movements.insert(movement.id, movement.clone());
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            WarehouseCommand::CreateLocation(cmd) => self.handle_create_location(cmd),
            WarehouseCommand::UpdateLocation(cmd) => self.handle_update_location(cmd),
            WarehouseCommand::DeleteLocation(cmd) => self.handle_delete_location(cmd),
            WarehouseCommand::AcceptReceipt(cmd) => self.handle_accept_receipt(cmd),
            WarehouseCommand::UpdateReceipt(cmd) => self.handle_update_receipt(cmd),
            WarehouseCommand::DeleteReceipt(cmd) => self.handle_delete_receipt(cmd),
            WarehouseCommand::MoveItem(cmd) => self.handle_move_item(cmd),
        }
    }

    /// Occupancy equals the item sum everywhere. Capacity is only part of the
    /// invariant when receipts enforce it too; under `MovesOnly` receiving may
    /// overfill a location.
    fn check_invariants(&self) -> Result<(), Self::Error> {
        let enforce_capacity = self.policy.enforces_on_receipt();
        for location in self.locations.values() {
            location.check_consistency(enforce_capacity)?;
        }
        Ok(())
    }
}

impl Warehouse {
    fn handle_create_location(&self, cmd: &CreateLocation) -> Result<Vec<WarehouseEvent>, DomainError> {
        cmd.location.validate()?;
        if self.locations.contains_key(&cmd.location_id) {
            return Err(DomainError::conflict(format!("location {} already exists", cmd.location_id)));
        }

        Ok(vec![WarehouseEvent::LocationCreated(LocationCreated {
            location_id: cmd.location_id,
            name: cmd.location.name.clone(),
            kind: cmd.location.kind,
            capacity: cmd.location.capacity,
            environment: cmd.location.environment,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_location(&self, cmd: &UpdateLocation) -> Result<Vec<WarehouseEvent>, DomainError> {
        let location = self.require_location(&cmd.location_id)?;
        cmd.patch.validate()?;

        if cmd.patch.is_empty() {
            return Ok(vec![]);
        }

        if let Some(capacity) = cmd.patch.capacity {
            if self.policy.enforces_on_receipt() && capacity < location.current_occupancy() {
                return Err(DomainError::validation(format!(
                    "capacity {capacity} is below current occupancy {} of location {}",
                    location.current_occupancy(),
                    cmd.location_id
                )));
            }
        }

        Ok(vec![WarehouseEvent::LocationUpdated(LocationUpdated {
            location_id: cmd.location_id,
            patch: cmd.patch.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete_location(&self, cmd: &DeleteLocation) -> Result<Vec<WarehouseEvent>, DomainError> {
        let location = self.require_location(&cmd.location_id)?;
        if location.current_occupancy() > 0 {
            return Err(DomainError::conflict(format!(
                "location {} still holds {} units",
                cmd.location_id,
                location.current_occupancy()
            )));
        }

        Ok(vec![WarehouseEvent::LocationDeleted(LocationDeleted {
            location_id: cmd.location_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_accept_receipt(&self, cmd: &AcceptReceipt) -> Result<Vec<WarehouseEvent>, DomainError> {
        cmd.receipt.validate()?;
        if self.receipts.contains_key(&cmd.receipt_id) {
            return Err(DomainError::conflict(format!("receipt {} already exists", cmd.receipt_id)));
        }

        let location = self.require_location(&cmd.receipt.location_id)?;
        let occupancy_after = location.occupancy_after_adding(cmd.receipt.quantity)?;
        if self.policy.enforces_on_receipt() && occupancy_after > location.capacity() {
            return Err(DomainError::capacity_exceeded(
                cmd.receipt.location_id,
                location.capacity(),
                location.current_occupancy(),
                cmd.receipt.quantity,
            ));
        }

        Ok(vec![WarehouseEvent::ReceiptAccepted(ReceiptAccepted {
            receipt: cmd.receipt.clone().into_receipt(cmd.receipt_id, cmd.occurred_at),
        })])
    }

    fn handle_update_receipt(&self, cmd: &UpdateReceipt) -> Result<Vec<WarehouseEvent>, DomainError> {
        self.require_receipt(&cmd.receipt_id)?;
        cmd.patch.validate()?;

        if cmd.patch.is_empty() {
            return Ok(vec![]);
        }

        Ok(vec![WarehouseEvent::ReceiptUpdated(ReceiptUpdated {
            receipt_id: cmd.receipt_id,
            patch: cmd.patch.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete_receipt(&self, cmd: &DeleteReceipt) -> Result<Vec<WarehouseEvent>, DomainError> {
        self.require_receipt(&cmd.receipt_id)?;

        Ok(vec![WarehouseEvent::ReceiptDeleted(ReceiptDeleted {
            receipt_id: cmd.receipt_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_move_item(&self, cmd: &MoveItem) -> Result<Vec<WarehouseEvent>, DomainError> {
        let request = &cmd.movement;
        request.validate()?;
        if self.movements.contains_key(&cmd.movement_id) {
            return Err(DomainError::conflict(format!("movement {} already exists", cmd.movement_id)));
        }

        let source = self.require_location(&request.from_location)?;
        let destination = self.require_location(&request.to_location)?;

        let occupancy_after = destination.occupancy_after_adding(request.quantity)?;
        if occupancy_after > destination.capacity() {
            return Err(DomainError::capacity_exceeded(
                request.to_location,
                destination.capacity(),
                destination.current_occupancy(),
                request.quantity,
            ));
        }

        let held = source.quantity_of(&request.item_id);
        if held < request.quantity {
            return Err(DomainError::validation(format!(
                "location {} holds {held} of {}, cannot move {}",
                request.from_location, request.item_id, request.quantity
            )));
        }

        Ok(vec![WarehouseEvent::ItemMoved(ItemMoved {
            movement: request.clone().into_movement(cmd.movement_id, cmd.occurred_at),
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storehouse_core::ActorId;
    use storehouse_events::execute;

    use crate::receipt::{ReceiptCondition, ReceiptSource};

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn item(s: &str) -> ItemId {
        ItemId::new(s).unwrap()
    }

    fn actor() -> ActorId {
        ActorId::new("clerk-1").unwrap()
    }

    fn warehouse(policy: CapacityPolicy) -> Warehouse {
        Warehouse::new(WarehouseId::new(), policy)
    }

    fn create(w: &mut Warehouse, name: &str, capacity: u64) -> LocationId {
        let location_id = LocationId::new();
        let cmd = WarehouseCommand::CreateLocation(CreateLocation {
            location_id,
            location: NewLocation::new(name, LocationKind::Bin, capacity),
            occurred_at: test_time(),
        });
        execute(w, &cmd).unwrap();
        location_id
    }

    fn receive_cmd(location_id: LocationId, sku: &str, quantity: u64) -> WarehouseCommand {
        WarehouseCommand::AcceptReceipt(AcceptReceipt {
            receipt_id: ReceiptId::new(),
            receipt: NewReceipt::new(
                item(sku),
                quantity,
                location_id,
                ReceiptSource::PurchaseOrder,
                ReceiptCondition::Good,
                actor(),
            ),
            occurred_at: test_time(),
        })
    }

    fn move_cmd(sku: &str, quantity: u64, from: LocationId, to: LocationId) -> WarehouseCommand {
        WarehouseCommand::MoveItem(MoveItem {
            movement_id: MovementId::new(),
            movement: NewMovement::new(item(sku), quantity, from, to, actor(), "put-away"),
            occurred_at: test_time(),
        })
    }

    fn occupancy(w: &Warehouse, id: LocationId) -> u64 {
        w.location(&id).unwrap().current_occupancy()
    }

    #[test]
    fn create_location_starts_empty() {
        let mut w = warehouse(CapacityPolicy::Uniform);
        let id = create(&mut w, "Cold room shelf 1", 40);

        let loc = w.location(&id).unwrap();
        assert_eq!(loc.name(), "Cold room shelf 1");
        assert_eq!(loc.capacity(), 40);
        assert_eq!(loc.current_occupancy(), 0);
        assert!(loc.items().is_empty());
        assert_eq!(w.version(), 1);
    }

    #[test]
    fn create_location_rejects_blank_name() {
        let w = warehouse(CapacityPolicy::Uniform);
        let cmd = WarehouseCommand::CreateLocation(CreateLocation {
            location_id: LocationId::new(),
            location: NewLocation::new(" ", LocationKind::Zone, 1),
            occurred_at: test_time(),
        });
        assert!(matches!(w.handle(&cmd), Err(DomainError::Validation(_))));
    }

    #[test]
    fn receipts_accumulate_per_item() {
        let mut w = warehouse(CapacityPolicy::Uniform);
        let id = create(&mut w, "L1", 20);

        execute(&mut w, &receive_cmd(id, "sku-1", 3)).unwrap();
        execute(&mut w, &receive_cmd(id, "sku-1", 4)).unwrap();

        let loc = w.location(&id).unwrap();
        assert_eq!(loc.quantity_of(&item("sku-1")), 7);
        assert_eq!(loc.current_occupancy(), 7);
        assert_eq!(w.receipts().count(), 2);
    }

    #[test]
    fn receipt_for_unknown_location_is_not_found() {
        let w = warehouse(CapacityPolicy::Uniform);
        let err = w.handle(&receive_cmd(LocationId::new(), "sku-1", 1)).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn receipt_capacity_depends_on_policy() {
        let mut uniform = warehouse(CapacityPolicy::Uniform);
        let a = create(&mut uniform, "L1", 5);
        let err = uniform.handle(&receive_cmd(a, "sku-1", 6)).unwrap_err();
        assert!(matches!(err, DomainError::CapacityExceeded { requested: 6, .. }));

        let mut permissive = warehouse(CapacityPolicy::MovesOnly);
        let b = create(&mut permissive, "L1", 5);
        execute(&mut permissive, &receive_cmd(b, "sku-1", 6)).unwrap();
        assert_eq!(occupancy(&permissive, b), 6);
        assert!(permissive.check_invariants().is_ok());
    }

    #[test]
    fn move_conserves_total_occupancy() {
        let mut w = warehouse(CapacityPolicy::Uniform);
        let a = create(&mut w, "A", 20);
        let b = create(&mut w, "B", 20);
        execute(&mut w, &receive_cmd(a, "sku-1", 12)).unwrap();

        execute(&mut w, &move_cmd("sku-1", 5, a, b)).unwrap();

        assert_eq!(occupancy(&w, a), 7);
        assert_eq!(occupancy(&w, b), 5);
        assert_eq!(w.locations().map(Location::current_occupancy).sum::<u64>(), 12);
        assert_eq!(w.movements().count(), 1);
    }

    #[test]
    fn move_rejected_for_capacity_leaves_state_unchanged() {
        let mut w = warehouse(CapacityPolicy::Uniform);
        let a = create(&mut w, "A", 20);
        let b = create(&mut w, "B", 10);
        execute(&mut w, &receive_cmd(a, "sku-1", 5)).unwrap();
        execute(&mut w, &receive_cmd(b, "sku-2", 8)).unwrap();
        let before = w.clone();

        let err = execute(&mut w, &move_cmd("sku-1", 5, a, b)).unwrap_err();

        assert!(matches!(
            err,
            DomainError::CapacityExceeded { capacity: 10, occupancy: 8, requested: 5, .. }
        ));
        assert_eq!(w, before);
    }

    #[test]
    fn full_withdrawal_removes_item_key() {
        let mut w = warehouse(CapacityPolicy::Uniform);
        let a = create(&mut w, "A", 20);
        let b = create(&mut w, "B", 20);
        execute(&mut w, &receive_cmd(a, "sku-1", 4)).unwrap();

        execute(&mut w, &move_cmd("sku-1", 4, a, b)).unwrap();

        assert!(!w.location(&a).unwrap().items().contains_key(&item("sku-1")));
        assert_eq!(w.location(&b).unwrap().quantity_of(&item("sku-1")), 4);
    }

    #[test]
    fn move_more_than_held_is_rejected() {
        let mut w = warehouse(CapacityPolicy::Uniform);
        let a = create(&mut w, "A", 20);
        let b = create(&mut w, "B", 20);
        execute(&mut w, &receive_cmd(a, "sku-1", 2)).unwrap();
        let before = w.clone();

        let err = execute(&mut w, &move_cmd("sku-1", 3, a, b)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("holds 2")));

        let err = execute(&mut w, &move_cmd("sku-missing", 1, a, b)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(w, before);
    }

    #[test]
    fn move_to_unknown_or_same_location_is_rejected() {
        let mut w = warehouse(CapacityPolicy::Uniform);
        let a = create(&mut w, "A", 20);
        execute(&mut w, &receive_cmd(a, "sku-1", 2)).unwrap();

        let err = w.handle(&move_cmd("sku-1", 1, a, LocationId::new())).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        let err = w.handle(&move_cmd("sku-1", 1, a, a)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn delete_non_empty_location_conflicts() {
        let mut w = warehouse(CapacityPolicy::Uniform);
        let a = create(&mut w, "A", 20);
        execute(&mut w, &receive_cmd(a, "sku-1", 1)).unwrap();

        let cmd = WarehouseCommand::DeleteLocation(DeleteLocation {
            location_id: a,
            occurred_at: test_time(),
        });
        assert!(matches!(w.handle(&cmd), Err(DomainError::Conflict(_))));

        let empty = create(&mut w, "B", 20);
        let cmd = WarehouseCommand::DeleteLocation(DeleteLocation {
            location_id: empty,
            occurred_at: test_time(),
        });
        execute(&mut w, &cmd).unwrap();
        assert!(w.location(&empty).is_none());
        assert_eq!(w.locations().count(), 1);
    }

    #[test]
    fn update_location_guards_capacity_under_uniform_policy() {
        let mut w = warehouse(CapacityPolicy::Uniform);
        let a = create(&mut w, "A", 20);
        execute(&mut w, &receive_cmd(a, "sku-1", 15)).unwrap();

        let shrink = |capacity| {
            WarehouseCommand::UpdateLocation(UpdateLocation {
                location_id: a,
                patch: LocationPatch {
                    capacity: Some(capacity),
                    ..LocationPatch::default()
                },
                occurred_at: test_time(),
            })
        };

        assert!(matches!(w.handle(&shrink(10)), Err(DomainError::Validation(_))));
        execute(&mut w, &shrink(15)).unwrap();
        assert_eq!(w.location(&a).unwrap().capacity(), 15);
    }

    #[test]
    fn empty_patch_emits_nothing() {
        let mut w = warehouse(CapacityPolicy::Uniform);
        let a = create(&mut w, "A", 20);
        let cmd = WarehouseCommand::UpdateLocation(UpdateLocation {
            location_id: a,
            patch: LocationPatch::default(),
            occurred_at: test_time(),
        });
        assert!(w.handle(&cmd).unwrap().is_empty());
    }

    #[test]
    fn receipt_corrections_do_not_touch_occupancy() {
        let mut w = warehouse(CapacityPolicy::Uniform);
        let a = create(&mut w, "A", 20);
        let cmd = receive_cmd(a, "sku-1", 6);
        let WarehouseCommand::AcceptReceipt(accept) = &cmd else {
            unreachable!()
        };
        let receipt_id = accept.receipt_id;
        execute(&mut w, &cmd).unwrap();

        let update = WarehouseCommand::UpdateReceipt(UpdateReceipt {
            receipt_id,
            patch: ReceiptPatch {
                quantity: Some(2),
                ..ReceiptPatch::default()
            },
            occurred_at: test_time(),
        });
        execute(&mut w, &update).unwrap();
        assert_eq!(w.receipt(&receipt_id).unwrap().quantity, 2);
        assert_eq!(occupancy(&w, a), 6);

        let delete = WarehouseCommand::DeleteReceipt(DeleteReceipt {
            receipt_id,
            occurred_at: test_time(),
        });
        execute(&mut w, &delete).unwrap();
        assert!(w.receipt(&receipt_id).is_none());
        assert_eq!(occupancy(&w, a), 6);

        assert!(matches!(w.handle(&delete), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn end_to_end_transfer_scenario() {
        let mut w = warehouse(CapacityPolicy::Uniform);
        let l1 = create(&mut w, "L1", 20);
        let l2 = create(&mut w, "L2", 20);

        execute(&mut w, &receive_cmd(l1, "sku-1", 15)).unwrap();

        execute(&mut w, &move_cmd("sku-1", 15, l1, l2)).unwrap();
        assert_eq!(occupancy(&w, l1), 0);
        assert!(w.location(&l1).unwrap().items().is_empty());
        assert_eq!(occupancy(&w, l2), 15);

        execute(&mut w, &move_cmd("sku-1", 10, l2, l1)).unwrap();
        assert_eq!(occupancy(&w, l1), 10);
        assert_eq!(occupancy(&w, l2), 5);

        let before = w.clone();
        let err = execute(&mut w, &move_cmd("sku-1", 25, l1, l2)).unwrap_err();
        assert!(matches!(err, DomainError::CapacityExceeded { .. }));
        assert_eq!(w, before);
    }

    #[test]
    fn event_types_are_stable() {
        let mut w = warehouse(CapacityPolicy::Uniform);
        let a = create(&mut w, "A", 20);
        let events = w.handle(&receive_cmd(a, "sku-1", 1)).unwrap();
        assert_eq!(events[0].event_type(), "warehouse.receipt.accepted");
        assert_eq!(events[0].version(), 1);
    }

    #[test]
    fn cleared_environment_survives_journal_json() {
        let mut w = warehouse(CapacityPolicy::Uniform);
        let a = create(&mut w, "Cooler", 20);
        let update = |humidity| {
            WarehouseCommand::UpdateLocation(UpdateLocation {
                location_id: a,
                patch: LocationPatch {
                    humidity,
                    ..LocationPatch::default()
                },
                occurred_at: test_time(),
            })
        };
        execute(&mut w, &update(Some(Some(55.0)))).unwrap();

        let events = w.handle(&update(Some(None))).unwrap();
        let json = serde_json::to_string(&events).unwrap();
        let replayed: Vec<WarehouseEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(replayed, events);

        for event in &replayed {
            w.apply(event);
        }
        assert_eq!(w.location(&a).unwrap().environment().humidity, None);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Receive { location: usize, sku: usize, quantity: u64 },
            Move { from: usize, to: usize, sku: usize, quantity: u64 },
            Resize { location: usize, capacity: u64 },
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0usize..4, 0usize..3, 0u64..30).prop_map(|(location, sku, quantity)| Op::Receive {
                    location,
                    sku,
                    quantity
                }),
                (0usize..4, 0usize..4, 0usize..3, 0u64..30).prop_map(|(from, to, sku, quantity)| Op::Move {
                    from,
                    to,
                    sku,
                    quantity
                }),
                (0usize..4, 0u64..80).prop_map(|(location, capacity)| Op::Resize { location, capacity }),
            ]
        }

        fn to_command(op: &Op, ids: &[LocationId]) -> WarehouseCommand {
            let sku = |i: usize| format!("sku-{i}");
            match op {
                Op::Receive { location, sku: s, quantity } => receive_cmd(ids[*location], &sku(*s), *quantity),
                Op::Move { from, to, sku: s, quantity } => move_cmd(&sku(*s), *quantity, ids[*from], ids[*to]),
                Op::Resize { location, capacity } => WarehouseCommand::UpdateLocation(UpdateLocation {
                    location_id: ids[*location],
                    patch: LocationPatch {
                        capacity: Some(*capacity),
                        ..LocationPatch::default()
                    },
                    occurred_at: Utc::now(),
                }),
            }
        }

        fn total(w: &Warehouse) -> u64 {
            w.locations().map(Location::current_occupancy).sum()
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: after every command (accepted or rejected) each location's
            /// occupancy equals its item total and stays within capacity.
            #[test]
            fn invariants_hold_after_every_command(
                capacities in prop::collection::vec(0u64..60, 4),
                ops in prop::collection::vec(op(), 1..60)
            ) {
                let mut w = warehouse(CapacityPolicy::Uniform);
                let ids: Vec<LocationId> = capacities
                    .iter()
                    .enumerate()
                    .map(|(i, cap)| create(&mut w, &format!("L{i}"), *cap))
                    .collect();

                for op in &ops {
                    let before = w.clone();
                    let before_total = total(&w);
                    match execute(&mut w, &to_command(op, &ids)) {
                        Ok(_) => {
                            match op {
                                Op::Receive { quantity, .. } => prop_assert_eq!(total(&w), before_total + quantity),
                                _ => prop_assert_eq!(total(&w), before_total),
                            }
                        }
                        Err(_) => prop_assert_eq!(&w, &before),
                    }
                    prop_assert!(w.check_invariants().is_ok());
                    for loc in w.locations() {
                        prop_assert!(loc.items().values().all(|q| *q > 0));
                    }
                }
            }

            /// Property: a successful move shifts exactly `quantity` between the two locations.
            #[test]
            fn successful_move_is_conserving(received in 1u64..50, moved in 1u64..50) {
                let mut w = warehouse(CapacityPolicy::Uniform);
                let a = create(&mut w, "A", 50);
                let b = create(&mut w, "B", 50);
                execute(&mut w, &receive_cmd(a, "sku-1", received)).unwrap();

                let result = execute(&mut w, &move_cmd("sku-1", moved, a, b));
                if moved <= received {
                    prop_assert!(result.is_ok());
                    prop_assert_eq!(occupancy(&w, a), received - moved);
                    prop_assert_eq!(occupancy(&w, b), moved);
                } else {
                    prop_assert!(matches!(result, Err(DomainError::Validation(_))));
                    prop_assert_eq!(occupancy(&w, a), received);
                    prop_assert_eq!(occupancy(&w, b), 0);
                }
            }
        }
    }
}
