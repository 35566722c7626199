//! Movement log records: committed transfers between two locations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storehouse_core::{ActorId, DomainError, DomainResult, Entity, ItemId, LocationId, MovementId};

/// A committed, atomic transfer of item quantity. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub item_id: ItemId,
    pub quantity: u64,
    pub from_location: LocationId,
    pub to_location: LocationId,
    pub moved_at: DateTime<Utc>,
    pub moved_by: ActorId,
    pub reason: String,
}

impl Entity for Movement {
    const KIND: &'static str = "movement";

    type Id = MovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for moving stock between locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub item_id: ItemId,
    pub quantity: u64,
    pub from_location: LocationId,
    pub to_location: LocationId,
    pub moved_by: ActorId,
    pub reason: String,
}

impl NewMovement {
    pub fn new(
        item_id: ItemId,
        quantity: u64,
        from_location: LocationId,
        to_location: LocationId,
        moved_by: ActorId,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            item_id,
            quantity,
            from_location,
            to_location,
            moved_by,
            reason: reason.into(),
        }
    }

    /// Checks that need no warehouse state.
    pub(crate) fn validate(&self) -> DomainResult<()> {
        if self.quantity == 0 {
            return Err(DomainError::validation("movement quantity must be positive"));
        }
        if self.reason.trim().is_empty() {
            return Err(DomainError::validation("movement reason cannot be empty"));
        }
        if self.from_location == self.to_location {
            return Err(DomainError::validation("source and destination locations must differ"));
        }
        Ok(())
    }

    pub(crate) fn into_movement(self, id: MovementId, moved_at: DateTime<Utc>) -> Movement {
        Movement {
            id,
            item_id: self.item_id,
            quantity: self.quantity,
            from_location: self.from_location,
            to_location: self.to_location,
            moved_at,
            moved_by: self.moved_by,
            reason: self.reason,
        }
    }
}
