//! Receipt ledger records: inbound stock accepted at a location.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storehouse_core::{ActorId, DomainError, DomainResult, Entity, ItemId, LocationId, ReceiptId};

/// Where an inbound receipt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptSource {
    Manual,
    PurchaseOrder,
    Transfer,
}

/// Physical condition recorded at receiving time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptCondition {
    Good,
    Damaged,
    Expired,
}

/// An accepted inbound receipt.
///
/// Immutable apart from administrative corrections, which never touch
/// location occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    pub item_id: ItemId,
    pub quantity: u64,
    pub location_id: LocationId,
    pub received_at: DateTime<Utc>,
    pub source: ReceiptSource,
    pub condition: ReceiptCondition,
    pub received_by: ActorId,
    pub notes: Option<String>,
    pub batch_number: Option<String>,
    pub barcode: Option<String>,
}

impl Entity for Receipt {
    const KIND: &'static str = "receipt";

    type Id = ReceiptId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for accepting a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReceipt {
    pub item_id: ItemId,
    pub quantity: u64,
    pub location_id: LocationId,
    pub source: ReceiptSource,
    pub condition: ReceiptCondition,
    pub received_by: ActorId,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
}

impl NewReceipt {
    pub fn new(
        item_id: ItemId,
        quantity: u64,
        location_id: LocationId,
        source: ReceiptSource,
        condition: ReceiptCondition,
        received_by: ActorId,
    ) -> Self {
        Self {
            item_id,
            quantity,
            location_id,
            source,
            condition,
            received_by,
            notes: None,
            batch_number: None,
            barcode: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_batch_number(mut self, batch_number: impl Into<String>) -> Self {
        self.batch_number = Some(batch_number.into());
        self
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub(crate) fn validate(&self) -> DomainResult<()> {
        if self.quantity == 0 {
            return Err(DomainError::validation("receipt quantity must be positive"));
        }
        Ok(())
    }

    pub(crate) fn into_receipt(self, id: ReceiptId, received_at: DateTime<Utc>) -> Receipt {
        Receipt {
            id,
            item_id: self.item_id,
            quantity: self.quantity,
            location_id: self.location_id,
            received_at,
            source: self.source,
            condition: self.condition,
            received_by: self.received_by,
            notes: self.notes,
            batch_number: self.batch_number,
            barcode: self.barcode,
        }
    }
}

/// Administrative correction of a receipt record.
///
/// Optional text fields use `Some(None)` to clear and `None` to leave untouched;
/// in JSON a clear is an explicit `null` and an untouched field is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptPatch {
    #[serde(default)]
    pub quantity: Option<u64>,
    #[serde(default)]
    pub condition: Option<ReceiptCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub notes: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub batch_number: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub barcode: Option<Option<String>>,
}

impl ReceiptPatch {
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none()
            && self.condition.is_none()
            && self.notes.is_none()
            && self.batch_number.is_none()
            && self.barcode.is_none()
    }

    pub(crate) fn validate(&self) -> DomainResult<()> {
        if self.quantity == Some(0) {
            return Err(DomainError::validation("receipt quantity must be positive"));
        }
        Ok(())
    }

    pub(crate) fn apply_to(&self, receipt: &mut Receipt) {
        if let Some(quantity) = self.quantity {
            receipt.quantity = quantity;
        }
        if let Some(condition) = self.condition {
            receipt.condition = condition;
        }
        if let Some(notes) = &self.notes {
            receipt.notes = notes.clone();
        }
        if let Some(batch_number) = &self.batch_number {
            receipt.batch_number = batch_number.clone();
        }
        if let Some(barcode) = &self.barcode {
            receipt.barcode = barcode.clone();
        }
    }
}
