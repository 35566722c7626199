//! Domain error model.

use thiserror::Error;

use crate::id::LocationId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// missing references, capacity, conflicts). Infrastructure concerns belong elsewhere.
/// Every variant is an expected outcome of invalid input; none is fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (non-positive quantity, blank required field, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Accepting the quantity would push a location above its capacity.
    #[error(
        "capacity exceeded at location {location} (capacity: {capacity}, occupancy: {occupancy}, requested: {requested})"
    )]
    CapacityExceeded {
        location: LocationId,
        capacity: u64,
        occupancy: u64,
        requested: u64,
    },

    /// The operation conflicts with current state (e.g. deleting a non-empty location).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn capacity_exceeded(location: LocationId, capacity: u64, occupancy: u64, requested: u64) -> Self {
        Self::CapacityExceeded {
            location,
            capacity,
            occupancy,
            requested,
        }
    }
}
