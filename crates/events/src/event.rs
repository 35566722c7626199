use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A recorded fact about the ledger.
///
/// Event payloads are never edited after they are journaled; schema changes bump
/// `version()`.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted routing name, e.g. `"warehouse.item.moved"`.
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32;

    /// Business time of the fact.
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Id of the record the event is about (a location, receipt or movement),
    /// so consumers can filter without matching on the payload.
    fn subject_id(&self) -> Uuid;
}
