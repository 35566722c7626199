//! Records with their own identity inside an aggregate.

use core::fmt;
use core::hash::Hash;

/// A record owned by an aggregate (a location, a receipt, a movement).
///
/// Entities are keyed by `id()` in the aggregate's indexes; two entities of the
/// same kind never share an id.
pub trait Entity {
    /// Record kind used in error messages and logs, e.g. `"location"`.
    const KIND: &'static str;

    type Id: Copy + Eq + Hash + fmt::Debug + fmt::Display;

    fn id(&self) -> &Self::Id;

    /// `"<kind> <id>"`, for not-found and conflict messages.
    fn label(&self) -> String {
        format!("{} {}", Self::KIND, self.id())
    }
}
