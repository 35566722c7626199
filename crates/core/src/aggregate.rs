//! Decide/evolve traits for the command side of the domain.

/// Identity and version of a consistency boundary.
pub trait AggregateRoot {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Number of events applied since creation or the last restore.
    fn version(&self) -> u64;
}

/// Command handling split into a pure decision and an infallible evolution.
///
/// `handle` checks every precondition against current state and returns the
/// events to record; `apply` folds one event into state and must not fail.
/// A rejected command therefore leaves the aggregate exactly as it was.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    /// Evolve state from one accepted event and bump `version()` by one.
    fn apply(&mut self, event: &Self::Event);

    /// Decide which events a command produces. Never mutates.
    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Structural invariants that must hold between commands.
    fn check_invariants(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}
