use storehouse_core::Aggregate;

/// Run one command against an aggregate: decide, then apply each event in order.
///
/// Returns the applied events. On rejection nothing is applied. Debug builds also
/// verify the version moved by exactly the number of events and that the
/// aggregate's invariants still hold.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: Aggregate,
{
    let events = aggregate.handle(command)?;
    let before = aggregate.version();
    for event in &events {
        aggregate.apply(event);
    }
    debug_assert_eq!(aggregate.version(), before + events.len() as u64);
    debug_assert!(aggregate.check_invariants().is_ok());
    Ok(events)
}
