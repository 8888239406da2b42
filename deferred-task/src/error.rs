/// Errors produced by the engine-supplied hosts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
  /// A fuel-limited microtask checkpoint ran out of fuel before the queue drained.
  ///
  /// Undrained jobs stay queued; a later checkpoint may resume them.
  #[error("microtask checkpoint ran out of fuel after {fuel} jobs")]
  OutOfFuel { fuel: u64 },
}
