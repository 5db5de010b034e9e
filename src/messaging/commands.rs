/// Command types for the monitor
///
/// Commands represent requests to perform actions (imperative).
/// They are queued by a `MonitorHandle` and drained by the monitor thread
/// once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorCommand {
    /// Forget the locked game area and localize again
    ResetArea,

    /// Discard the current round and wait for the next deal
    ResetGame,

    /// Leave the polling loop after the current tick
    Stop,
}
