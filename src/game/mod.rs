/// Game-state bookkeeping
///
/// Pure state with no I/O: the monitor feeds confirmed readings in, consumers
/// get `GameView` snapshots out.

pub mod inventory;
pub mod tracker;
pub mod view;

pub use inventory::CardInventory;
pub use tracker::{CommitOutcome, CommittedAction, GamePhase, GameStateTracker, TurnState, Winner};
pub use view::GameView;
