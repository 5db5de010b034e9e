/// Event types for the monitor
///
/// Events represent things that have happened (past tense).
/// They are broadcast to all subscribers and carry owned snapshots only.
use crate::agent::Hint;
use crate::capture::Region;
use crate::card::{CardCounts, Seat};
use crate::detection::ActionSample;
use crate::error::CommitRejected;
use crate::game::{CommittedAction, GameView, Winner};
use crate::state::ProcessState;

#[derive(Debug, Clone)]
pub enum Event {
    /// Monitor thread lifecycle changed
    ProcessStateChanged {
        old_state: ProcessState,
        new_state: ProcessState,
    },

    /// The game area was found and locked
    AreaLocked { region: Region },

    /// The area lock was cleared on request
    AreaReset,

    /// A deal screen was confirmed and a round opened
    GameStarted {
        landlord: Seat,
        own_hand: CardCounts,
        bonus: CardCounts,
    },

    /// A seat's play or pass was confirmed and applied
    ActionCommitted {
        action: CommittedAction,
        view: GameView,
    },

    /// The decision engine suggested a move for the acting seat
    HintReady { seat: Seat, hint: Hint },

    /// A confirmed reading contradicted the game state and was discarded
    AnomalyDetected {
        seat: Seat,
        sample: ActionSample,
        reason: CommitRejected,
    },

    /// A seat emptied its hand
    GameFinished { seat: Seat, winner: Winner },

    /// The round was discarded on request
    GameReset,

    /// One tick failed; monitoring carries on
    TickFailed { message: String },

    /// Monitor is shutting down
    Shutdown,
}

impl Event {
    /// Short label for logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::ProcessStateChanged { .. } => "process_state_changed",
            Event::AreaLocked { .. } => "area_locked",
            Event::AreaReset => "area_reset",
            Event::GameStarted { .. } => "game_started",
            Event::ActionCommitted { .. } => "action_committed",
            Event::HintReady { .. } => "hint_ready",
            Event::AnomalyDetected { .. } => "anomaly_detected",
            Event::GameFinished { .. } => "game_finished",
            Event::GameReset => "game_reset",
            Event::TickFailed { .. } => "tick_failed",
            Event::Shutdown => "shutdown",
        }
    }
}
