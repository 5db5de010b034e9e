use serde::Serialize;

use super::tracker::{CommittedAction, GamePhase, Winner};
use crate::card::{CardCounts, Seat};

/// Immutable snapshot of one round, handed to event consumers and the decision engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameView {
    pub phase: GamePhase,
    /// Seat expected to act next; `None` unless a round is in progress
    pub acting: Option<Seat>,
    pub landlord: Option<Seat>,
    pub hand_counts: [u32; 3],
    /// Cards still held by the local player
    pub own_hand: CardCounts,
    pub bonus: CardCounts,
    /// Every card not yet played, the local hand included
    pub remaining: CardCounts,
    /// Cards held by the two opponents combined
    pub unseen: CardCounts,
    pub history: Vec<CommittedAction>,
    pub winner: Option<Winner>,
}

impl GameView {
    /// The play the acting seat has to beat.
    ///
    /// `None` when the seat leads, which is the case at the start of a round
    /// and after the two other seats have passed.
    pub fn last_move(&self) -> Option<&CommittedAction> {
        self.history
            .iter()
            .rev()
            .take(2)
            .find(|action| !action.passed)
    }

    pub fn hand_count(&self, seat: Seat) -> u32 {
        self.hand_counts[seat.index()]
    }
}
