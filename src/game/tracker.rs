/// Round lifecycle and turn rotation
///
/// ```text
/// NotStarted --start--> InProgress --hand emptied--> Finished
///      ^                                                |
///      +-------------------- reset ---------------------+
/// ```
use serde::Serialize;
use tracing::{debug, info};

use super::inventory::CardInventory;
use super::view::GameView;
use crate::card::{CardCounts, Seat};
use crate::detection::{ActionSample, StartSignature};
use crate::error::CommitRejected;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GamePhase {
    #[default]
    NotStarted,
    InProgress,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Winner {
    Landlord,
    Peasants,
}

impl Winner {
    fn for_seat(seat: Seat, landlord: Option<Seat>) -> Self {
        if landlord == Some(seat) {
            Winner::Landlord
        } else {
            Winner::Peasants
        }
    }
}

/// A validated, debounced play
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommittedAction {
    pub seat: Seat,
    /// Empty for a pass
    pub cards: CardCounts,
    pub passed: bool,
    /// Zero-based position in the round's action history
    pub turn: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnState {
    pub acting: Seat,
    /// Cards left per seat, indexed by `Seat::index`
    pub hand_counts: [u32; 3],
    pub landlord: Option<Seat>,
    pub round_over: bool,
}

impl Default for TurnState {
    fn default() -> Self {
        Self {
            acting: Seat::Own,
            hand_counts: [0; 3],
            landlord: None,
            round_over: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The seat showed neither cards nor a pass; the turn stays put
    Idle,
    Committed {
        action: CommittedAction,
        finished: Option<Winner>,
    },
}

/// Single-writer owner of the inventory and turn state for one round
#[derive(Debug, Clone, Default)]
pub struct GameStateTracker {
    phase: GamePhase,
    turn: TurnState,
    inventory: CardInventory,
    own_hand: CardCounts,
    bonus: CardCounts,
    history: Vec<CommittedAction>,
    winner: Option<Winner>,
}

impl GameStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    pub fn inventory(&self) -> &CardInventory {
        &self.inventory
    }

    pub fn own_hand(&self) -> CardCounts {
        self.own_hand
    }

    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }

    /// Open a round from a confirmed deal screen; the landlord acts first
    pub fn start(&mut self, signature: &StartSignature) -> Result<(), CommitRejected> {
        if self.phase != GamePhase::NotStarted {
            return Err(CommitRejected::AlreadyStarted);
        }

        self.inventory.reset();
        self.turn = TurnState {
            acting: signature.landlord,
            hand_counts: signature.hand_counts,
            landlord: Some(signature.landlord),
            round_over: false,
        };
        self.own_hand = signature.own_hand;
        self.bonus = signature.bonus;
        self.history.clear();
        self.winner = None;
        self.phase = GamePhase::InProgress;

        info!(
            landlord = %signature.landlord,
            hand = %signature.own_hand,
            bonus = %signature.bonus,
            "Game started"
        );
        Ok(())
    }

    /// Apply the acting seat's confirmed sample.
    ///
    /// A pass commits an empty action and passes the turn. Cards must fit the
    /// inventory and the seat's remaining hand count. The local seat can only
    /// play cards it holds, and opponents only cards the local hand does not
    /// hold. A rejected sample changes nothing.
    pub fn commit(&mut self, sample: &ActionSample) -> Result<CommitOutcome, CommitRejected> {
        if self.phase != GamePhase::InProgress {
            return Err(CommitRejected::NotInProgress);
        }
        if sample.is_idle() {
            return Ok(CommitOutcome::Idle);
        }

        let seat = self.turn.acting;
        let cards = if sample.passed {
            CardCounts::empty()
        } else {
            sample.cards
        };

        if let Some(rejection) = self.inventory.violation(&cards) {
            return Err(rejection);
        }
        let held = self.turn.hand_counts[seat.index()];
        if cards.total() > held {
            return Err(CommitRejected::HandExceeded {
                seat,
                requested: cards.total(),
                remaining: held,
            });
        }
        if let Some(rejection) = self.ownership_violation(seat, &cards) {
            return Err(rejection);
        }

        self.inventory.commit(&cards)?;
        self.turn.hand_counts[seat.index()] = held - cards.total();
        if seat == Seat::Own {
            self.own_hand = self.own_hand.saturating_sub(&cards);
        }

        let action = CommittedAction {
            seat,
            cards,
            passed: cards.is_empty(),
            turn: self.history.len() as u32,
        };
        self.history.push(action.clone());
        debug!(%seat, %cards, turn = action.turn, "Action committed");

        let finished = if self.turn.hand_counts[seat.index()] == 0 {
            let winner = Winner::for_seat(seat, self.turn.landlord);
            self.phase = GamePhase::Finished;
            self.turn.round_over = true;
            self.winner = Some(winner);
            info!(%seat, ?winner, "Game finished");
            Some(winner)
        } else {
            self.turn.acting = seat.next();
            None
        };

        Ok(CommitOutcome::Committed { action, finished })
    }

    fn ownership_violation(&self, seat: Seat, cards: &CardCounts) -> Option<CommitRejected> {
        let pool = if seat == Seat::Own {
            self.own_hand
        } else {
            self.inventory.unseen_by(&self.own_hand)
        };
        let (symbol, requested, available) = cards
            .iter()
            .map(|(symbol, requested)| (symbol, requested, pool.get(symbol)))
            .find(|(_, requested, available)| requested > available)?;

        Some(if seat == Seat::Own {
            CommitRejected::NotInHand {
                symbol,
                requested,
                held: available,
            }
        } else {
            CommitRejected::UnseenExceeded {
                seat,
                symbol,
                requested,
                unseen: available,
            }
        })
    }

    /// Back to `NotStarted` with a full inventory
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Immutable snapshot for consumers
    pub fn view(&self) -> GameView {
        GameView {
            phase: self.phase,
            acting: (self.phase == GamePhase::InProgress).then_some(self.turn.acting),
            landlord: self.turn.landlord,
            hand_counts: self.turn.hand_counts,
            own_hand: self.own_hand,
            bonus: self.bonus,
            remaining: self.inventory.remaining(),
            unseen: self.inventory.unseen_by(&self.own_hand),
            history: self.history.clone(),
            winner: self.winner,
        }
    }
}
