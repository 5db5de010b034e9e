/// Decision-engine seam
///
/// Move evaluation lives outside this crate. An engine sees only immutable
/// `GameView` snapshots and answers with a suggested action.
use serde::Serialize;

use crate::card::CardCounts;
use crate::game::GameView;

/// A suggested action; empty `action` means pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hint {
    pub action: CardCounts,
    /// Engine-specific score in [-1, 1]
    pub confidence: f32,
}

pub trait DecisionEngine: Send {
    /// Suggest a move for the seat to act, or `None` if the engine has no opinion
    fn hint(&self, view: &GameView) -> Option<Hint>;

    /// The move the engine would make; defaults to the hinted action or a pass
    fn act(&self, view: &GameView) -> CardCounts {
        self.hint(view).map(|hint| hint.action).unwrap_or_default()
    }
}
