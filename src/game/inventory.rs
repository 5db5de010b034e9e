use crate::card::{CardCounts, Detection};
use crate::error::CommitRejected;

/// Authoritative count of cards not yet played
///
/// Starts at the full 54-card deck and only ever shrinks through `commit`,
/// so `remaining().total() + committed_total() == 54` holds at every step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardInventory {
    remaining: CardCounts,
    committed: u32,
}

impl Default for CardInventory {
    fn default() -> Self {
        Self::new()
    }
}

impl CardInventory {
    pub fn new() -> Self {
        Self {
            remaining: CardCounts::full_deck(),
            committed: 0,
        }
    }

    pub fn remaining(&self) -> CardCounts {
        self.remaining
    }

    /// Cards committed since the last reset
    pub fn committed_total(&self) -> u32 {
        self.committed
    }

    /// True when every requested count is still available
    pub fn validate(&self, detection: &Detection) -> bool {
        detection.fits_within(&self.remaining)
    }

    /// First symbol that would go negative, with its requested and remaining counts
    pub fn violation(&self, detection: &Detection) -> Option<CommitRejected> {
        detection
            .iter()
            .find(|&(symbol, count)| count > self.remaining.get(symbol))
            .map(|(symbol, requested)| CommitRejected::InventoryExceeded {
                symbol,
                requested,
                remaining: self.remaining.get(symbol),
            })
    }

    /// Remove `detection` from the remaining counts.
    ///
    /// Rejects without changing anything if the detection does not validate.
    /// Committing the same detection twice removes it twice.
    pub fn commit(&mut self, detection: &Detection) -> Result<(), CommitRejected> {
        if let Some(rejection) = self.violation(detection) {
            return Err(rejection);
        }
        self.remaining = self.remaining.saturating_sub(detection);
        self.committed += detection.total();
        Ok(())
    }

    /// Cards the local player cannot see: remaining minus their own hand
    pub fn unseen_by(&self, own_hand: &CardCounts) -> CardCounts {
        self.remaining.saturating_sub(own_hand)
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
