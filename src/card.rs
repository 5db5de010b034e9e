/// Card identities and fixed-size count tables
///
/// Only rank matters for legality and bookkeeping, so every physical card is
/// reduced to one of 15 `CardSymbol`s. Counts are kept in a `[u8; 15]` table
/// indexed by symbol.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of physical cards in a deck (52 + two jokers)
pub const DECK_SIZE: u32 = 54;

/// Number of distinct rank identities
pub const SYMBOL_COUNT: usize = 15;

/// Hand size of the landlord right after the bonus cards are handed over
pub const LANDLORD_HAND: u32 = 20;

/// Hand size of each peasant at the start of a round
pub const PEASANT_HAND: u32 = 17;

/// Number of landlord bonus cards
pub const BONUS_CARDS: u32 = 3;

/// Rank identity of a card, ordered by game strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum CardSymbol {
    Three = 0,
    Four = 1,
    Five = 2,
    Six = 3,
    Seven = 4,
    Eight = 5,
    Nine = 6,
    Ten = 7,
    Jack = 8,
    Queen = 9,
    King = 10,
    Ace = 11,
    Two = 12,
    SmallJoker = 13,
    BigJoker = 14,
}

impl CardSymbol {
    pub const ALL: [CardSymbol; SYMBOL_COUNT] = [
        CardSymbol::Three,
        CardSymbol::Four,
        CardSymbol::Five,
        CardSymbol::Six,
        CardSymbol::Seven,
        CardSymbol::Eight,
        CardSymbol::Nine,
        CardSymbol::Ten,
        CardSymbol::Jack,
        CardSymbol::Queen,
        CardSymbol::King,
        CardSymbol::Ace,
        CardSymbol::Two,
        CardSymbol::SmallJoker,
        CardSymbol::BigJoker,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        if index < SYMBOL_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    pub const fn is_joker(self) -> bool {
        matches!(self, CardSymbol::SmallJoker | CardSymbol::BigJoker)
    }

    /// How many physical cards of this rank exist in a deck
    pub const fn deck_multiplicity(self) -> u8 {
        if self.is_joker() {
            1
        } else {
            4
        }
    }

    /// Parse the short label used in logs and config files
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|symbol| symbol.label() == label)
    }

    pub const fn label(self) -> &'static str {
        match self {
            CardSymbol::Three => "3",
            CardSymbol::Four => "4",
            CardSymbol::Five => "5",
            CardSymbol::Six => "6",
            CardSymbol::Seven => "7",
            CardSymbol::Eight => "8",
            CardSymbol::Nine => "9",
            CardSymbol::Ten => "10",
            CardSymbol::Jack => "J",
            CardSymbol::Queen => "Q",
            CardSymbol::King => "K",
            CardSymbol::Ace => "A",
            CardSymbol::Two => "2",
            CardSymbol::SmallJoker => "X",
            CardSymbol::BigJoker => "D",
        }
    }
}

impl fmt::Display for CardSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Seating position relative to the local player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Seat {
    /// The local player (bottom of the screen)
    Own = 0,
    /// The player acting after the local player (right side)
    Down = 1,
    /// The player acting before the local player (left side)
    Up = 2,
}

impl Seat {
    pub const ALL: [Seat; 3] = [Seat::Own, Seat::Down, Seat::Up];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Self {
        match index % 3 {
            0 => Seat::Own,
            1 => Seat::Down,
            _ => Seat::Up,
        }
    }

    /// Seat that acts after this one
    pub const fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Seat::Own => "own",
            Seat::Down => "down",
            Seat::Up => "up",
        };
        f.write_str(text)
    }
}

/// Multiset of card symbols stored as a fixed-size count table
///
/// Used both for one frame's detection and for the remaining inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CardCounts([u8; SYMBOL_COUNT]);

/// Per-symbol counts observed in one region of one sampled frame
pub type Detection = CardCounts;

impl CardCounts {
    pub const fn empty() -> Self {
        Self([0; SYMBOL_COUNT])
    }

    /// Counts of a complete 54-card deck
    pub fn full_deck() -> Self {
        let mut counts = Self::empty();
        for symbol in CardSymbol::ALL {
            counts.set(symbol, symbol.deck_multiplicity());
        }
        counts
    }

    pub fn from_cards(cards: &[CardSymbol]) -> Self {
        let mut counts = Self::empty();
        for &card in cards {
            counts.add(card, 1);
        }
        counts
    }

    pub fn get(&self, symbol: CardSymbol) -> u8 {
        self.0[symbol.index()]
    }

    pub fn set(&mut self, symbol: CardSymbol, count: u8) {
        self.0[symbol.index()] = count;
    }

    pub fn add(&mut self, symbol: CardSymbol, count: u8) {
        let slot = &mut self.0[symbol.index()];
        *slot = slot.saturating_add(count);
    }

    /// Total number of card instances
    pub fn total(&self) -> u32 {
        self.0.iter().map(|&c| c as u32).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&c| c == 0)
    }

    /// Non-zero entries in rank order
    pub fn iter(&self) -> impl Iterator<Item = (CardSymbol, u8)> + '_ {
        CardSymbol::ALL
            .into_iter()
            .map(|symbol| (symbol, self.get(symbol)))
            .filter(|&(_, count)| count > 0)
    }

    /// True when every count here fits inside `other`
    pub fn fits_within(&self, other: &CardCounts) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a <= b)
    }

    /// Subtract `other`, or `None` if any count would go negative
    pub fn checked_sub(&self, other: &CardCounts) -> Option<CardCounts> {
        let mut out = *self;
        for (slot, &take) in out.0.iter_mut().zip(other.0.iter()) {
            *slot = slot.checked_sub(take)?;
        }
        Some(out)
    }

    /// Subtract `other`, clamping each entry at zero
    pub fn saturating_sub(&self, other: &CardCounts) -> CardCounts {
        let mut out = *self;
        for (slot, &take) in out.0.iter_mut().zip(other.0.iter()) {
            *slot = slot.saturating_sub(take);
        }
        out
    }

    /// Expand into a sorted list of card instances
    pub fn to_cards(&self) -> Vec<CardSymbol> {
        self.iter()
            .flat_map(|(symbol, count)| std::iter::repeat(symbol).take(count as usize))
            .collect()
    }
}

impl fmt::Display for CardCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, card) in self.to_cards().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{card}")?;
        }
        f.write_str("]")
    }
}

impl FromIterator<(CardSymbol, u8)> for CardCounts {
    fn from_iter<I: IntoIterator<Item = (CardSymbol, u8)>>(iter: I) -> Self {
        let mut counts = CardCounts::empty();
        for (symbol, count) in iter {
            counts.add(symbol, count);
        }
        counts
    }
}
