/// Fixed detection regions inside the canonical frame
///
/// Every region is a pixel offset into the frame produced by the area
/// locator, which always resizes the locked game area to
/// `canonical_width` x `canonical_height`.
use serde::{Deserialize, Serialize};

use crate::capture::Region;
use crate::card::Seat;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub canonical_width: u32,
    pub canonical_height: u32,

    /// Local player's hand along the bottom edge
    pub show: Region,

    /// Cards just played by each seat
    pub own_played: Region,
    pub down_played: Region,
    pub up_played: Region,

    /// The three landlord bonus cards at the top
    pub bonus: Region,

    /// "Pass" banners
    pub own_pass: Region,
    pub down_pass: Region,
    pub up_pass: Region,

    /// Landlord badge candidates, one per seat
    pub landlord_own: Region,
    pub landlord_down: Region,
    pub landlord_up: Region,

    /// Remaining-card counters next to each opponent
    pub counts_down: Region,
    pub counts_up: Region,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            canonical_width: 1843,
            canonical_height: 1036,
            show: Region::new(10, 620, 1800, 220),
            own_played: Region::new(550, 350, 700, 300),
            down_played: Region::new(900, 200, 700, 280),
            up_played: Region::new(200, 200, 700, 280),
            bonus: Region::new(800, 0, 220, 150),
            own_pass: Region::new(780, 530, 300, 100),
            down_pass: Region::new(900, 200, 700, 280),
            up_pass: Region::new(200, 200, 700, 280),
            landlord_own: Region::new(40, 880, 250, 200),
            landlord_down: Region::new(1550, 220, 250, 200),
            landlord_up: Region::new(40, 220, 250, 200),
            counts_down: Region::new(1550, 400, 150, 150),
            counts_up: Region::new(150, 400, 150, 150),
        }
    }
}

impl Layout {
    pub fn played(&self, seat: Seat) -> Region {
        match seat {
            Seat::Own => self.own_played,
            Seat::Down => self.down_played,
            Seat::Up => self.up_played,
        }
    }

    pub fn pass(&self, seat: Seat) -> Region {
        match seat {
            Seat::Own => self.own_pass,
            Seat::Down => self.down_pass,
            Seat::Up => self.up_pass,
        }
    }

    pub fn landlord(&self, seat: Seat) -> Region {
        match seat {
            Seat::Own => self.landlord_own,
            Seat::Down => self.landlord_down,
            Seat::Up => self.landlord_up,
        }
    }

    /// Opponent counter region; the local hand is counted from `show`
    pub fn counts(&self, seat: Seat) -> Option<Region> {
        match seat {
            Seat::Own => None,
            Seat::Down => Some(self.counts_down),
            Seat::Up => Some(self.counts_up),
        }
    }

    /// Every named region, for validation and probe output
    pub fn named_regions(&self) -> [(&'static str, Region); 14] {
        [
            ("show", self.show),
            ("own_played", self.own_played),
            ("down_played", self.down_played),
            ("up_played", self.up_played),
            ("bonus", self.bonus),
            ("own_pass", self.own_pass),
            ("down_pass", self.down_pass),
            ("up_pass", self.up_pass),
            ("landlord_own", self.landlord_own),
            ("landlord_down", self.landlord_down),
            ("landlord_up", self.landlord_up),
            ("counts_down", self.counts_down),
            ("counts_up", self.counts_up),
            (
                "canonical",
                Region::new(0, 0, self.canonical_width, self.canonical_height),
            ),
        ]
    }
}
