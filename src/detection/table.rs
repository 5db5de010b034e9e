/// Composite reads over a whole canonical frame
///
/// `TableReader` wires the recognizers and marker detectors to the layout and
/// thresholds, and answers the questions the monitor asks each tick: what did
/// the acting seat just do, and does this frame show a freshly dealt game.
use std::sync::Arc;

use image::RgbImage;
use serde::Serialize;

use super::assets::AssetBundle;
use super::detector::Detector;
use super::layout::Layout;
use super::markers::{CountDetector, PassDetector, RoleDetector};
use super::recognizer::TemplateRecognizer;
use super::relax::{relax, RelaxedDetection, Relaxation};
use crate::card::{Detection, Seat, BONUS_CARDS, LANDLORD_HAND, PEASANT_HAND};
use crate::config::Thresholds;

/// What one seat's regions show in one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct ActionSample {
    pub cards: Detection,
    pub passed: bool,
}

impl ActionSample {
    /// Neither cards nor a pass banner: the seat is still deciding
    pub fn is_idle(&self) -> bool {
        self.cards.is_empty() && !self.passed
    }
}

/// Everything needed to open a game, read off the deal screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartSignature {
    pub landlord: Seat,
    pub own_hand: Detection,
    pub bonus: Detection,
    /// Remaining cards per seat, indexed by `Seat::index`
    pub hand_counts: [u32; 3],
}

/// Every reader's output on one frame, for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct TableSnapshot {
    pub landlord: Option<Seat>,
    pub own_hand: Detection,
    pub bonus: Detection,
    pub bonus_threshold: f32,
    pub actions: [ActionSample; 3],
    pub hand_counts: [u32; 3],
}

pub struct TableReader {
    assets: Arc<AssetBundle>,
    layout: Layout,
    thresholds: Thresholds,
    role: RoleDetector,
    counts: [Option<CountDetector>; 3],
    passes: [PassDetector; 3],
}

impl TableReader {
    pub fn new(assets: Arc<AssetBundle>, layout: Layout, thresholds: Thresholds) -> Self {
        let role = RoleDetector::new(Arc::clone(&assets), &layout, thresholds.landlord);
        let counts = Seat::ALL.map(|seat| {
            layout
                .counts(seat)
                .map(|region| CountDetector::new(Arc::clone(&assets), region, thresholds.counts))
        });
        let passes = Seat::ALL
            .map(|seat| PassDetector::new(Arc::clone(&assets), layout.pass(seat), thresholds.pass));

        Self {
            assets,
            layout,
            thresholds,
            role,
            counts,
            passes,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Cards in the local player's hand
    pub fn read_show(&self, frame: &RgbImage) -> Detection {
        TemplateRecognizer::new(&self.assets.show).detect(frame, self.layout.show, self.thresholds.show)
    }

    pub fn read_action(&self, frame: &RgbImage, seat: Seat) -> ActionSample {
        let cards = TemplateRecognizer::new(&self.assets.played).detect(
            frame,
            self.layout.played(seat),
            self.thresholds.played,
        );
        let passed = self.passes[seat.index()].detect(frame);

        // Opponents' pass banner sits on top of their played-cards area
        let cards = if passed && seat != Seat::Own {
            Detection::empty()
        } else {
            cards
        };

        ActionSample { cards, passed }
    }

    /// Landlord bonus cards via the relaxation sweep
    pub fn read_bonus(&self, frame: &RgbImage) -> RelaxedDetection {
        let scores = TemplateRecognizer::new(&self.assets.bonus).scores(
            frame,
            self.layout.bonus,
            self.thresholds.bonus_floor,
        );
        let schedule = Relaxation::bonus_cards(
            self.thresholds.bonus_start,
            self.thresholds.bonus_floor,
            self.thresholds.bonus_step,
        );
        relax(&schedule, |confidence| scores.detection_at(confidence))
    }

    pub fn read_landlord(&self, frame: &RgbImage) -> Option<Seat> {
        self.role.detect(frame)
    }

    /// Opponent counters come from the digit detector; the local count is the hand size
    pub fn read_count(&self, frame: &RgbImage, seat: Seat) -> u32 {
        match &self.counts[seat.index()] {
            Some(detector) => detector.detect(frame),
            None => self.read_show(frame).total(),
        }
    }

    /// A deal screen: landlord known, bonus cards visible, every hand at its dealt size
    pub fn read_start(&self, frame: &RgbImage) -> Option<StartSignature> {
        let landlord = self.read_landlord(frame)?;

        let bonus = self.read_bonus(frame).counts;
        if bonus.total() < BONUS_CARDS {
            return None;
        }

        let own_hand = self.read_show(frame);
        let hand_counts = Seat::ALL.map(|seat| match seat {
            Seat::Own => own_hand.total(),
            _ => self.read_count(frame, seat),
        });

        let dealt = Seat::ALL.iter().all(|&seat| {
            let expected = if seat == landlord { LANDLORD_HAND } else { PEASANT_HAND };
            hand_counts[seat.index()] == expected
        });
        if !dealt {
            return None;
        }

        Some(StartSignature {
            landlord,
            own_hand,
            bonus,
            hand_counts,
        })
    }

    pub fn snapshot(&self, frame: &RgbImage) -> TableSnapshot {
        let own_hand = self.read_show(frame);
        let bonus = self.read_bonus(frame);
        TableSnapshot {
            landlord: self.read_landlord(frame),
            own_hand,
            bonus: bonus.counts,
            bonus_threshold: bonus.threshold,
            actions: Seat::ALL.map(|seat| self.read_action(frame, seat)),
            hand_counts: Seat::ALL.map(|seat| match seat {
                Seat::Own => own_hand.total(),
                _ => self.read_count(frame, seat),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardSymbol;
    use crate::detection::assets::Tint;
    use crate::detection::fixtures::{Fixture, TableScene};

    #[test]
    fn reads_played_cards_and_pass() {
        let fixture = Fixture::new();
        let reader = fixture.reader();

        let scene = TableScene::default()
            .played(Seat::Down, &[(CardSymbol::Five, Tint::Red), (CardSymbol::Five, Tint::Black)])
            .passed(Seat::Up);
        let frame = fixture.render(&scene);

        let down = reader.read_action(&frame, Seat::Down);
        assert_eq!(down.cards.get(CardSymbol::Five), 2);
        assert!(!down.passed);

        let up = reader.read_action(&frame, Seat::Up);
        assert!(up.passed);
        assert!(up.cards.is_empty());

        assert!(reader.read_action(&frame, Seat::Own).is_idle());
    }

    #[test]
    fn reads_start_signature_on_deal_screen() {
        let fixture = Fixture::new();
        let reader = fixture.reader();
        let scene = TableScene::deal(Seat::Down);
        let frame = fixture.render(&scene);

        let start = reader.read_start(&frame).unwrap();
        assert_eq!(start.landlord, Seat::Down);
        assert_eq!(start.own_hand.total(), PEASANT_HAND);
        assert_eq!(start.bonus.total(), BONUS_CARDS);
        assert_eq!(start.hand_counts, [17, 20, 17]);
    }

    #[test]
    fn mid_game_counts_are_not_a_start() {
        let fixture = Fixture::new();
        let reader = fixture.reader();
        let scene = TableScene::deal(Seat::Down).counts(Seat::Down, 18);
        let frame = fixture.render(&scene);

        assert!(reader.read_start(&frame).is_none());
        assert_eq!(reader.read_count(&frame, Seat::Down), 18);
    }

    #[test]
    fn no_landlord_is_not_a_start() {
        let fixture = Fixture::new();
        let reader = fixture.reader();
        let scene = TableScene::deal(Seat::Up).without_landlord();
        let frame = fixture.render(&scene);

        assert!(reader.read_start(&frame).is_none());
        assert_eq!(reader.read_landlord(&frame), None);
    }
}
