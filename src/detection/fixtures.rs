/// Synthetic table frames for unit tests
///
/// Glyphs are seeded random colour patterns, so every template matches its
/// own pastes exactly and nothing else. Frames use a small layout to keep
/// matching fast.
use std::collections::HashMap;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::assets::{strip_card, AssetBundle, AssetImages, TemplateGeometry, Tint, DIGIT_COUNT};
use super::layout::Layout;
use super::table::TableReader;
use crate::capture::Region;
use crate::card::{CardSymbol, Seat, DECK_SIZE, LANDLORD_HAND, PEASANT_HAND};
use crate::config::Thresholds;

pub const BACKGROUND: Rgb<u8> = Rgb([120, 120, 120]);
pub const MARGIN: (u32, u32) = (30, 20);

pub type Face = (CardSymbol, Tint);

fn random_glyph(rng: &mut StdRng, width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |_, _| {
        Rgb([
            rng.gen_range(40..=230),
            rng.gen_range(40..=230),
            rng.gen_range(40..=230),
        ])
    })
}

pub fn geometry() -> TemplateGeometry {
    TemplateGeometry {
        show_rows: 12,
        played_rows: 10,
        bonus_width: 6,
        bonus_height: 10,
        bonus_rows: 8,
    }
}

pub fn layout() -> Layout {
    Layout {
        canonical_width: 320,
        canonical_height: 200,
        show: Region::new(0, 150, 320, 50),
        own_played: Region::new(40, 75, 200, 35),
        down_played: Region::new(170, 35, 150, 35),
        up_played: Region::new(0, 35, 150, 35),
        bonus: Region::new(110, 0, 100, 30),
        own_pass: Region::new(250, 75, 70, 35),
        down_pass: Region::new(170, 35, 150, 35),
        up_pass: Region::new(0, 35, 150, 35),
        landlord_own: Region::new(140, 115, 40, 30),
        landlord_down: Region::new(280, 115, 40, 30),
        landlord_up: Region::new(0, 115, 40, 30),
        counts_down: Region::new(280, 0, 40, 30),
        counts_up: Region::new(0, 0, 40, 30),
    }
}

/// The first `n` cards of a sorted deck, suits cycling black, red, red, black
pub fn dealt_cards(n: u32) -> Vec<Face> {
    const SUITS: [Tint; 4] = [Tint::Black, Tint::Red, Tint::Red, Tint::Black];
    CardSymbol::ALL
        .into_iter()
        .filter(|symbol| !symbol.is_joker())
        .flat_map(|symbol| SUITS.map(|tint| (symbol, tint)))
        .take(n as usize)
        .collect()
}

/// What to draw on one canonical frame
#[derive(Debug, Clone, Default)]
pub struct TableScene {
    pub hand: Vec<Face>,
    pub played: [Vec<Face>; 3],
    pub passed: [bool; 3],
    pub bonus: Vec<Face>,
    pub landlord: Option<Seat>,
    pub counts: [Option<u32>; 3],
}

impl TableScene {
    /// Deal screen with `landlord` holding the badge and every hand at dealt size
    pub fn deal(landlord: Seat) -> Self {
        let dealt = |seat: Seat| if seat == landlord { LANDLORD_HAND } else { PEASANT_HAND };
        let mut counts = [None; 3];
        for seat in [Seat::Down, Seat::Up] {
            counts[seat.index()] = Some(dealt(seat));
        }
        Self {
            hand: dealt_cards(dealt(Seat::Own)),
            bonus: vec![
                (CardSymbol::Two, Tint::Black),
                (CardSymbol::Ace, Tint::Red),
                (CardSymbol::BigJoker, Tint::Red),
            ],
            landlord: Some(landlord),
            counts,
            ..Self::default()
        }
    }

    pub fn hand(mut self, cards: &[Face]) -> Self {
        self.hand = cards.to_vec();
        self
    }

    pub fn played(mut self, seat: Seat, cards: &[Face]) -> Self {
        self.played[seat.index()] = cards.to_vec();
        self
    }

    pub fn passed(mut self, seat: Seat) -> Self {
        self.passed[seat.index()] = true;
        self
    }

    pub fn counts(mut self, seat: Seat, value: u32) -> Self {
        self.counts[seat.index()] = Some(value);
        self
    }

    pub fn landlord_at(mut self, seat: Seat) -> Self {
        self.landlord = Some(seat);
        self
    }

    pub fn without_landlord(mut self) -> Self {
        self.landlord = None;
        self
    }
}

pub struct Fixture {
    show: HashMap<Face, RgbImage>,
    side: HashMap<Face, RgbImage>,
    digits: Vec<RgbImage>,
    pass: RgbImage,
    landlord: RgbImage,
    pub layout: Layout,
    pub geometry: TemplateGeometry,
    pub assets: Arc<AssetBundle>,
}

impl Fixture {
    pub fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(0x00d0_d12u64);
        let geometry = geometry();

        let mut show = HashMap::new();
        let mut side = HashMap::new();
        for index in 0..DECK_SIZE as usize {
            if let Some(face) = strip_card(index) {
                show.entry(face).or_insert_with(|| random_glyph(&mut rng, 8, 14));
                side.entry(face).or_insert_with(|| random_glyph(&mut rng, 8, 12));
            }
        }
        let digits: Vec<RgbImage> = (0..DIGIT_COUNT).map(|_| random_glyph(&mut rng, 8, 10)).collect();
        let pass = random_glyph(&mut rng, 24, 10);
        let landlord = random_glyph(&mut rng, 12, 12);

        let strip = |faces: &HashMap<Face, RgbImage>, w: u32, h: u32| {
            let mut strip = RgbImage::new(w * DECK_SIZE, h);
            for index in 0..DECK_SIZE {
                if let Some(face) = strip_card(index as usize) {
                    imageops::replace(&mut strip, &faces[&face], (index * w) as i64, 0);
                }
            }
            strip
        };
        let mut counts = RgbImage::new(8 * DIGIT_COUNT, 10);
        for (i, digit) in digits.iter().enumerate() {
            imageops::replace(&mut counts, digit, (i as u32 * 8) as i64, 0);
        }

        let images = AssetImages {
            show: strip(&show, 8, 14),
            side: strip(&side, 8, 12),
            counts,
            pass: pass.clone(),
            landlord: landlord.clone(),
            bonus_red_joker: None,
            bonus_black_joker: None,
        };
        let assets = Arc::new(
            AssetBundle::from_images(images, &geometry).expect("synthetic assets are well formed"),
        );

        Self {
            show,
            side,
            digits,
            pass,
            landlord,
            layout: layout(),
            geometry,
            assets,
        }
    }

    pub fn reader(&self) -> TableReader {
        TableReader::new(Arc::clone(&self.assets), self.layout.clone(), Thresholds::default())
    }

    pub fn show_glyph(&self, face: Face) -> RgbImage {
        imageops::crop_imm(&self.show[&face], 0, 0, 8, self.geometry.show_rows).to_image()
    }

    pub fn played_glyph(&self, face: Face) -> RgbImage {
        imageops::crop_imm(&self.side[&face], 0, 0, 8, self.geometry.played_rows).to_image()
    }

    pub fn bonus_glyph(&self, face: Face) -> RgbImage {
        let g = &self.geometry;
        let scaled = imageops::resize(&self.show[&face], g.bonus_width, g.bonus_height, FilterType::Triangle);
        imageops::crop_imm(&scaled, 0, 0, g.bonus_width, g.bonus_rows).to_image()
    }

    pub fn landlord_glyph(&self) -> RgbImage {
        self.landlord.clone()
    }

    pub fn digit_glyph(&self, value: u32) -> RgbImage {
        self.digits[value as usize].clone()
    }

    pub fn paste_row(frame: &mut RgbImage, region: Region, glyphs: impl IntoIterator<Item = RgbImage>) {
        for (i, glyph) in glyphs.into_iter().enumerate() {
            let x = region.x + 4 + i as u32 * (glyph.width() + 2);
            imageops::replace(frame, &glyph, x as i64, (region.y + 4) as i64);
        }
    }

    /// Canonical-resolution frame showing `scene`
    pub fn render(&self, scene: &TableScene) -> RgbImage {
        let layout = &self.layout;
        let mut frame =
            RgbImage::from_pixel(layout.canonical_width, layout.canonical_height, BACKGROUND);

        Self::paste_row(&mut frame, layout.show, scene.hand.iter().map(|&f| self.show_glyph(f)));
        Self::paste_row(&mut frame, layout.bonus, scene.bonus.iter().map(|&f| self.bonus_glyph(f)));

        for seat in Seat::ALL {
            let played = &scene.played[seat.index()];
            Self::paste_row(&mut frame, layout.played(seat), played.iter().map(|&f| self.played_glyph(f)));

            if scene.passed[seat.index()] {
                let region = layout.pass(seat);
                // Below any played cards so both can coexist in a shared region
                let y = region.y + region.h - self.pass.height() - 2;
                imageops::replace(&mut frame, &self.pass, (region.x + 4) as i64, y as i64);
            }

            if let (Some(value), Some(region)) = (scene.counts[seat.index()], layout.counts(seat)) {
                if let Some(digit) = self.digits.get(value as usize) {
                    Self::paste_row(&mut frame, region, [digit.clone()]);
                }
            }
        }

        if let Some(seat) = scene.landlord {
            Self::paste_row(&mut frame, layout.landlord(seat), [self.landlord.clone()]);
        }

        frame
    }

    /// Raw capture: the canonical frame inset in a pure-white window
    pub fn render_raw(&self, scene: &TableScene) -> RgbImage {
        let canonical = self.render(scene);
        let mut raw = RgbImage::from_pixel(
            canonical.width() + 2 * MARGIN.0,
            canonical.height() + 2 * MARGIN.1,
            Rgb([255, 255, 255]),
        );
        imageops::replace(&mut raw, &canonical, MARGIN.0 as i64, MARGIN.1 as i64);
        raw
    }
}
