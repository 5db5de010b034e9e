//! Synthetic install for end-to-end tests
//!
//! Every template is a pure function of what it depicts, so a scene can be
//! drawn without keeping the glyphs around. The strips are written out as the
//! PNG files a real install ships and read back through `AssetBundle::load`.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use doudizhu_monitor::capture::{FrameSource, Region};
use doudizhu_monitor::card::{CardSymbol, Seat, DECK_SIZE};
use doudizhu_monitor::config::Config;
use doudizhu_monitor::detection::assets::{strip_card, DIGIT_COUNT};
use doudizhu_monitor::detection::{AssetBundle, Layout, TemplateGeometry, Tint};
use doudizhu_monitor::error::CaptureError;
use doudizhu_monitor::messaging::Event;

pub type Face = (CardSymbol, Tint);

/// Upper bound on the wait for any single expected event
const EVENT_TIMEOUT: Duration = Duration::from_secs(60);

const GLYPH_WIDTH: u32 = 8;
const SHOW_HEIGHT: u32 = 14;
const SIDE_HEIGHT: u32 = 12;
const DIGIT_HEIGHT: u32 = 10;

const SIDE_KEYS: u32 = 1 << 8;
const DIGIT_KEYS: u32 = 2 << 8;
const PASS_KEY: u32 = 3 << 8;
const LANDLORD_KEY: u32 = 4 << 8;

/// Colour noise keyed by `key`. Cropping the top rows equals drawing fewer rows.
fn glyph(key: u32, width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let mut v = key.wrapping_mul(0x9e37_79b9) ^ (y * width + x).wrapping_mul(0x85eb_ca6b);
        v ^= v >> 15;
        v = v.wrapping_mul(0x2c1b_3c6d);
        v ^= v >> 12;
        Rgb([
            40 + (v % 191) as u8,
            40 + ((v >> 8) % 191) as u8,
            40 + ((v >> 16) % 191) as u8,
        ])
    })
}

fn face_key((symbol, tint): Face) -> u32 {
    symbol as u32 * 2 + tint as u32
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

fn layout() -> Layout {
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

/// One frame's worth of table content
#[derive(Debug, Clone, Default)]
pub struct Scene {
    hand: Vec<Face>,
    played: [Vec<Face>; 3],
    passed: [bool; 3],
    dealt_to: Option<Seat>,
}

impl Scene {
    /// Fresh deal: badge on `landlord`, three bonus cards, every hand at dealt size
    pub fn deal(landlord: Seat) -> Self {
        Self {
            hand: dealt_cards(if landlord == Seat::Own { 20 } else { 17 }),
            dealt_to: Some(landlord),
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
}

pub struct Table {
    pub asset_dir: PathBuf,
    pub assets: Arc<AssetBundle>,
    pub config: Config,
}

impl Table {
    /// Write and reload a template set under a per-test scratch directory
    pub fn new(name: &str) -> Self {
        let asset_dir = std::env::temp_dir().join(format!(
            "doudizhu-monitor-it-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&asset_dir);
        fs::create_dir_all(&asset_dir).unwrap();

        let strip = |offset: u32, height: u32| {
            let mut strip = RgbImage::new(GLYPH_WIDTH * DECK_SIZE, height);
            for index in 0..DECK_SIZE {
                if let Some(face) = strip_card(index as usize) {
                    let face = glyph(offset + face_key(face), GLYPH_WIDTH, height);
                    imageops::replace(&mut strip, &face, (index * GLYPH_WIDTH) as i64, 0);
                }
            }
            strip
        };
        let mut counts = RgbImage::new(GLYPH_WIDTH * DIGIT_COUNT, DIGIT_HEIGHT);
        for digit in 0..DIGIT_COUNT {
            let image = glyph(DIGIT_KEYS + digit, GLYPH_WIDTH, DIGIT_HEIGHT);
            imageops::replace(&mut counts, &image, (digit * GLYPH_WIDTH) as i64, 0);
        }

        strip(0, SHOW_HEIGHT).save(asset_dir.join("show.png")).unwrap();
        strip(SIDE_KEYS, SIDE_HEIGHT).save(asset_dir.join("side.png")).unwrap();
        counts.save(asset_dir.join("counts.png")).unwrap();
        glyph(PASS_KEY, 24, 10).save(asset_dir.join("pass.png")).unwrap();
        glyph(LANDLORD_KEY, 12, 12).save(asset_dir.join("landlord.png")).unwrap();

        let config = Config {
            asset_dir: asset_dir.display().to_string(),
            tick_delay_ms: 2,
            confirm_delay_ms: 0,
            layout: layout(),
            geometry: TemplateGeometry {
                show_rows: 12,
                played_rows: 10,
                bonus_width: 6,
                bonus_height: 10,
                bonus_rows: 8,
            },
            ..Config::default()
        };
        let assets = Arc::new(AssetBundle::load(&asset_dir, &config.geometry).unwrap());

        Self {
            asset_dir,
            assets,
            config,
        }
    }

    fn paste_row(frame: &mut RgbImage, region: Region, glyphs: impl IntoIterator<Item = RgbImage>) {
        for (i, glyph) in glyphs.into_iter().enumerate() {
            let x = region.x + 4 + i as u32 * (glyph.width() + 2);
            imageops::replace(frame, &glyph, x as i64, (region.y + 4) as i64);
        }
    }

    fn bonus_glyph(&self, face: Face) -> RgbImage {
        let g = &self.config.geometry;
        let show = glyph(face_key(face), GLYPH_WIDTH, SHOW_HEIGHT);
        let scaled = imageops::resize(&show, g.bonus_width, g.bonus_height, FilterType::Triangle);
        imageops::crop_imm(&scaled, 0, 0, g.bonus_width, g.bonus_rows).to_image()
    }

    /// Window capture: the canonical table inset in a white border
    pub fn capture(&self, scene: &Scene) -> RgbImage {
        let layout = &self.config.layout;
        let rows = &self.config.geometry;
        let mut table = RgbImage::from_pixel(
            layout.canonical_width,
            layout.canonical_height,
            Rgb([120, 120, 120]),
        );

        Self::paste_row(
            &mut table,
            layout.show,
            scene
                .hand
                .iter()
                .map(|&f| glyph(face_key(f), GLYPH_WIDTH, rows.show_rows)),
        );

        for seat in Seat::ALL {
            Self::paste_row(
                &mut table,
                layout.played(seat),
                scene.played[seat.index()]
                    .iter()
                    .map(|&f| glyph(SIDE_KEYS + face_key(f), GLYPH_WIDTH, rows.played_rows)),
            );
            if scene.passed[seat.index()] {
                let region = layout.pass(seat);
                let y = region.y + region.h - 12;
                imageops::replace(&mut table, &glyph(PASS_KEY, 24, 10), (region.x + 4) as i64, y as i64);
            }
        }

        if let Some(landlord) = scene.dealt_to {
            let bonus = [
                (CardSymbol::Queen, Tint::Black),
                (CardSymbol::SmallJoker, Tint::Black),
                (CardSymbol::Two, Tint::Red),
            ];
            Self::paste_row(&mut table, layout.bonus, bonus.map(|f| self.bonus_glyph(f)));
            Self::paste_row(&mut table, layout.landlord(landlord), [glyph(LANDLORD_KEY, 12, 12)]);
            for seat in [Seat::Down, Seat::Up] {
                let dealt = if seat == landlord { 20 } else { 17 };
                if let Some(region) = layout.counts(seat) {
                    Self::paste_row(&mut table, region, [glyph(DIGIT_KEYS + dealt, GLYPH_WIDTH, DIGIT_HEIGHT)]);
                }
            }
        }

        let mut raw = RgbImage::from_pixel(table.width() + 60, table.height() + 40, Rgb([255, 255, 255]));
        imageops::replace(&mut raw, &table, 30, 20);
        raw
    }

    /// Each scene captured `repeat` times in order
    pub fn script(&self, scenes: &[(Scene, usize)]) -> Script {
        let frames = scenes
            .iter()
            .flat_map(|(scene, repeat)| std::iter::repeat(self.capture(scene)).take(*repeat))
            .map(Step::Frame)
            .collect();
        Script(frames)
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.asset_dir);
    }
}

pub enum Step {
    Frame(RgbImage),
    Fail,
    Panic,
}

/// Frame source replaying a fixed script; reports no window once it runs out
pub struct Script(pub VecDeque<Step>);

impl Script {
    pub fn prepend(mut self, step: Step) -> Self {
        self.0.push_front(step);
        self
    }
}

impl FrameSource for Script {
    fn capture(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        match self.0.pop_front() {
            Some(Step::Frame(frame)) => Ok(Some(frame)),
            Some(Step::Fail) => Err(CaptureError::CaptureFailed {
                title: "scripted".into(),
                source: "window vanished".into(),
            }),
            Some(Step::Panic) => panic!("scripted capture panic"),
            None => Ok(None),
        }
    }
}

/// Receive events until `stop` matches.
///
/// Panics if the stream goes quiet for `EVENT_TIMEOUT`, so a missing event
/// fails loudly instead of being mistaken for a short run.
pub fn collect_until(events: &Receiver<Event>, stop: impl Fn(&Event) -> bool) -> Vec<Event> {
    let mut seen = Vec::new();
    loop {
        let event = match events.recv_timeout(EVENT_TIMEOUT) {
            Ok(event) => event,
            Err(e) => panic!("no matching event after {:?} ({e}); saw {seen:?}", EVENT_TIMEOUT),
        };
        let done = stop(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}
