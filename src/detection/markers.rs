/// Single-template marker detectors
///
/// All three share the same test: is there any placement of one template in
/// one region scoring at least the configured confidence.
use std::sync::Arc;

use image::RgbImage;

use super::assets::AssetBundle;
use super::detector::Detector;
use super::layout::Layout;
use super::matcher::{PreparedRegion, Template};
use crate::capture::Region;
use crate::card::Seat;

fn present(region: &PreparedRegion, template: &Template, confidence: f32) -> bool {
    region
        .score(template, confidence)
        .is_some_and(|scores| scores.any_at_least(confidence))
}

/// Finds which seat carries the landlord badge
///
/// Candidate regions are scanned own, down, up; the first hit wins even if a
/// later region would also match.
pub struct RoleDetector {
    assets: Arc<AssetBundle>,
    candidates: [(Seat, Region); 3],
    confidence: f32,
}

impl RoleDetector {
    pub fn new(assets: Arc<AssetBundle>, layout: &Layout, confidence: f32) -> Self {
        Self {
            assets,
            candidates: Seat::ALL.map(|seat| (seat, layout.landlord(seat))),
            confidence,
        }
    }
}

impl Detector for RoleDetector {
    type Output = Option<Seat>;

    fn detect(&self, frame: &RgbImage) -> Option<Seat> {
        self.candidates.iter().find_map(|&(seat, region)| {
            let prepared = PreparedRegion::new(frame, region)?;
            present(&prepared, &self.assets.landlord, self.confidence).then_some(seat)
        })
    }

    fn name(&self) -> &'static str {
        "role"
    }
}

/// Reads an opponent's remaining-card counter
///
/// Digits are tried in ascending order and the first match is returned. No
/// match reads as 0, which cannot be told apart from a real zero.
pub struct CountDetector {
    assets: Arc<AssetBundle>,
    region: Region,
    confidence: f32,
}

impl CountDetector {
    pub fn new(assets: Arc<AssetBundle>, region: Region, confidence: f32) -> Self {
        Self {
            assets,
            region,
            confidence,
        }
    }
}

impl Detector for CountDetector {
    type Output = u32;

    fn detect(&self, frame: &RgbImage) -> u32 {
        let Some(prepared) = PreparedRegion::new(frame, self.region) else {
            return 0;
        };
        self.assets
            .digits
            .iter()
            .position(|digit| present(&prepared, digit, self.confidence))
            .map_or(0, |value| value as u32)
    }

    fn name(&self) -> &'static str {
        "count"
    }
}

/// Looks for the "pass" banner in one seat's region
pub struct PassDetector {
    assets: Arc<AssetBundle>,
    region: Region,
    confidence: f32,
}

impl PassDetector {
    pub fn new(assets: Arc<AssetBundle>, region: Region, confidence: f32) -> Self {
        Self {
            assets,
            region,
            confidence,
        }
    }
}

impl Detector for PassDetector {
    type Output = bool;

    fn detect(&self, frame: &RgbImage) -> bool {
        PreparedRegion::new(frame, self.region)
            .is_some_and(|prepared| present(&prepared, &self.assets.pass, self.confidence))
    }

    fn name(&self) -> &'static str {
        "pass"
    }
}
