/// Game-area localization
///
/// The game is drawn inside a window whose size and chrome vary. The locator
/// finds the lit rectangle once, locks it, and from then on crops and scales
/// every capture to the canonical resolution the layout is defined in.
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use tracing::{debug, info};

use super::assets::AssetBundle;
use super::layout::Layout;
use super::recognizer::TemplateRecognizer;
use crate::capture::Region;

/// Grey level treated as window background rather than game content
const BACKGROUND_LUMINANCE: u8 = 254;

/// A capture cropped to the game area and scaled to canonical size
#[derive(Debug, Clone)]
pub struct LocatedFrame {
    pub frame: RgbImage,
    pub region: Region,
    /// True on the capture that caused the lock
    pub newly_locked: bool,
}

pub struct AreaLocator {
    assets: Arc<AssetBundle>,
    layout: Layout,
    show_confidence: f32,
    luminance: u8,
    locked: Option<Region>,
}

impl AreaLocator {
    pub fn new(assets: Arc<AssetBundle>, layout: Layout, show_confidence: f32, luminance: u8) -> Self {
        Self {
            assets,
            layout,
            show_confidence,
            luminance,
            locked: None,
        }
    }

    pub fn locked(&self) -> Option<Region> {
        self.locked
    }

    /// Forget the locked region; the next capture is localized from scratch
    pub fn reset(&mut self) {
        if let Some(region) = self.locked.take() {
            info!(?region, "Game area lock cleared");
        }
    }

    /// Bounding box of the largest lit shape in `raw`
    pub fn find_candidate(&self, raw: &RgbImage) -> Option<Region> {
        let gray = imageops::grayscale(raw);
        let threshold = self.luminance;
        let mask = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            let level = gray.get_pixel(x, y)[0];
            if level > threshold && level <= BACKGROUND_LUMINANCE {
                Luma([255])
            } else {
                Luma([0])
            }
        });

        find_contours::<u32>(&mask)
            .into_iter()
            .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
            .filter_map(|contour| {
                let xs = contour.points.iter().map(|p| p.x);
                let ys = contour.points.iter().map(|p| p.y);
                let (x0, x1) = (xs.clone().min()?, xs.max()?);
                let (y0, y1) = (ys.clone().min()?, ys.max()?);
                Some(Region::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1))
            })
            .max_by_key(|region| region.w as u64 * region.h as u64)
    }

    /// Crop `region` out of `raw` and scale it to the canonical resolution
    pub fn normalize(&self, raw: &RgbImage, region: Region) -> Option<RgbImage> {
        let region = region.clamp_to(raw.width(), raw.height())?;
        let crop = imageops::crop_imm(raw, region.x, region.y, region.w, region.h).to_image();

        let (width, height) = (self.layout.canonical_width, self.layout.canonical_height);
        if crop.dimensions() == (width, height) {
            return Some(crop);
        }
        Some(imageops::resize(&crop, width, height, FilterType::Triangle))
    }

    /// Resolve one capture.
    ///
    /// With a lock in place the locked region is always reused. Without one,
    /// a candidate is locked only when the local hand can be read inside it;
    /// until then every capture yields `None`.
    pub fn locate(&mut self, raw: &RgbImage) -> Option<LocatedFrame> {
        if let Some(region) = self.locked {
            return self.normalize(raw, region).map(|frame| LocatedFrame {
                frame,
                region,
                newly_locked: false,
            });
        }

        let Some(region) = self.find_candidate(raw) else {
            debug!("No lit area in capture");
            return None;
        };
        let frame = self.normalize(raw, region)?;

        let hand = TemplateRecognizer::new(&self.assets.show).detect(
            &frame,
            self.layout.show,
            self.show_confidence,
        );
        if hand.is_empty() {
            debug!(?region, "Candidate area shows no hand yet");
            return None;
        }

        info!(?region, "Game area locked");
        self.locked = Some(region);
        Some(LocatedFrame {
            frame,
            region,
            newly_locked: true,
        })
    }
}
