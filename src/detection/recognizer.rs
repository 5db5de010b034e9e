/// Card recognition over one region
///
/// Every glyph template is scored against the region once; a `Detection` at
/// any confidence is then read off the cached score maps, which is what makes
/// the bonus-card relaxation sweep cheap.
use image::RgbImage;
use rayon::prelude::*;

use super::assets::GlyphTemplate;
use super::matcher::{PreparedRegion, ScoreMap};
use crate::capture::Region;
use crate::card::{CardSymbol, Detection};

/// Score maps of every glyph template for one region of one frame
pub struct GlyphScores {
    entries: Vec<(CardSymbol, ScoreMap)>,
}

impl GlyphScores {
    /// Instance counts per symbol at `confidence`.
    ///
    /// Jokers are singletons and count at most once per template.
    pub fn detection_at(&self, confidence: f32) -> Detection {
        let mut detection = Detection::empty();
        for (symbol, scores) in &self.entries {
            let found = scores.count_instances(confidence);
            if found == 0 {
                continue;
            }
            let found = if symbol.is_joker() { 1 } else { found.min(u8::MAX as u32) as u8 };
            detection.add(*symbol, found);
        }
        detection
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Matches a set of glyph templates against regions of a canonical frame
#[derive(Clone, Copy)]
pub struct TemplateRecognizer<'a> {
    glyphs: &'a [GlyphTemplate],
}

impl<'a> TemplateRecognizer<'a> {
    pub fn new(glyphs: &'a [GlyphTemplate]) -> Self {
        Self { glyphs }
    }

    /// Score all templates in parallel. A region outside the frame yields no scores.
    ///
    /// Detections read off the result are exact at `floor` and above.
    pub fn scores(&self, frame: &RgbImage, region: Region, floor: f32) -> GlyphScores {
        let Some(prepared) = PreparedRegion::new(frame, region) else {
            return GlyphScores { entries: Vec::new() };
        };

        let entries = self
            .glyphs
            .par_iter()
            .filter_map(|glyph| {
                prepared
                    .score(&glyph.template, floor)
                    .map(|scores| (glyph.symbol, scores))
            })
            .collect();

        GlyphScores { entries }
    }

    pub fn detect(&self, frame: &RgbImage, region: Region, confidence: f32) -> Detection {
        self.scores(frame, region, confidence).detection_at(confidence)
    }
}
