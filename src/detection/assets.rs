/// Reference images for every glyph the detectors look for
///
/// Loaded once at startup into an immutable `AssetBundle` that the
/// detectors share through an `Arc`.
use std::collections::BTreeMap;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::matcher::Template;
use crate::card::{CardSymbol, DECK_SIZE};
use crate::error::{AssetError, ConfigError};

/// Number of glyphs in `counts.png` (digits 0 through 20)
pub const DIGIT_COUNT: u32 = 21;

/// Ink colour of a card face; suits of one colour render identical rank glyphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tint {
    Red,
    Black,
}

/// Physical card at `index` of a 54-card template strip.
///
/// Strips run big joker, small joker, then 2, 3, ..., K, A with each rank in
/// clubs, diamonds, hearts, spades order.
pub fn strip_card(index: usize) -> Option<(CardSymbol, Tint)> {
    const RANKS: [CardSymbol; 13] = [
        CardSymbol::Two,
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
    ];

    match index {
        0 => Some((CardSymbol::BigJoker, Tint::Red)),
        1 => Some((CardSymbol::SmallJoker, Tint::Black)),
        _ if index < DECK_SIZE as usize => {
            let offset = index - 2;
            let tint = match offset % 4 {
                1 | 2 => Tint::Red,
                _ => Tint::Black,
            };
            Some((RANKS[offset / 4], tint))
        }
        _ => None,
    }
}

/// How the card strips are cut into match templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateGeometry {
    /// Rows kept from each `show.png` slice (the rank corner)
    pub show_rows: u32,
    /// Rows kept from each `side.png` slice
    pub played_rows: u32,
    /// Size the full show slice is scaled to for the bonus cards
    pub bonus_width: u32,
    pub bonus_height: u32,
    /// Rows kept after scaling
    pub bonus_rows: u32,
}

impl Default for TemplateGeometry {
    fn default() -> Self {
        Self {
            show_rows: 85,
            played_rows: 60,
            bonus_width: 34,
            bonus_height: 68,
            bonus_rows: 42,
        }
    }
}

impl TemplateGeometry {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if [self.show_rows, self.played_rows, self.bonus_width, self.bonus_rows]
            .contains(&0)
        {
            return Err(ConfigError::Invalid("template geometry has a zero dimension".into()));
        }
        if self.bonus_rows > self.bonus_height {
            return Err(ConfigError::Invalid(format!(
                "bonus_rows {} exceeds bonus_height {}",
                self.bonus_rows, self.bonus_height
            )));
        }
        Ok(())
    }
}

/// One card glyph template
#[derive(Debug, Clone)]
pub struct GlyphTemplate {
    pub symbol: CardSymbol,
    pub tint: Tint,
    pub template: Template,
}

/// Raw images an [`AssetBundle`] is cut from
pub struct AssetImages {
    /// 54-card strip as rendered in the local hand
    pub show: RgbImage,
    /// 54-card strip as rendered in the played-cards areas
    pub side: RgbImage,
    /// 21 digit glyphs, 0 through 20
    pub counts: RgbImage,
    pub pass: RgbImage,
    pub landlord: RgbImage,
    /// Bonus-area replacements for the big and small joker
    pub bonus_red_joker: Option<RgbImage>,
    pub bonus_black_joker: Option<RgbImage>,
}

impl AssetImages {
    pub fn load(dir: &Path) -> Result<Self, AssetError> {
        Ok(Self {
            show: read_image(&dir.join("show.png"))?,
            side: read_image(&dir.join("side.png"))?,
            counts: read_image(&dir.join("counts.png"))?,
            pass: read_image(&dir.join("pass.png"))?,
            landlord: read_image(&dir.join("landlord.png"))?,
            bonus_red_joker: read_optional(&dir.join("1R.png"))?,
            bonus_black_joker: read_optional(&dir.join("1B.png"))?,
        })
    }
}

fn read_image(path: &Path) -> Result<RgbImage, AssetError> {
    image::open(path)
        .map(|image| image.to_rgb8())
        .map_err(|source| AssetError::LoadFailed {
            path: path.display().to_string(),
            source,
        })
}

fn read_optional(path: &Path) -> Result<Option<RgbImage>, AssetError> {
    if path.exists() {
        read_image(path).map(Some)
    } else {
        Ok(None)
    }
}

/// Cut `strip` into `slices` equal-width columns
fn slice_strip(strip: &RgbImage, slices: u32, name: &'static str) -> Result<Vec<RgbImage>, AssetError> {
    let width = strip.width() / slices;
    if width == 0 || strip.height() == 0 {
        return Err(AssetError::StripTooNarrow {
            name,
            width: strip.width(),
            slices,
        });
    }

    Ok((0..slices)
        .map(|i| imageops::crop_imm(strip, i * width, 0, width, strip.height()).to_image())
        .collect())
}

fn top_rows(image: &RgbImage, rows: u32) -> RgbImage {
    imageops::crop_imm(image, 0, 0, image.width(), rows.min(image.height())).to_image()
}

fn checked_template(image: &RgbImage, name: &str) -> Result<Template, AssetError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(AssetError::EmptyTemplate {
            name: name.to_string(),
        });
    }
    Ok(Template::new(image))
}

/// One template per (symbol, tint); later suits of the same colour replace earlier ones
fn glyph_set(slices: &[RgbImage], cut: impl Fn(&RgbImage) -> RgbImage) -> Vec<GlyphTemplate> {
    let mut by_face: BTreeMap<(CardSymbol, Tint), RgbImage> = BTreeMap::new();
    for (index, slice) in slices.iter().enumerate() {
        if let Some(face) = strip_card(index) {
            by_face.insert(face, cut(slice));
        }
    }

    by_face
        .into_iter()
        .map(|((symbol, tint), image)| GlyphTemplate {
            symbol,
            tint,
            template: Template::new(&image),
        })
        .collect()
}

/// Immutable set of every template the detectors use
#[derive(Debug, Clone)]
pub struct AssetBundle {
    /// Local-hand glyphs
    pub show: Vec<GlyphTemplate>,
    /// Played-card glyphs
    pub played: Vec<GlyphTemplate>,
    /// Landlord bonus-card glyphs
    pub bonus: Vec<GlyphTemplate>,
    /// Digit templates; the index is the digit's value
    pub digits: Vec<Template>,
    pub pass: Template,
    pub landlord: Template,
}

impl AssetBundle {
    pub fn load(dir: &Path, geometry: &TemplateGeometry) -> Result<Self, AssetError> {
        debug!("Loading templates from {}", dir.display());
        Self::from_images(AssetImages::load(dir)?, geometry)
    }

    pub fn from_images(images: AssetImages, geometry: &TemplateGeometry) -> Result<Self, AssetError> {
        let show_slices = slice_strip(&images.show, DECK_SIZE, "show.png")?;
        let side_slices = slice_strip(&images.side, DECK_SIZE, "side.png")?;
        let digit_slices = slice_strip(&images.counts, DIGIT_COUNT, "counts.png")?;

        let show = glyph_set(&show_slices, |slice| top_rows(slice, geometry.show_rows));
        let played = glyph_set(&side_slices, |slice| top_rows(slice, geometry.played_rows));
        let mut bonus = glyph_set(&show_slices, |slice| {
            let scaled = imageops::resize(
                slice,
                geometry.bonus_width,
                geometry.bonus_height,
                FilterType::Triangle,
            );
            top_rows(&scaled, geometry.bonus_rows)
        });

        let overrides = [
            (CardSymbol::BigJoker, Tint::Red, &images.bonus_red_joker, "1R.png"),
            (CardSymbol::SmallJoker, Tint::Black, &images.bonus_black_joker, "1B.png"),
        ];
        for (symbol, tint, image, name) in overrides {
            let Some(image) = image else { continue };
            let template = checked_template(image, name)?;
            if let Some(glyph) = bonus
                .iter_mut()
                .find(|glyph| glyph.symbol == symbol && glyph.tint == tint)
            {
                glyph.template = template;
            }
        }

        let digits = digit_slices.iter().map(Template::new).collect();

        let bundle = Self {
            show,
            played,
            bonus,
            digits,
            pass: checked_template(&images.pass, "pass.png")?,
            landlord: checked_template(&images.landlord, "landlord.png")?,
        };

        debug!(
            show = bundle.show.len(),
            played = bundle.played.len(),
            bonus = bundle.bonus.len(),
            digits = bundle.digits.len(),
            "Template bundle ready"
        );
        Ok(bundle)
    }
}
