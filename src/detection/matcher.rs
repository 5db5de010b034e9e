/// Normalized template matching
///
/// Scores are zero-mean normalized cross-correlation accumulated over the
/// three colour channels, the same measure OpenCV calls `TM_CCOEFF_NORMED`.
/// The raw cross-correlation comes from `imageproc::template_matching`; the
/// per-window means and energies come from integral images, so each score is
///
/// ```text
///            sum_c ( sum(I_c * T_c) - sum(I_c) * sum(T_c) / n )
/// score = ---------------------------------------------------------------
///         sqrt( sum_c var_n(I_c) * sum_c var_n(T_c) )
/// ```
///
/// where `var_n(X) = sum(X^2) - sum(X)^2 / n` over the `n` template pixels.
///
/// Large templates are searched coarse-to-fine: the region and the template
/// are shrunk by a pyramid factor, scored densely at that scale, and only
/// placements near coarse candidates are scored at full resolution.
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use imageproc::definitions::Image;
use imageproc::integral_image::{integral_image, integral_squared_image};
use imageproc::region_labelling::{connected_components, Connectivity};
use imageproc::template_matching::{match_template, MatchTemplateMethod};

use crate::capture::Region;

/// Windows whose per-pixel variance is below this (in squared grey levels)
/// are treated as flat and never match.
const MIN_PIXEL_VARIANCE: f64 = 1.0;

/// Shrink factors tried for the coarse level, largest first
const PYRAMID_FACTORS: [u32; 2] = [4, 2];

/// Short side a shrunk template must keep to stay discriminative
const COARSE_MIN_SIDE: u32 = 8;

/// Coarse placements scoring within this of the floor are refined
const COARSE_SLACK: f32 = 0.4;

fn split_planes(image: &RgbImage) -> [GrayImage; 3] {
    let (width, height) = image.dimensions();
    let mut planes = [
        GrayImage::new(width, height),
        GrayImage::new(width, height),
        GrayImage::new(width, height),
    ];
    for (x, y, pixel) in image.enumerate_pixels() {
        for (channel, plane) in planes.iter_mut().enumerate() {
            plane.put_pixel(x, y, Luma([pixel[channel]]));
        }
    }
    planes
}

/// Downscale by exactly `factor`, dropping the ragged right and bottom edges
fn shrink(image: &RgbImage, factor: u32) -> RgbImage {
    let (width, height) = (image.width() / factor, image.height() / factor);
    let even = imageops::crop_imm(image, 0, 0, width * factor, height * factor).to_image();
    imageops::resize(&even, width, height, FilterType::Triangle)
}

/// Sum of the source pixels in `[x, x + w) x [y, y + h)` from a padded integral image
fn window_sum(integral: &Image<Luma<u64>>, x: u32, y: u32, w: u32, h: u32) -> f64 {
    let a = integral.get_pixel(x, y)[0];
    let b = integral.get_pixel(x + w, y)[0];
    let c = integral.get_pixel(x, y + h)[0];
    let d = integral.get_pixel(x + w, y + h)[0];
    ((a + d) - (b + c)) as f64
}

/// A reference glyph split into channel planes with its statistics precomputed
#[derive(Debug, Clone)]
pub struct Template {
    planes: [GrayImage; 3],
    width: u32,
    height: u32,
    sums: [f64; 3],
    energy: f64,
    /// Shrunk copy used to find candidates, with its factor
    coarse: Option<(u32, Box<Template>)>,
}

impl Template {
    pub fn new(image: &RgbImage) -> Self {
        let mut template = Self::single_level(image);
        let short_side = template.width.min(template.height);
        template.coarse = PYRAMID_FACTORS
            .into_iter()
            .find(|&factor| short_side / factor >= COARSE_MIN_SIDE)
            .map(|factor| (factor, Box::new(Self::single_level(&shrink(image, factor)))))
            .filter(|(_, coarse)| !coarse.is_flat());
        template
    }

    fn single_level(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let planes = split_planes(image);
        let n = (width as f64 * height as f64).max(1.0);

        let mut sums = [0.0; 3];
        let mut energy = 0.0;
        for (channel, plane) in planes.iter().enumerate() {
            let sum: f64 = plane.pixels().map(|p| p[0] as f64).sum();
            let sum_sq: f64 = plane.pixels().map(|p| (p[0] as f64).powi(2)).sum();
            sums[channel] = sum;
            energy += sum_sq - sum * sum / n;
        }

        Self {
            planes,
            width,
            height,
            sums,
            energy,
            coarse: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pyramid factor of the coarse search, if this template gets one
    pub fn pyramid_factor(&self) -> Option<u32> {
        self.coarse.as_ref().map(|(factor, _)| *factor)
    }

    fn pixel_count(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    /// A uniform template correlates with nothing
    pub fn is_flat(&self) -> bool {
        self.width == 0 || self.height == 0 || self.energy < MIN_PIXEL_VARIANCE * self.pixel_count()
    }
}

/// One detection region cut out of a frame, ready to be scored against many templates
pub struct PreparedRegion {
    planes: [GrayImage; 3],
    integrals: [Image<Luma<u64>>; 3],
    squared: [Image<Luma<u64>>; 3],
    /// Shrunk copies keyed by pyramid factor
    levels: Vec<(u32, PreparedRegion)>,
}

impl PreparedRegion {
    /// Crop `region` out of `frame`, clamping to the frame bounds.
    ///
    /// Returns `None` when the region lies entirely outside the frame.
    pub fn new(frame: &RgbImage, region: Region) -> Option<Self> {
        let region = region.clamp_to(frame.width(), frame.height())?;
        let crop = imageops::crop_imm(frame, region.x, region.y, region.w, region.h).to_image();
        Some(Self::from_image(&crop))
    }

    pub fn from_image(image: &RgbImage) -> Self {
        let mut prepared = Self::single_level(image);
        prepared.levels = PYRAMID_FACTORS
            .into_iter()
            .filter(|&factor| image.width().min(image.height()) / factor >= COARSE_MIN_SIDE)
            .map(|factor| (factor, Self::single_level(&shrink(image, factor))))
            .collect();
        prepared
    }

    fn single_level(image: &RgbImage) -> Self {
        let planes = split_planes(image);
        let integrals = [
            integral_image::<_, u64>(&planes[0]),
            integral_image::<_, u64>(&planes[1]),
            integral_image::<_, u64>(&planes[2]),
        ];
        let squared = [
            integral_squared_image::<_, u64>(&planes[0]),
            integral_squared_image::<_, u64>(&planes[1]),
            integral_squared_image::<_, u64>(&planes[2]),
        ];
        Self {
            planes,
            integrals,
            squared,
            levels: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.planes[0].width()
    }

    pub fn height(&self) -> u32 {
        self.planes[0].height()
    }

    fn fits(&self, template: &Template) -> bool {
        template.width() <= self.width() && template.height() <= self.height()
    }

    fn level(&self, factor: u32) -> Option<&PreparedRegion> {
        self.levels
            .iter()
            .find(|(f, _)| *f == factor)
            .map(|(_, level)| level)
    }

    /// Score placements of `template` inside this region.
    ///
    /// Every placement that could reach `floor` is scored; the rest may read
    /// as 0, so the map must only be thresholded at `floor` or above.
    /// Returns `None` if the template does not fit or is flat.
    pub fn score(&self, template: &Template, floor: f32) -> Option<ScoreMap> {
        if template.is_flat() || !self.fits(template) {
            return None;
        }

        let pyramid = template.coarse.as_ref().and_then(|(factor, small)| {
            let level = self.level(*factor)?;
            level.fits(small).then_some((*factor, small, level))
        });

        let scores = match pyramid {
            Some((factor, small, level)) => {
                let coarse = level.dense_scores(small);
                self.refine(template, &coarse, factor, floor - COARSE_SLACK)
            }
            None => self.dense_scores(template),
        };
        Some(ScoreMap(scores))
    }

    /// Score every placement at this level
    fn dense_scores(&self, template: &Template) -> Image<Luma<f32>> {
        let correlations = [
            match_template(&self.planes[0], &template.planes[0], MatchTemplateMethod::CrossCorrelation),
            match_template(&self.planes[1], &template.planes[1], MatchTemplateMethod::CrossCorrelation),
            match_template(&self.planes[2], &template.planes[2], MatchTemplateMethod::CrossCorrelation),
        ];

        let (out_w, out_h) = correlations[0].dimensions();
        Image::from_fn(out_w, out_h, |x, y| {
            let cross = correlations.each_ref().map(|c| c.get_pixel(x, y)[0] as f64);
            Luma([self.normalized(template, x, y, cross)])
        })
    }

    /// Score full-resolution placements within one pyramid step of each coarse candidate
    fn refine(
        &self,
        template: &Template,
        coarse: &Image<Luma<f32>>,
        factor: u32,
        cutoff: f32,
    ) -> Image<Luma<f32>> {
        let out_w = self.width() - template.width() + 1;
        let out_h = self.height() - template.height() + 1;
        let mut scores: Image<Luma<f32>> = Image::new(out_w, out_h);
        let mut scored = vec![false; (out_w * out_h) as usize];
        let reach = factor - 1;

        for (cx, cy, coarse_score) in coarse.enumerate_pixels() {
            if coarse_score[0] < cutoff {
                continue;
            }
            let (x0, y0) = ((cx * factor).saturating_sub(reach), (cy * factor).saturating_sub(reach));
            let x1 = (cx * factor + reach).min(out_w - 1);
            let y1 = (cy * factor + reach).min(out_h - 1);
            for y in y0..=y1 {
                for x in x0..=x1 {
                    let index = (y * out_w + x) as usize;
                    if scored[index] {
                        continue;
                    }
                    scored[index] = true;
                    let score = self.normalized(template, x, y, self.cross_at(template, x, y));
                    scores.put_pixel(x, y, Luma([score]));
                }
            }
        }
        scores
    }

    /// Raw per-channel cross-correlation of one placement
    fn cross_at(&self, template: &Template, x: u32, y: u32) -> [f64; 3] {
        let (x, y) = (x as usize, y as usize);
        let tw = template.width() as usize;
        let stride = self.width() as usize;
        let mut cross = [0.0; 3];
        for (channel, total) in cross.iter_mut().enumerate() {
            let source = self.planes[channel].as_raw();
            let glyph = template.planes[channel].as_raw();
            let mut sum = 0u64;
            for (row, glyph_row) in glyph.chunks_exact(tw).enumerate() {
                let start = (y + row) * stride + x;
                let window = &source[start..start + tw];
                sum += window
                    .iter()
                    .zip(glyph_row)
                    .map(|(&a, &b)| a as u32 * b as u32)
                    .sum::<u32>() as u64;
            }
            *total = sum as f64;
        }
        cross
    }

    /// Zero-mean normalized score of one placement from its raw cross-correlations
    fn normalized(&self, template: &Template, x: u32, y: u32, cross: [f64; 3]) -> f32 {
        let (tw, th) = (template.width(), template.height());
        let n = template.pixel_count();
        let mut numerator = 0.0;
        let mut energy = 0.0;
        for channel in 0..3 {
            let sum = window_sum(&self.integrals[channel], x, y, tw, th);
            let sum_sq = window_sum(&self.squared[channel], x, y, tw, th);
            numerator += cross[channel] - sum * template.sums[channel] / n;
            energy += sum_sq - sum * sum / n;
        }

        if energy < MIN_PIXEL_VARIANCE * n {
            0.0
        } else {
            (numerator / (energy * template.energy).sqrt()).clamp(-1.0, 1.0) as f32
        }
    }
}

/// Correlation scores for every placement of one template in one region
#[derive(Debug, Clone)]
pub struct ScoreMap(Image<Luma<f32>>);

impl ScoreMap {
    pub fn max_score(&self) -> f32 {
        self.0.pixels().map(|p| p[0]).fold(-1.0, f32::max)
    }

    pub fn any_at_least(&self, confidence: f32) -> bool {
        self.0.pixels().any(|p| p[0] >= confidence)
    }

    /// Binary mask of placements scoring at least `confidence`
    pub fn mask(&self, confidence: f32) -> GrayImage {
        let (width, height) = self.0.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            if self.0.get_pixel(x, y)[0] >= confidence {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    /// Number of separate blobs in the mask at `confidence`.
    ///
    /// Each blob is one matched instance, which is what lets two copies of
    /// the same glyph in one region count as two.
    pub fn count_instances(&self, confidence: f32) -> u32 {
        if !self.any_at_least(confidence) {
            return 0;
        }
        let labels = connected_components(&self.mask(confidence), Connectivity::Eight, Luma([0u8]));
        labels.pixels().map(|p| p[0]).max().unwrap_or(0)
    }
}
