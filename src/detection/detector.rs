/// Detector trait
///
/// Defines the interface shared by the single-purpose marker detectors
/// (landlord badge, remaining-card counter, pass banner).
use image::RgbImage;

/// A detector reads one fact off a canonical-resolution frame
///
/// Implement this trait to add further screen markers.
pub trait Detector: Send + Sync {
    type Output;

    /// Inspect `frame`, which must already be cropped and resized by the area locator
    fn detect(&self, frame: &RgbImage) -> Self::Output;

    /// Get detector name (for logging)
    fn name(&self) -> &'static str;
}
