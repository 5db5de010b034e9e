/// Detection module
///
/// Turns a captured window image into symbolic readings of the card table.
///
/// ## Architecture
///
/// ```text
/// AreaLocator (lock + crop + scale to canonical)
///   └── TableReader
///       ├── TemplateRecognizer (card glyphs, instance counting)
///       │   └── relax (bonus-card confidence sweep)
///       ├── RoleDetector (landlord badge)
///       ├── CountDetector (opponent card counters)
///       └── PassDetector (pass banners)
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let assets = Arc::new(AssetBundle::load(&dir, &config.geometry)?);
/// let mut locator = AreaLocator::new(assets.clone(), config.layout.clone(), 0.97, 15);
/// let reader = TableReader::new(assets, config.layout.clone(), config.thresholds.clone());
///
/// if let Some(located) = locator.locate(&raw) {
///     let sample = reader.read_action(&located.frame, Seat::Down);
/// }
/// ```

pub mod area;
pub mod assets;
pub mod detector;
pub mod layout;
pub mod markers;
pub mod matcher;
pub mod recognizer;
pub mod relax;
pub mod table;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export commonly used types
pub use area::{AreaLocator, LocatedFrame};
pub use assets::{AssetBundle, AssetImages, GlyphTemplate, TemplateGeometry, Tint};
pub use detector::Detector;
pub use layout::Layout;
pub use markers::{CountDetector, PassDetector, RoleDetector};
pub use recognizer::TemplateRecognizer;
pub use relax::{relax, RelaxedDetection, Relaxation};
pub use table::{ActionSample, StartSignature, TableReader, TableSnapshot};
