use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};
use xcap::Window;

use crate::error::CaptureError;

/// Axis-aligned rectangle in frame-pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_array(arr: [u32; 4]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3])
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Intersect with a `width` x `height` frame.
    ///
    /// Returns `None` when nothing of the region lies inside the frame.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Region> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let clamped = Region::new(
            self.x,
            self.y,
            self.right().min(width) - self.x,
            self.bottom().min(height) - self.y,
        );
        (!clamped.is_empty()).then_some(clamped)
    }
}

/// Source of raw frames, polled once per tick
///
/// `Ok(None)` means "no frame right now" (window missing or minimized); the
/// caller simply retries on the next tick.
pub trait FrameSource: Send {
    fn capture(&mut self) -> Result<Option<RgbImage>, CaptureError>;
}

/// Captures the first visible window whose title contains `title`
///
/// # Platform Notes
/// - Uses `xcap`, which wraps the native window capture API on each platform
/// - Minimized windows are skipped since they yield empty or stale frames
/// - On macOS the process needs Screen Recording permission
pub struct WindowCapture {
    title: String,
}

impl WindowCapture {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    fn find_window(&self) -> Result<Option<Window>, CaptureError> {
        let windows =
            Window::all().map_err(|err| CaptureError::EnumerationFailed(Box::new(err)))?;

        Ok(windows.into_iter().find(|window| {
            let matches_title = window
                .title()
                .map(|t| t.contains(&self.title))
                .unwrap_or(false);
            let minimized = window.is_minimized().unwrap_or(true);
            matches_title && !minimized
        }))
    }
}

impl FrameSource for WindowCapture {
    fn capture(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        let Some(window) = self.find_window()? else {
            return Ok(None);
        };

        let image = window
            .capture_image()
            .map_err(|err| CaptureError::CaptureFailed {
                title: self.title.clone(),
                source: Box::new(err),
            })?;

        if image.width() == 0 || image.height() == 0 {
            return Ok(None);
        }

        Ok(Some(DynamicImage::ImageRgba8(image).to_rgb8()))
    }
}

/// Replays one still screenshot on every capture (diagnostic probe mode)
pub struct ImageFileSource {
    path: PathBuf,
    frame: RgbImage,
}

impl ImageFileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref().to_path_buf();
        let frame = image::open(&path)
            .map_err(|source| CaptureError::ImageReadFailed {
                path: path.display().to_string(),
                source,
            })?
            .to_rgb8();
        Ok(Self { path, frame })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for ImageFileSource {
    fn capture(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        Ok(Some(self.frame.clone()))
    }
}
