use thiserror::Error;

use crate::card::{CardSymbol, Seat};

/// Library-level errors using thiserror for structured error handling.
///
/// Transient conditions (window missing, region not found, unstable reads)
/// are not errors; they are `None`/"not yet" results retried on the next tick.
/// These enums cover the failures that callers can act on.

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to enumerate windows")]
    EnumerationFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to capture window '{title}'")]
    CaptureFailed {
        title: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to read frame image {path}")]
    ImageReadFailed {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to load template image {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Template strip {name} is {width}px wide, too narrow for {slices} glyphs")]
    StripTooNarrow {
        name: &'static str,
        width: u32,
        slices: u32,
    },

    #[error("Template {name} has zero size")]
    EmptyTemplate { name: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine executable directory")]
    NoExecutableDir,

    #[error("Failed to create config directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Monitor already running")]
    AlreadyRunning,

    #[error("Monitor not running")]
    NotRunning,

    #[error("Failed to start monitor thread")]
    ThreadSpawnFailed(#[source] std::io::Error),

    #[error("Monitor thread panicked")]
    ThreadPanicked,
}

/// Why the game tracker refused a confirmed action
///
/// None of these are fatal: the monitor logs them, publishes an anomaly
/// event and leaves the game state untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitRejected {
    #[error("No game in progress")]
    NotInProgress,

    #[error("Game already started")]
    AlreadyStarted,

    #[error("Detected {requested} x {symbol} but only {remaining} remain unplayed")]
    InventoryExceeded {
        symbol: CardSymbol,
        requested: u8,
        remaining: u8,
    },

    #[error("Seat {seat} played {requested} cards holding only {remaining}")]
    HandExceeded {
        seat: Seat,
        requested: u32,
        remaining: u32,
    },

    #[error("Seat {seat} played {requested} x {symbol} but only {unseen} are outside the local hand")]
    UnseenExceeded {
        seat: Seat,
        symbol: CardSymbol,
        requested: u8,
        unseen: u8,
    },

    #[error("Played {requested} x {symbol} from a hand holding {held}")]
    NotInHand {
        symbol: CardSymbol,
        requested: u8,
        held: u8,
    },
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
