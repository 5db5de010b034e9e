//! Screen-reading tracker for Doudizhu tables
//!
//! Captures the game window, locks onto the table area, recognizes cards and
//! markers by template matching, and keeps a validated record of every play
//! in the round. Consumers follow along through `messaging::Event`s.

pub mod agent;
pub mod capture;
pub mod card;
pub mod config;
pub mod debounce;
pub mod detection;
pub mod error;
pub mod game;
pub mod messaging;
pub mod monitor;
pub mod state;
pub mod utils;

pub use error::{AppResult, CommitRejected, MonitorError};
pub use monitor::{MonitorHandle, MonitorLoop};
