use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::detection::assets::TemplateGeometry;
use crate::detection::layout::Layout;
use crate::error::ConfigError;

/// Match thresholds per region class, plus the bonus-card relaxation sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Local hand (clean, unoccluded)
    pub show: f32,
    /// Played cards of any seat (may be mid-animation)
    pub played: f32,
    /// Bonus-card sweep: starting confidence
    pub bonus_start: f32,
    /// Bonus-card sweep: lowest confidence tried
    pub bonus_floor: f32,
    /// Bonus-card sweep: decrement per step
    pub bonus_step: f32,
    pub pass: f32,
    pub landlord: f32,
    pub counts: f32,
    /// Grey level above which a pixel counts as part of the game area (0-255)
    pub locate_luminance: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            show: 0.97,
            played: 0.95,
            bonus_start: 0.95,
            bonus_floor: 0.85,
            bonus_step: 0.01,
            pass: 0.80,
            landlord: 0.96,
            counts: 0.89,
            locate_luminance: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Substring of the game window title to capture
    pub window_title: String,

    /// Directory holding the template images (relative to the config directory)
    pub asset_dir: String,

    /// Sleep between ticks in milliseconds
    pub tick_delay_ms: u64,

    /// Sleep between debounce samples in milliseconds
    pub confirm_delay_ms: u64,

    /// Identical consecutive samples required before a read is trusted
    pub confirm_count: u32,

    pub thresholds: Thresholds,
    pub layout: Layout,
    pub geometry: TemplateGeometry,

    /// Ticks between latency summaries in the log
    pub stats_interval: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_title: "欢乐斗地主".to_string(),
            asset_dir: "assets/qq".to_string(),
            tick_delay_ms: 100,
            confirm_delay_ms: 100,
            confirm_count: 2,
            thresholds: Thresholds::default(),
            layout: Layout::default(),
            geometry: TemplateGeometry::default(),
            stats_interval: 100,
        }
    }
}

impl Config {
    /// Load configuration from the directory next to the executable.
    /// Creates default config if file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let config = Self::load_from(&config_path)?;
            info!("Loaded config from: {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            info!("Created default config at: {}", config_path.display());
            Ok(config)
        }
    }

    /// Read and validate a config file at an explicit path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source,
        };

        let content = fs::read_to_string(path).map_err(|e| load_failed(Box::new(e)))?;
        let config: Config = serde_json::from_str(&content).map_err(|e| load_failed(Box::new(e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::DirectoryCreationFailed {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let save_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source,
        };

        let json = serde_json::to_string_pretty(self).map_err(|e| save_failed(Box::new(e)))?;
        fs::write(path, json).map_err(|e| save_failed(Box::new(e)))?;

        Ok(())
    }

    /// Get the config file path (in app's base directory)
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let exe_path = env::current_exe().map_err(|_| ConfigError::NoExecutableDir)?;
        let exe_dir = exe_path.parent().ok_or(ConfigError::NoExecutableDir)?;

        Ok(exe_dir.join("config").join("config.json"))
    }

    /// Get the config directory path (for display purposes)
    pub fn config_dir_display() -> String {
        Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Resolve `asset_dir` against the config directory unless it is absolute
    pub fn asset_dir_full_path(&self) -> Result<PathBuf, ConfigError> {
        let asset_dir = Path::new(&self.asset_dir);
        if asset_dir.is_absolute() {
            return Ok(asset_dir.to_path_buf());
        }

        let config_path = Self::config_path()?;
        let config_dir = config_path.parent().ok_or(ConfigError::NoExecutableDir)?;
        Ok(config_dir.join(asset_dir))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        let unit = [
            ("show", t.show),
            ("played", t.played),
            ("bonus_start", t.bonus_start),
            ("bonus_floor", t.bonus_floor),
            ("pass", t.pass),
            ("landlord", t.landlord),
            ("counts", t.counts),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "threshold {name} = {value} is outside [0, 1]"
                )));
            }
        }

        if t.bonus_step.is_nan() || t.bonus_step <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "bonus_step must be positive, got {}",
                t.bonus_step
            )));
        }
        if t.bonus_floor > t.bonus_start {
            return Err(ConfigError::Invalid(format!(
                "bonus_floor {} is above bonus_start {}",
                t.bonus_floor, t.bonus_start
            )));
        }
        if self.confirm_count < 1 {
            return Err(ConfigError::Invalid("confirm_count must be at least 1".into()));
        }

        for (name, region) in self.layout.named_regions() {
            if region.is_empty() {
                return Err(ConfigError::Invalid(format!("region {name} has zero size")));
            }
        }

        self.geometry.validate()
    }
}
