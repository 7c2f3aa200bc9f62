//! Configuration management for stillcut.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use stillcut_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/stillcut.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Threshold: {}", config.settings().excision.duration_threshold_secs);
//!
//! config.settings_mut().excision.duration_threshold_secs = 5.0;
//! config.update_section(ConfigSection::Excision).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, DetectionSettings, EngineSettings, ExcisionSettings, LoggingSettings,
    PathSettings, Settings,
};
