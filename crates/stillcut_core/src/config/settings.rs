//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Codec engine settings.
    #[serde(default)]
    pub engine: EngineSettings,

    /// Diagnostic pass tuning.
    #[serde(default)]
    pub detection: DetectionSettings,

    /// Second pass policy.
    #[serde(default)]
    pub excision: ExcisionSettings,
}

impl Settings {
    /// Check value ranges that serde cannot express.
    ///
    /// Returns one message per problem; empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let threshold = self.excision.duration_threshold_secs;
        if !threshold.is_finite() || threshold < 0.0 {
            problems.push(format!(
                "excision.duration_threshold_secs must be >= 0 (got {})",
                threshold
            ));
        }

        let d = &self.detection;
        if d.scale_width == 0 {
            problems.push("detection.scale_width must be > 0".to_string());
        }
        if !(d.mpdecimate_frac > 0.0 && d.mpdecimate_frac <= 1.0) {
            problems.push(format!(
                "detection.mpdecimate_frac must be in (0, 1] (got {})",
                d.mpdecimate_frac
            ));
        }
        if d.mpdecimate_lo > d.mpdecimate_hi {
            problems.push(format!(
                "detection.mpdecimate_lo ({}) must not exceed mpdecimate_hi ({})",
                d.mpdecimate_lo, d.mpdecimate_hi
            ));
        }

        if self.engine.log_capacity == 0 {
            problems.push("engine.log_capacity must be > 0".to_string());
        }

        problems
    }
}

/// Path configuration for output, temp, and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Folder processed videos are published to.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Root folder for engine scratch space.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    "stillcut_output".to_string()
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            temp_root: default_temp_root(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format (engine output only kept in the tail buffer).
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of engine lines to show when a pass fails.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Log every diagnostic line that failed to parse.
    #[serde(default)]
    pub log_unmatched_lines: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            log_unmatched_lines: false,
        }
    }
}

/// Codec engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// ffmpeg executable (name on PATH or absolute path).
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Maximum decision lines buffered during the diagnostic pass. A pass
    /// producing more fails the run.
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_log_capacity() -> usize {
    262_144
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            log_capacity: default_log_capacity(),
        }
    }
}

/// Diagnostic filter graph parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSettings {
    /// Luma value above which a pixel counts as lit.
    #[serde(default = "default_luma_threshold")]
    pub luma_threshold: u8,

    /// Width frames are scaled to before comparison.
    #[serde(default = "default_scale_width")]
    pub scale_width: u32,

    /// mpdecimate `hi`: 8x8 block difference that marks a frame as changed.
    #[serde(default = "default_mpdecimate_hi")]
    pub mpdecimate_hi: u32,

    /// mpdecimate `lo`: block difference counted toward `frac`.
    #[serde(default = "default_mpdecimate_lo")]
    pub mpdecimate_lo: u32,

    /// mpdecimate `frac`: fraction of blocks over `lo` that marks a change.
    #[serde(default = "default_mpdecimate_frac")]
    pub mpdecimate_frac: f64,
}

fn default_luma_threshold() -> u8 {
    128
}

fn default_scale_width() -> u32 {
    320
}

fn default_mpdecimate_hi() -> u32 {
    64
}

fn default_mpdecimate_lo() -> u32 {
    30
}

fn default_mpdecimate_frac() -> f64 {
    0.33
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            luma_threshold: default_luma_threshold(),
            scale_width: default_scale_width(),
            mpdecimate_hi: default_mpdecimate_hi(),
            mpdecimate_lo: default_mpdecimate_lo(),
            mpdecimate_frac: default_mpdecimate_frac(),
        }
    }
}

/// Second pass policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcisionSettings {
    /// Drop spans must be strictly longer than this to be cut.
    #[serde(default = "default_duration_threshold")]
    pub duration_threshold_secs: f64,
}

fn default_duration_threshold() -> f64 {
    3.0
}

impl Default for ExcisionSettings {
    fn default() -> Self {
        Self {
            duration_threshold_secs: default_duration_threshold(),
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Logging,
    Engine,
    Detection,
    Excision,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Engine,
        ConfigSection::Detection,
        ConfigSection::Excision,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Engine => "engine",
            ConfigSection::Detection => "detection",
            ConfigSection::Excision => "excision",
        }
    }

    /// Comment written above the section.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "# Output and working directories",
            ConfigSection::Logging => "# Logging configuration",
            ConfigSection::Engine => "# Codec engine",
            ConfigSection::Detection => "# Static-frame detection (diagnostic pass)",
            ConfigSection::Excision => "# Excision policy (second pass)",
        }
    }
}
