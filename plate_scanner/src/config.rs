use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Detections with an area at or below this many pixels are ignored.
pub const MIN_PLATE_AREA: i32 = 500;
pub const SCALE_FACTOR: f64 = 1.1;
pub const MIN_NEIGHBORS: i32 = 4;
/// Side of the square Gaussian kernel applied before detection. Not
/// configurable.
pub const BLUR_KERNEL: i32 = 5;

pub const CAMERA_INDEX: i32 = 0;
pub const FRAME_WIDTH: i32 = 640;
pub const FRAME_HEIGHT: i32 = 480;
pub const BRIGHTNESS: f64 = 100.0;
pub const EXPOSURE: f64 = -6.0;

pub const CASCADE_PATH: &str = "model/haarcascade_russian_plate_number.xml";
pub const OUTPUT_DIR: &str = "plates";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_index")]
    pub index: i32,
    #[serde(default = "default_frame_width")]
    pub width: i32,
    #[serde(default = "default_frame_height")]
    pub height: i32,
    #[serde(default = "default_brightness")]
    pub brightness: f64,
    #[serde(default = "default_exposure")]
    pub exposure: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectorConfig {
    #[serde(default = "default_cascade_path")]
    pub cascade_path: PathBuf,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    #[serde(default = "default_min_neighbors")]
    pub min_neighbors: i32,
    #[serde(default = "default_min_area")]
    pub min_area: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: default_camera_index(),
            width: default_frame_width(),
            height: default_frame_height(),
            brightness: default_brightness(),
            exposure: default_exposure(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            cascade_path: default_cascade_path(),
            scale_factor: default_scale_factor(),
            min_neighbors: default_min_neighbors(),
            min_area: default_min_area(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl LoggingConfig {
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub fn filter(&self) -> Result<EnvFilter, ConfigError> {
        let level: LevelFilter = self
            .level
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("logging.level {:?}: {}", self.level, e)))?;
        Ok(EnvFilter::default().add_directive(level.into()))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let detector = &self.detector;
        if detector.scale_factor.is_nan() || detector.scale_factor <= 1.0 {
            return Err(ConfigError::Invalid(format!(
                "detector.scale_factor must be greater than 1.0, got {}",
                detector.scale_factor
            )));
        }
        if detector.min_neighbors < 0 {
            return Err(ConfigError::Invalid(format!(
                "detector.min_neighbors must not be negative, got {}",
                detector.min_neighbors
            )));
        }
        if detector.min_area < 0 {
            return Err(ConfigError::Invalid(format!(
                "detector.min_area must not be negative, got {}",
                detector.min_area
            )));
        }
        self.logging.filter()?;
        Ok(())
    }

    /// Like [`Config::load`], but a missing file yields the built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

fn default_camera_index() -> i32 {
    CAMERA_INDEX
}
fn default_frame_width() -> i32 {
    FRAME_WIDTH
}
fn default_frame_height() -> i32 {
    FRAME_HEIGHT
}
fn default_brightness() -> f64 {
    BRIGHTNESS
}
fn default_exposure() -> f64 {
    EXPOSURE
}
fn default_cascade_path() -> PathBuf {
    PathBuf::from(CASCADE_PATH)
}
fn default_scale_factor() -> f64 {
    SCALE_FACTOR
}
fn default_min_neighbors() -> i32 {
    MIN_NEIGHBORS
}
fn default_min_area() -> i32 {
    MIN_PLATE_AREA
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(OUTPUT_DIR)
}
fn default_log_level() -> String {
    "info".into()
}
