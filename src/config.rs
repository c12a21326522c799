//! Configuration management for the face gesture mouse

use crate::{gestures::GestureOptions, params::Parameters, Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera configuration
    pub camera: CameraConfig,

    /// Landmark model configuration
    pub model: ModelConfig,

    /// Gesture loop configuration
    pub engine: EngineConfig,

    /// Live-tunable gesture parameters
    pub parameters: Parameters,
}

/// Capture device settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Webcam index
    pub index: i32,

    /// Flip frames horizontally so the pointer follows the head like a mirror
    pub mirror: bool,

    /// Driver-side frame buffer; 1 keeps latency low
    pub buffer_size: u32,

    /// Requested capture width
    pub width: Option<u32>,

    /// Requested capture height
    pub height: Option<u32>,
}

/// Face-mesh model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the 468-point face-mesh ONNX model
    pub face_mesh: PathBuf,

    /// Minimum face presence score (0.0-1.0)
    pub presence_threshold: f32,

    /// Side of the square face crop as a fraction of the shorter frame side
    pub crop_scale: f32,
}

/// Gesture loop settings that are fixed while the loop runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sleep between loop iterations
    pub loop_interval_ms: u64,

    /// Calibration gives up after this many reads per requested sample
    pub calibration_attempt_factor: usize,

    /// Closed frames a blink must exceed to count
    pub blink_debounce_frames: u32,

    /// Single-click a lone blink once the double-click window has passed
    pub resolve_lone_blink: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            mirror: true,
            buffer_size: 1,
            width: None,
            height: None,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            face_mesh: PathBuf::from("assets/face_mesh.onnx"),
            presence_threshold: 0.5,
            crop_scale: 0.9,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            loop_interval_ms: crate::constants::DEFAULT_LOOP_INTERVAL_MS,
            calibration_attempt_factor: crate::constants::DEFAULT_CALIBRATION_ATTEMPT_FACTOR,
            blink_debounce_frames: crate::constants::DEFAULT_BLINK_DEBOUNCE_FRAMES,
            resolve_lone_blink: false,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub const fn loop_interval(&self) -> Duration {
        Duration::from_millis(self.loop_interval_ms)
    }

    #[must_use]
    pub const fn gesture_options(&self) -> GestureOptions {
        GestureOptions {
            blink_debounce_frames: self.blink_debounce_frames,
            resolve_lone_blink: self.resolve_lone_blink,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `ConfigError` if it does not parse
    /// or fails validation
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on malformed YAML or invalid values
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if serialization fails and `Io` if the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// Model paths are not checked here; the detector reports a missing file when
    /// it loads.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for out-of-range settings, or the parameter error for
    /// an invalid gesture parameter
    pub fn validate(&self) -> Result<()> {
        if self.camera.index < 0 {
            return Err(Error::ConfigError("Camera index must not be negative".to_string()));
        }
        if self.camera.buffer_size == 0 {
            return Err(Error::ConfigError(
                "Camera buffer size must be greater than 0".to_string(),
            ));
        }
        if self.camera.width == Some(0) || self.camera.height == Some(0) {
            return Err(Error::ConfigError(
                "Camera width and height must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.model.presence_threshold) {
            return Err(Error::ConfigError(
                "Presence threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(self.model.crop_scale > 0.0 && self.model.crop_scale <= 1.0) {
            return Err(Error::ConfigError(
                "Crop scale must be in (0.0, 1.0]".to_string(),
            ));
        }

        if self.engine.calibration_attempt_factor == 0 {
            return Err(Error::ConfigError(
                "Calibration attempt factor must be greater than 0".to_string(),
            ));
        }

        self.parameters.validate()
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Face Gesture Mouse Configuration

# Webcam
camera:
  index: 0
  mirror: true
  buffer_size: 1
  # width: 640
  # height: 480

# Face-mesh landmark model
model:
  face_mesh: "assets/face_mesh.onnx"
  presence_threshold: 0.5
  crop_scale: 0.9

# Gesture loop
engine:
  loop_interval_ms: 10
  calibration_attempt_factor: 10
  blink_debounce_frames: 3
  resolve_lone_blink: false

# Gesture parameters (also adjustable at runtime with `set NAME VALUE`)
parameters:
  EMA_ALPHA: 0.15
  CURSOR_SENSITIVITY_X: 8.0
  CURSOR_SENSITIVITY_Y: 8.0
  BLINK_THRESHOLD_RATIO: 0.75
  CALIBRATION_FRAMES: 30
  MOVEMENT_THRESHOLD: 0.02
  DOUBLE_CLICK_THRESHOLD: 0.8
  EYEBROW_RAISE_THRESHOLD_RATIO: 1.4
  RIGHT_CLICK_COOLDOWN: 1.0
  MOUTH_OPEN_THRESHOLD_RATIO: 1.5
  SCROLL_THRESHOLD: 0.03
  SCROLL_STEP: 50.0
  SCROLL_INTERVAL: 0.05
"#;
