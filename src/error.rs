//! Error types for the facial gesture engine.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// `ONNX` Runtime inference failed
    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(#[from] ort::OrtError),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Camera could not be opened
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Not enough frames with a detected face during calibration
    #[error("Calibration failed: {collected}/{required} face samples after {attempts} attempts")]
    CalibrationFailed {
        /// Samples gathered before the budget ran out
        collected: usize,
        /// Samples needed
        required: usize,
        /// Frames read
        attempts: usize,
    },

    /// Transient failure while reading a frame
    #[error("Frame read error: {0}")]
    FrameRead(String),

    /// Parameter name outside the recognised set
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// Parameter value rejected by validation
    #[error("Invalid value {value} for {name}: {reason}")]
    InvalidParameterValue {
        /// Canonical parameter name
        name: String,
        /// Rejected value
        value: f64,
        /// Why it was rejected
        reason: String,
    },

    /// `X11` window system operation failed
    #[error("X11 error: {0}")]
    X11(String),

    /// Input injection failed
    #[error("Input sink error: {0}")]
    InputSink(String),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model loading or inference error
    #[error("Model error: {0}")]
    ModelError(String),

    /// Model output processing error
    #[error("Model output error: {0}")]
    ModelOutputError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Operation requires a running controller
    #[error("Controller is not running")]
    NotRunning,

    /// `start()` called on a running controller
    #[error("Controller is already running")]
    AlreadyRunning,

    /// Operation interrupted by `stop()`
    #[error("Cancelled")]
    Cancelled,

    /// Worker thread went away
    #[error("Worker channel closed")]
    ChannelClosed,
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
