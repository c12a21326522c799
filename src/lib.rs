//! Hands-free pointer control from facial gestures.
//!
//! A webcam frame goes through a face-mesh landmark model, and four small state
//! machines turn the landmarks into pointer actions:
//! - head movement moves the pointer (smoothed, with a dead zone)
//! - blinks click; two blinks in quick succession double-click
//! - raising the eyebrows right-clicks
//! - opening the mouth and tilting the head scrolls
//!
//! Thresholds are relative to a short per-user calibration taken at start-up.
//!
//! The pipeline is:
//! 1. [`capture::CaptureDevice`] reads a frame
//! 2. [`landmarks::LandmarkProvider`] finds the face mesh
//! 3. [`gestures::GestureEngine`] runs the machines on one [`geometry::FaceSignals`] snapshot
//! 4. [`input_sink::InputSink`] performs the resulting [`input_sink::PointerAction`]s
//!
//! [`controller::Controller`] runs that loop on a background thread and exposes
//! start, stop, pause, resume, recalibrate and live parameter updates.
//!
//! # Examples
//!
//! ## Driving the engine directly
//!
//! ```
//! use face_gesture_mouse::{
//!     calibration::Calibrator,
//!     geometry::FaceSignals,
//!     gestures::{GestureEngine, GestureOptions},
//!     input_sink::RecordingSink,
//!     params::Parameters,
//!     synthetic::SyntheticFace,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let params = Parameters::default();
//! let neutral = SyntheticFace::default().landmarks();
//!
//! let mut calibrator = Calibrator::new(params.calibration_frames);
//! while !calibrator.is_complete() {
//!     calibrator.accumulate(&FaceSignals::measure(&neutral));
//! }
//! let profile = calibrator.finish(&params, params.calibration_frames)?;
//!
//! let mut engine = GestureEngine::new(profile, GestureOptions::default());
//! let mut sink = RecordingSink::default();
//! let raised = SyntheticFace::default().brow_raise(0.02).landmarks();
//! engine.process(Some(&raised), 0.0, &params, &mut sink);
//! assert_eq!(sink.actions().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Running on a webcam
//!
//! ```no_run
//! use face_gesture_mouse::{
//!     capture::OpenCvCamera, config::Config, controller::{Controller, DeviceOpener},
//!     cursor_control::X11InputSink, face_mesh::FaceMeshDetector,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let detector = FaceMeshDetector::from_config(&config.model)?;
//! let camera = config.camera.clone();
//! let opener: DeviceOpener<OpenCvCamera> = Box::new(move || OpenCvCamera::open(&camera));
//! let mut controller = Controller::new(
//!     opener,
//!     detector,
//!     X11InputSink::new()?,
//!     &config,
//! );
//! controller.start()?;
//! std::thread::sleep(std::time::Duration::from_secs(30));
//! controller.stop()?;
//! # Ok(())
//! # }
//! ```

/// Per-user baselines and the calibration routine
pub mod calibration;

/// Frame sources
pub mod capture;

/// Configuration management
pub mod config;

/// Constants used throughout the application
pub mod constants;

/// Lifecycle handle and background gesture loop
pub mod controller;

/// Cursor control module for X11 systems
pub mod cursor_control;

/// Error types and result handling
pub mod error;

/// Engine notifications for UI subscribers
pub mod events;

/// Face-mesh landmark detection with `ONNX` Runtime
pub mod face_mesh;

/// Eye, mouth, eyebrow and head measurements
pub mod geometry;

/// Cursor, blink, eyebrow and scroll state machines
pub mod gestures;

/// Pointer action sink abstraction
pub mod input_sink;

/// Landmark sets and the provider trait
pub mod landmarks;

/// Runtime-tunable gesture parameters
pub mod params;

/// Exponential smoothing of the head position
pub mod smoothing;

/// Synthetic landmark sets for tests and benchmarks
pub mod synthetic;

/// Numeric conversion helpers
pub mod utils;

pub use error::{Error, Result};
