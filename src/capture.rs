//! Frame sources.
//!
//! The controller reads frames through [`CaptureDevice`]. [`OpenCvCamera`] wraps a
//! webcam; [`ReplayDevice`] plays back a fixed sequence of frames.

use crate::{config::CameraConfig, Error, Result};
use log::{debug, info};
use opencv::{
    core::{self, Mat},
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// A source of video frames owned exclusively by the controller loop
pub trait CaptureDevice: Send {
    /// Frame type handed to the landmark provider
    type Frame;

    /// Blocking read of the next frame. `Ok(None)` means no frame was available.
    ///
    /// # Errors
    ///
    /// Returns `FrameRead` (or a backend error) on a transient read failure
    fn read_frame(&mut self) -> Result<Option<Self::Frame>>;

    /// Release the device. Calling it again is a no-op.
    fn release(&mut self);
}

/// Webcam capture through `OpenCV`
pub struct OpenCvCamera {
    capture: VideoCapture,
    mirror: bool,
    released: bool,
}

impl OpenCvCamera {
    /// Open the camera described by `config`
    ///
    /// # Errors
    ///
    /// Returns `DeviceUnavailable` if the camera cannot be opened
    pub fn open(config: &CameraConfig) -> Result<Self> {
        info!("Opening camera {}", config.index);
        let mut capture = VideoCapture::new(config.index, videoio::CAP_ANY)
            .map_err(|e| Error::DeviceUnavailable(format!("camera {}: {e}", config.index)))?;

        if !capture.is_opened()? {
            return Err(Error::DeviceUnavailable(format!(
                "camera {} could not be opened",
                config.index
            )));
        }

        // Small buffer keeps the frames we process close to real time
        capture.set(CAP_PROP_BUFFERSIZE, f64::from(config.buffer_size))?;
        if let (Some(width), Some(height)) = (config.width, config.height) {
            capture.set(CAP_PROP_FRAME_WIDTH, f64::from(width))?;
            capture.set(CAP_PROP_FRAME_HEIGHT, f64::from(height))?;
        }
        info!(
            "Camera {} opened (buffer size {}, mirror {})",
            config.index, config.buffer_size, config.mirror
        );

        Ok(Self {
            capture,
            mirror: config.mirror,
            released: false,
        })
    }
}

impl CaptureDevice for OpenCvCamera {
    type Frame = Mat;

    fn read_frame(&mut self) -> Result<Option<Mat>> {
        if self.released {
            return Err(Error::FrameRead("camera already released".to_string()));
        }

        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            debug!("Camera returned an empty frame");
            return Ok(None);
        }

        if self.mirror {
            let mut flipped = Mat::default();
            core::flip(&frame, &mut flipped, 1)?;
            return Ok(Some(flipped));
        }
        Ok(Some(frame))
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.capture.release() {
            log::warn!("Failed to release camera: {e}");
        } else {
            info!("Camera released");
        }
    }
}

/// Plays back a fixed list of frames, then either loops or runs dry
#[derive(Debug, Clone)]
pub struct ReplayDevice<F> {
    frames: Vec<F>,
    position: usize,
    looping: bool,
    /// 1-based read numbers that fail without consuming a frame
    failing_reads: Vec<usize>,
    reads: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl<F: Clone + Send> ReplayDevice<F> {
    /// Play `frames` once; afterwards every read yields no frame
    #[must_use]
    pub fn once(frames: Vec<F>) -> Self {
        Self::build(frames, false)
    }

    /// Play `frames` over and over
    #[must_use]
    pub fn looping(frames: Vec<F>) -> Self {
        Self::build(frames, true)
    }

    fn build(frames: Vec<F>, looping: bool) -> Self {
        Self {
            frames,
            position: 0,
            looping,
            failing_reads: Vec::new(),
            reads: Arc::new(AtomicUsize::new(0)),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make the given reads (counted from 1) fail with a transient `FrameRead`
    #[must_use]
    pub fn fail_reads(mut self, reads: impl IntoIterator<Item = usize>) -> Self {
        self.failing_reads.extend(reads);
        self
    }

    /// Shared counter of `read_frame` calls, readable after the device moves away
    #[must_use]
    pub fn read_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.reads)
    }

    /// Shared counter of effective `release` calls
    #[must_use]
    pub fn release_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.releases)
    }

    fn is_released(&self) -> bool {
        self.releases.load(Ordering::SeqCst) > 0
    }
}

impl<F: Clone + Send> CaptureDevice for ReplayDevice<F> {
    type Frame = F;

    fn read_frame(&mut self) -> Result<Option<F>> {
        if self.is_released() {
            return Err(Error::FrameRead("replay device released".to_string()));
        }
        let read = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_reads.contains(&read) {
            return Err(Error::FrameRead(format!("scripted failure on read {read}")));
        }

        if self.frames.is_empty() {
            return Ok(None);
        }
        if self.position >= self.frames.len() {
            if !self.looping {
                return Ok(None);
            }
            self.position = 0;
        }
        let frame = self.frames[self.position].clone();
        self.position += 1;
        Ok(Some(frame))
    }

    fn release(&mut self) {
        if !self.is_released() {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}
