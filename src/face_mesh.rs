//! 468-point face-mesh landmark detection with `ONNX` Runtime.
//!
//! The model sees a centered square crop of the frame resized to 192x192 RGB in
//! `[0, 1]`, NHWC. Its first output holds `468 * 3` floats (x, y, z in input
//! pixels); the optional second output is a face-presence logit.

use crate::{
    config::ModelConfig,
    constants::{FACE_MESH_INPUT_SIZE, NUM_FACE_MESH_LANDMARKS},
    landmarks::{LandmarkProvider, LandmarkSet},
    utils::{i32_to_usize, usize_to_i32},
    Error, Result,
};
use log::{debug, info};
use nalgebra::Point2;
use ndarray::{Array4, CowArray};
use opencv::{
    core::{Mat, Rect, Size, Vec3f, CV_32F},
    imgproc::{self, InterpolationFlags},
    prelude::*,
};
use ort::{Environment, Session, Value};
use std::{path::Path, sync::Arc};

/// Values per landmark in the model output
const COORDS_PER_LANDMARK: usize = 3;

/// Face-mesh landmark provider
pub struct FaceMeshDetector {
    session: Session,
    input_size: i32,
    presence_threshold: f32,
    crop_scale: f32,
}

impl FaceMeshDetector {
    /// Load the model at `model_path`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The `ONNX` model file cannot be loaded
    /// - The model has no inputs or outputs
    /// - The `ONNX` runtime environment cannot be created
    pub fn new<P: AsRef<Path>>(model_path: P, presence_threshold: f32, crop_scale: f32) -> Result<Self> {
        info!(
            "Initializing FaceMeshDetector with model: {}",
            model_path.as_ref().display()
        );
        if !model_path.as_ref().is_file() {
            return Err(Error::ModelError(format!(
                "model file not found: {}",
                model_path.as_ref().display()
            )));
        }

        let environment = Arc::new(
            Environment::builder()
                .with_name("face_mesh")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        if session.inputs.is_empty() {
            return Err(Error::ModelError("Model has no inputs".to_string()));
        }
        if session.outputs.is_empty() {
            return Err(Error::ModelOutputError("Model has no outputs".to_string()));
        }
        debug!(
            "Face mesh model: {} input(s), {} output(s)",
            session.inputs.len(),
            session.outputs.len()
        );

        Ok(Self {
            session,
            input_size: FACE_MESH_INPUT_SIZE,
            presence_threshold,
            crop_scale,
        })
    }

    /// Build from the `model` section of the configuration
    ///
    /// # Errors
    ///
    /// See [`FaceMeshDetector::new`]
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        Self::new(&config.face_mesh, config.presence_threshold, config.crop_scale)
    }

    /// Detect the face in a BGR frame
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing or inference fails, or the output has an
    /// unexpected size
    pub fn detect_frame(&self, frame: &Mat) -> Result<Option<LandmarkSet>> {
        let (width, height) = (frame.cols(), frame.rows());
        let Some(crop) = crop_rect(width, height, self.crop_scale) else {
            return Ok(None);
        };

        let input = self.preprocess(frame, crop)?;
        let (marks, presence) = self.forward(input)?;

        if let Some(logit) = presence {
            let score = sigmoid(logit);
            if score < self.presence_threshold {
                debug!("No face (presence {score:.3})");
                return Ok(None);
            }
        }

        let points = to_frame_coordinates(&marks, crop, width, height, self.input_size)?;
        LandmarkSet::new(points).map(Some)
    }

    /// Crop, resize, convert to RGB and normalize into an NHWC tensor
    fn preprocess(&self, frame: &Mat, crop: Rect) -> Result<Array4<f32>> {
        let size = i32_to_usize(self.input_size)?;
        let channels = 3;

        let cropped = Mat::roi(frame, crop)?.try_clone()?;

        let mut resized = Mat::default();
        imgproc::resize(
            &cropped,
            &mut resized,
            Size::new(self.input_size, self.input_size),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        let mut rgb_image = Mat::default();
        imgproc::cvt_color(&resized, &mut rgb_image, imgproc::COLOR_BGR2RGB, 0)?;

        let mut float_image = Mat::default();
        rgb_image.convert_to(&mut float_image, CV_32F, 1.0 / 255.0, 0.0)?;

        let mut data = Vec::with_capacity(size * size * channels);
        for row in 0..size {
            for col in 0..size {
                let pixel = float_image.at_2d::<Vec3f>(usize_to_i32(row)?, usize_to_i32(col)?)?;
                data.extend_from_slice(&[pixel[0], pixel[1], pixel[2]]);
            }
        }

        Array4::from_shape_vec((1, size, size, channels), data)
            .map_err(|e| Error::ModelError(format!("Failed to create input tensor: {e}")))
    }

    /// Run the model; returns the raw landmark floats and the presence logit
    fn forward(&self, input: Array4<f32>) -> Result<(Vec<f32>, Option<f32>)> {
        let cow_array = CowArray::from(input.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;

        let outputs = self.session.run(vec![input_tensor])?;

        let marks_output = outputs
            .first()
            .ok_or_else(|| Error::ModelOutputError("No output from model".to_string()))?;
        let marks_tensor = marks_output.try_extract::<f32>()?;
        let marks: Vec<f32> = marks_tensor.view().iter().copied().collect();

        let presence = match outputs.get(1) {
            Some(output) => output.try_extract::<f32>()?.view().iter().next().copied(),
            None => None,
        };

        Ok((marks, presence))
    }
}

impl LandmarkProvider<Mat> for FaceMeshDetector {
    fn detect(&mut self, frame: &Mat) -> Result<Option<LandmarkSet>> {
        self.detect_frame(frame)
    }
}

/// Centered square of side `scale * min(width, height)`; `None` for empty frames
#[must_use]
#[allow(clippy::cast_possible_truncation)] // side is bounded by the frame size
pub fn crop_rect(width: i32, height: i32, scale: f32) -> Option<Rect> {
    let shorter = width.min(height);
    if shorter <= 0 {
        return None;
    }
    let side = ((shorter as f32) * scale.clamp(0.0, 1.0)).round() as i32;
    if side <= 0 {
        return None;
    }
    Some(Rect::new((width - side) / 2, (height - side) / 2, side, side))
}

/// Logistic function mapping the presence logit to `[0, 1]`
#[must_use]
pub fn sigmoid(logit: f32) -> f32 {
    1.0 / (1.0 + (-logit).exp())
}

/// Map model-space landmarks back into frame-normalized coordinates
///
/// # Errors
///
/// Returns `ModelOutputError` if `marks` holds fewer than 468 landmarks
pub fn to_frame_coordinates(
    marks: &[f32],
    crop: Rect,
    frame_width: i32,
    frame_height: i32,
    input_size: i32,
) -> Result<Vec<Point2<f64>>> {
    let needed = NUM_FACE_MESH_LANDMARKS * COORDS_PER_LANDMARK;
    if marks.len() < needed {
        return Err(Error::ModelOutputError(format!(
            "Expected {needed} landmark values, got {}",
            marks.len()
        )));
    }

    let scale = f64::from(crop.width) / f64::from(input_size);
    let (fw, fh) = (f64::from(frame_width), f64::from(frame_height));

    Ok(marks
        .chunks_exact(COORDS_PER_LANDMARK)
        .take(NUM_FACE_MESH_LANDMARKS)
        .map(|mark| {
            let x = f64::from(crop.x) + f64::from(mark[0]) * scale;
            let y = f64::from(crop.y) + f64::from(mark[1]) * scale;
            Point2::new(x / fw, y / fh)
        })
        .collect())
}
