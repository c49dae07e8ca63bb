//! ArcFace face recognizer via ONNX Runtime.
//!
//! Extracts 512-dimensional, L2-normalized embeddings from face crops using the
//! w600k_r50 ArcFace model.

use crate::types::{Embedding, FaceLocation};
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const ARCFACE_INPUT_SIZE: u32 = 112;
const ARCFACE_MEAN: f32 = 127.5;
const ARCFACE_STD: f32 = 127.5; // symmetric, unlike SCRFD
const ARCFACE_EMBEDDING_DIM: usize = 512;
const ARCFACE_MODEL_VERSION: &str = "w600k_r50";

#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("face box {0:?} lies outside the image")]
    EmptyCrop(FaceLocation),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// ArcFace-based face recognizer.
pub struct FaceRecognizer {
    session: Session,
}

impl FaceRecognizer {
    /// Load the ArcFace ONNX model from the given path.
    pub fn load(model_path: &str) -> Result<Self, RecognizerError> {
        if !Path::new(model_path).exists() {
            return Err(RecognizerError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        tracing::info!(
            path = model_path,
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "loaded ArcFace model"
        );

        Ok(Self { session })
    }

    /// Extract the embedding of the face inside `face`.
    pub fn extract(&mut self, image: &RgbImage, face: &FaceLocation) -> Result<Embedding, RecognizerError> {
        let crop = crop_face(image, face).ok_or(RecognizerError::EmptyCrop(*face))?;
        let input = preprocess(&crop);

        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;
        let (_, raw) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| RecognizerError::InferenceFailed(format!("embedding extraction: {e}")))?;

        if raw.len() != ARCFACE_EMBEDDING_DIM {
            return Err(RecognizerError::InferenceFailed(format!(
                "expected {ARCFACE_EMBEDDING_DIM}-dim embedding, got {}",
                raw.len()
            )));
        }

        Ok(Embedding {
            values: l2_normalize(raw),
            model_version: Some(ARCFACE_MODEL_VERSION.to_string()),
        })
    }
}

/// Crop `face` out of `image` (clamped to bounds) and resize it to the model input.
fn crop_face(image: &RgbImage, face: &FaceLocation) -> Option<RgbImage> {
    let (w, h) = image.dimensions();
    let left = face.left.clamp(0, w as i32) as u32;
    let right = face.right.clamp(0, w as i32) as u32;
    let top = face.top.clamp(0, h as i32) as u32;
    let bottom = face.bottom.clamp(0, h as i32) as u32;
    if right <= left || bottom <= top {
        return None;
    }

    let crop = imageops::crop_imm(image, left, top, right - left, bottom - top).to_image();
    Some(imageops::resize(
        &crop,
        ARCFACE_INPUT_SIZE,
        ARCFACE_INPUT_SIZE,
        FilterType::Triangle,
    ))
}

/// Normalize a 112×112 RGB crop into a 1×3×112×112 tensor.
fn preprocess(crop: &RgbImage) -> Array4<f32> {
    let size = ARCFACE_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in crop.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel.0[c] as f32 - ARCFACE_MEAN) / ARCFACE_STD;
        }
    }
    tensor
}

fn l2_normalize(raw: &[f32]) -> Vec<f32> {
    let norm: f32 = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        raw.iter().map(|x| x / norm).collect()
    } else {
        raw.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_face_resizes_to_input() {
        let image = RgbImage::new(64, 48);
        let crop = crop_face(&image, &FaceLocation::new(4, 40, 36, 8)).unwrap();
        assert_eq!(crop.dimensions(), (ARCFACE_INPUT_SIZE, ARCFACE_INPUT_SIZE));
    }

    #[test]
    fn test_crop_face_clamps_to_bounds() {
        let image = RgbImage::new(32, 32);
        assert!(crop_face(&image, &FaceLocation::new(-10, 50, 50, -10)).is_some());
    }

    #[test]
    fn test_crop_face_outside_image() {
        let image = RgbImage::new(32, 32);
        assert!(crop_face(&image, &FaceLocation::new(40, 60, 60, 40)).is_none());
        assert!(crop_face(&image, &FaceLocation::new(5, 5, 10, 5)).is_none());
    }

    #[test]
    fn test_preprocess_normalization() {
        let crop = RgbImage::from_pixel(112, 112, image::Rgb([255, 128, 0]));
        let tensor = preprocess(&crop);
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
        assert!((tensor[[0, 0, 5, 7]] - 1.0).abs() < 1e-6);
        assert!((tensor[[0, 1, 5, 7]] - (128.0 - ARCFACE_MEAN) / ARCFACE_STD).abs() < 1e-6);
        assert!((tensor[[0, 2, 5, 7]] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize() {
        let v = l2_normalize(&[3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert_eq!(l2_normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }
}
