use crate::capability::FaceCapability;
use crate::detector::{DetectorError, FaceDetector};
use crate::recognizer::{FaceRecognizer, RecognizerError};
use crate::types::{Embedding, FaceLocation};
use image::RgbImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// SCRFD detection model file name.
pub const DETECTOR_MODEL_FILE: &str = "det_10g.onnx";
/// ArcFace recognition model file name.
pub const RECOGNIZER_MODEL_FILE: &str = "w600k_r50.onnx";

/// Euclidean cutoff for L2-normalized ArcFace embeddings.
///
/// Equivalent to cosine similarity ≥ 0.395 (`d² = 2 - 2·cos`).
pub const ARCFACE_MATCH_THRESHOLD: f32 = 1.1;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
}

/// [`FaceCapability`] backed by SCRFD detection and ArcFace embeddings.
pub struct OnnxBackend {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl OnnxBackend {
    /// Load both models from `model_dir`. Fails fast if either is missing.
    pub fn load(model_dir: &Path) -> Result<Self, BackendError> {
        let detector = FaceDetector::load(&model_path(model_dir, DETECTOR_MODEL_FILE))?;
        let recognizer = FaceRecognizer::load(&model_path(model_dir, RECOGNIZER_MODEL_FILE))?;
        Ok(Self {
            detector,
            recognizer,
        })
    }
}

impl FaceCapability for OnnxBackend {
    type Error = BackendError;

    fn locate_faces(&mut self, image: &RgbImage) -> Result<Vec<FaceLocation>, Self::Error> {
        Ok(self.detector.detect(image)?)
    }

    fn compute_embeddings(
        &mut self,
        image: &RgbImage,
        faces: &[FaceLocation],
    ) -> Result<Vec<Embedding>, Self::Error> {
        faces
            .iter()
            .map(|face| self.recognizer.extract(image, face).map_err(BackendError::from))
            .collect()
    }

    fn default_threshold(&self) -> f32 {
        ARCFACE_MATCH_THRESHOLD
    }
}

fn model_path(model_dir: &Path, file: &str) -> String {
    model_dir.join(file).to_string_lossy().into_owned()
}

/// Default directory holding the ONNX models.
///
/// `$KNOWNFACE_MODEL_DIR`, else `$XDG_DATA_HOME/knownface/models`,
/// else `$HOME/.local/share/knownface/models`.
pub fn default_model_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("KNOWNFACE_MODEL_DIR") {
        return PathBuf::from(dir);
    }
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("knownface")
        .join("models")
}
