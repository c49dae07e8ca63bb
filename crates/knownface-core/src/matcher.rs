//! Per-frame detect-and-match against a [`Gallery`].

use crate::capability::{FaceCapability, DEFAULT_MATCH_THRESHOLD};
use crate::frame::{Frame, FrameError};
use crate::gallery::Gallery;
use crate::types::{Detection, Embedding, UNKNOWN_LABEL};
use thiserror::Error;

/// Default detection-pass downscale factor.
pub const DEFAULT_RESIZE_FACTOR: f64 = 0.25;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("resize factor must be in (0, 1], got {0}")]
    InvalidResizeFactor(f64),
    #[error("match threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f32),
}

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] FrameError),
    #[error("capability returned {embeddings} embeddings for {faces} faces")]
    EmbeddingCountMismatch { faces: usize, embeddings: usize },
    #[error("face capability: {0}")]
    Capability(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Matcher tuning: detection downscale and match distance cutoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatcherConfig {
    resize_factor: f64,
    match_threshold: f32,
}

impl MatcherConfig {
    pub fn new(resize_factor: f64, match_threshold: f32) -> Result<Self, ConfigError> {
        if !(resize_factor > 0.0 && resize_factor <= 1.0) {
            return Err(ConfigError::InvalidResizeFactor(resize_factor));
        }
        if !(match_threshold.is_finite() && match_threshold >= 0.0) {
            return Err(ConfigError::InvalidThreshold(match_threshold));
        }
        Ok(Self {
            resize_factor,
            match_threshold,
        })
    }

    pub fn resize_factor(&self) -> f64 {
        self.resize_factor
    }

    pub fn match_threshold(&self) -> f32 {
        self.match_threshold
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            resize_factor: DEFAULT_RESIZE_FACTOR,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

/// Result of comparing one probe embedding against the gallery.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// Matched label, or [`UNKNOWN_LABEL`].
    pub label: String,
    /// Index of the nearest gallery entry (if the gallery is non-empty).
    pub nearest: Option<usize>,
    /// Distance to the nearest gallery entry.
    pub distance: Option<f32>,
}

impl MatchOutcome {
    fn unknown(nearest: Option<usize>, distance: Option<f32>) -> Self {
        Self {
            label: UNKNOWN_LABEL.to_string(),
            nearest,
            distance,
        }
    }
}

/// Compare `probe` against every gallery entry.
///
/// The nearest entry (first one on ties) supplies the label only if it also
/// passes `capability.is_match` at `threshold`. Every entry is visited; NaN
/// distances never become the nearest.
pub fn best_match<C: FaceCapability + ?Sized>(
    capability: &C,
    probe: &Embedding,
    gallery: &Gallery,
    threshold: f32,
) -> MatchOutcome {
    let entries = gallery.entries();
    if entries.is_empty() {
        return MatchOutcome::unknown(None, None);
    }

    let mut best_idx: Option<usize> = None;
    let mut best_dist = f32::INFINITY;
    let mut matches = Vec::with_capacity(entries.len());

    for (i, entry) in entries.iter().enumerate() {
        let dist = capability.distance(probe, &entry.embedding);
        if (best_idx.is_none() && !dist.is_nan()) || dist < best_dist {
            best_dist = dist;
            best_idx = Some(i);
        }
        matches.push(capability.is_match(&entry.embedding, probe, threshold));
    }

    match best_idx {
        Some(idx) if matches[idx] => MatchOutcome {
            label: entries[idx].label.clone(),
            nearest: Some(idx),
            distance: Some(best_dist),
        },
        Some(idx) => MatchOutcome::unknown(Some(idx), Some(best_dist)),
        None => MatchOutcome::unknown(None, None),
    }
}

/// Detects faces in frames and labels them from a gallery.
#[derive(Debug, Clone, Default)]
pub struct FrameMatcher {
    config: MatcherConfig,
}

impl FrameMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Detect every face in `frame` and label it from `gallery`.
    ///
    /// Results are in the capability's detection order, one per face, with
    /// boxes in `frame`'s own coordinate space.
    pub fn detect_known_faces<C: FaceCapability>(
        &self,
        capability: &mut C,
        frame: &Frame,
        gallery: &Gallery,
    ) -> Result<Vec<Detection>, MatchError> {
        let small = frame.downscaled_rgb(self.config.resize_factor);

        let faces = capability
            .locate_faces(&small)
            .map_err(|e| MatchError::Capability(Box::new(e)))?;
        if faces.is_empty() {
            tracing::trace!("no faces in frame");
            return Ok(Vec::new());
        }

        let embeddings = capability
            .compute_embeddings(&small, &faces)
            .map_err(|e| MatchError::Capability(Box::new(e)))?;
        if embeddings.len() != faces.len() {
            return Err(MatchError::EmbeddingCountMismatch {
                faces: faces.len(),
                embeddings: embeddings.len(),
            });
        }

        let detections = faces
            .iter()
            .zip(embeddings.iter())
            .map(|(face, embedding)| {
                let outcome = best_match(&*capability, embedding, gallery, self.config.match_threshold);
                tracing::debug!(
                    label = %outcome.label,
                    distance = ?outcome.distance,
                    "face matched"
                );
                Detection {
                    location: face.scaled(self.config.resize_factor),
                    label: outcome.label,
                }
            })
            .collect();

        Ok(detections)
    }

    /// Validate a raw BGR buffer and run [`FrameMatcher::detect_known_faces`] on it.
    pub fn detect_known_faces_bgr<C: FaceCapability>(
        &self,
        capability: &mut C,
        bgr: Vec<u8>,
        width: u32,
        height: u32,
        gallery: &Gallery,
    ) -> Result<Vec<Detection>, MatchError> {
        let frame = Frame::from_bgr(bgr, width, height)?;
        self.detect_known_faces(capability, &frame, gallery)
    }
}
