//! Face detection and embedding capability.
//!
//! The gallery builder and the frame matcher only talk to face models through
//! [`FaceCapability`]. [`crate::backend::OnnxBackend`] is the bundled
//! implementation; tests use scripted fakes.

use crate::types::{Embedding, FaceLocation};
use image::RgbImage;

/// Distance cutoff below which two embeddings are considered the same person.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.6;

/// Black-box face detection + embedding extraction.
pub trait FaceCapability {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Locate faces in an RGB image, in that image's pixel coordinates.
    fn locate_faces(&mut self, image: &RgbImage) -> Result<Vec<FaceLocation>, Self::Error>;

    /// Compute one embedding per face, order-aligned with `faces`.
    fn compute_embeddings(
        &mut self,
        image: &RgbImage,
        faces: &[FaceLocation],
    ) -> Result<Vec<Embedding>, Self::Error>;

    /// Distance between two embeddings. Lower = more similar.
    fn distance(&self, a: &Embedding, b: &Embedding) -> f32 {
        a.euclidean_distance(b)
    }

    /// Whether `a` and `b` are close enough to be the same identity.
    fn is_match(&self, a: &Embedding, b: &Embedding, threshold: f32) -> bool {
        self.distance(a, b) <= threshold
    }

    /// Match cutoff calibrated for this capability's embedding space.
    fn default_threshold(&self) -> f32 {
        DEFAULT_MATCH_THRESHOLD
    }
}

impl<C: FaceCapability + ?Sized> FaceCapability for &mut C {
    type Error = C::Error;

    fn locate_faces(&mut self, image: &RgbImage) -> Result<Vec<FaceLocation>, Self::Error> {
        (**self).locate_faces(image)
    }

    fn compute_embeddings(
        &mut self,
        image: &RgbImage,
        faces: &[FaceLocation],
    ) -> Result<Vec<Embedding>, Self::Error> {
        (**self).compute_embeddings(image, faces)
    }

    fn distance(&self, a: &Embedding, b: &Embedding) -> f32 {
        (**self).distance(a, b)
    }

    fn is_match(&self, a: &Embedding, b: &Embedding, threshold: f32) -> bool {
        (**self).is_match(a, b, threshold)
    }

    fn default_threshold(&self) -> f32 {
        (**self).default_threshold()
    }
}
