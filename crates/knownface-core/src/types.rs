use serde::{Deserialize, Serialize};

/// Label assigned to a face that has no acceptable gallery match.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Face bounding box in integer pixel coordinates, ordered `top, right, bottom, left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceLocation {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl FaceLocation {
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Divide every coordinate by `factor`, truncating toward zero.
    ///
    /// This is the inverse of downscaling an image by `factor` before detection.
    /// Division happens in `f64` so that factors such as 0.25 map exactly.
    pub fn scaled(&self, factor: f64) -> Self {
        let up = |v: i32| (v as f64 / factor) as i32;
        Self {
            top: up(self.top),
            right: up(self.right),
            bottom: up(self.bottom),
            left: up(self.left),
        }
    }
}

/// Face embedding vector (512-dimensional for ArcFace, 128 for dlib-style models).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
    /// Model version that produced this embedding (e.g., "w600k_r50").
    pub model_version: Option<String>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values,
            model_version: None,
        }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Euclidean distance between two embeddings.
    ///
    /// Embeddings of different dimension are never comparable and yield `+inf`.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        if self.values.len() != other.values.len() {
            return f32::INFINITY;
        }
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// A known face: one embedding and the identity it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub embedding: Embedding,
    /// Identity label, derived from the source filename without its extension.
    pub label: String,
}

/// One face found in a frame, in original frame coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(flatten)]
    pub location: FaceLocation,
    pub label: String,
}

impl Detection {
    pub fn is_known(&self) -> bool {
        self.label != UNKNOWN_LABEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance_identical() {
        let a = Embedding::new(vec![0.3, 0.4, 0.5]);
        assert_eq!(a.euclidean_distance(&a), 0.0);
    }

    #[test]
    fn test_euclidean_distance_3_4_5() {
        let a = Embedding::new(vec![0.0, 0.0]);
        let b = Embedding::new(vec![3.0, 4.0]);
        assert!((a.euclidean_distance(&b) - 5.0).abs() < 1e-6);
        assert!((b.euclidean_distance(&a) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_euclidean_distance_dimension_mismatch() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![1.0, 0.0, 0.0]);
        assert_eq!(a.euclidean_distance(&b), f32::INFINITY);
    }

    #[test]
    fn test_scaled_quarter_is_exact() {
        let loc = FaceLocation::new(10, 50, 60, 5);
        assert_eq!(loc.scaled(0.25), FaceLocation::new(40, 200, 240, 20));
    }

    #[test]
    fn test_scaled_truncates_toward_zero() {
        // 10 / 0.3 = 33.33.., 7 / 0.3 = 23.33.., 2 / 0.3 = 6.66..
        let loc = FaceLocation::new(10, 7, 2, 0);
        assert_eq!(loc.scaled(0.3), FaceLocation::new(33, 23, 6, 0));
    }

    #[test]
    fn test_scaled_identity() {
        let loc = FaceLocation::new(1, 2, 3, 4);
        assert_eq!(loc.scaled(1.0), loc);
    }

    #[test]
    fn test_width_height() {
        let loc = FaceLocation::new(10, 50, 60, 5);
        assert_eq!(loc.width(), 45);
        assert_eq!(loc.height(), 50);
    }

    #[test]
    fn test_detection_serializes_flat() {
        let det = Detection {
            location: FaceLocation::new(40, 200, 240, 20),
            label: "alice".into(),
        };
        let json = serde_json::to_value(&det).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"top": 40, "right": 200, "bottom": 240, "left": 20, "label": "alice"})
        );
        assert!(det.is_known());
    }
}
