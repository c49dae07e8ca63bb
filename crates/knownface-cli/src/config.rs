use knownface_core::{FaceCapability, DEFAULT_RESIZE_FACTOR};
use std::path::PathBuf;

/// CLI configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory containing the ONNX model files.
    pub model_dir: PathBuf,
    /// Detection-pass downscale factor, in (0, 1].
    pub resize_factor: f64,
    /// Euclidean distance cutoff for a positive match; the capability's own
    /// default applies when unset.
    pub match_threshold: Option<f32>,
}

impl Config {
    /// Load configuration from `KNOWNFACE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            model_dir: knownface_core::default_model_dir(),
            resize_factor: env_parse("KNOWNFACE_RESIZE_FACTOR", DEFAULT_RESIZE_FACTOR),
            match_threshold: std::env::var("KNOWNFACE_MATCH_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    /// Match threshold: command-line flag, then environment, then the capability default.
    pub fn resolve_match_threshold<C: FaceCapability>(&self, flag: Option<f32>, capability: &C) -> f32 {
        flag.or(self.match_threshold)
            .unwrap_or_else(|| capability.default_threshold())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use knownface_core::{Embedding, FaceLocation};

    struct Calibrated;

    impl FaceCapability for Calibrated {
        type Error = std::io::Error;

        fn locate_faces(&mut self, _image: &RgbImage) -> Result<Vec<FaceLocation>, Self::Error> {
            Ok(Vec::new())
        }

        fn compute_embeddings(
            &mut self,
            _image: &RgbImage,
            _faces: &[FaceLocation],
        ) -> Result<Vec<Embedding>, Self::Error> {
            Ok(Vec::new())
        }

        fn default_threshold(&self) -> f32 {
            1.1
        }
    }

    fn config(match_threshold: Option<f32>) -> Config {
        Config {
            model_dir: PathBuf::from("/models"),
            resize_factor: DEFAULT_RESIZE_FACTOR,
            match_threshold,
        }
    }

    #[test]
    fn test_threshold_falls_back_to_capability_default() {
        assert_eq!(config(None).resolve_match_threshold(None, &Calibrated), 1.1);
    }

    #[test]
    fn test_threshold_env_overrides_capability() {
        assert_eq!(config(Some(0.9)).resolve_match_threshold(None, &Calibrated), 0.9);
    }

    #[test]
    fn test_threshold_flag_overrides_env() {
        assert_eq!(config(Some(0.9)).resolve_match_threshold(Some(0.5), &Calibrated), 0.5);
    }

    #[test]
    fn test_env_parse_fallbacks() {
        std::env::set_var("KNOWNFACE_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_parse("KNOWNFACE_TEST_GARBAGE", 0.25f64), 0.25);
        assert_eq!(env_parse("KNOWNFACE_TEST_UNSET_KEY", 0.6f32), 0.6);

        std::env::set_var("KNOWNFACE_TEST_VALUE", "0.5");
        assert_eq!(env_parse("KNOWNFACE_TEST_VALUE", 0.25f64), 0.5);
    }
}
