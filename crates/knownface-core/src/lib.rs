//! knownface-core — Known-face gallery and per-frame face identification.
//!
//! A [`Gallery`] is built once from a directory of reference images; a
//! [`FrameMatcher`] then labels every face in each video frame by nearest
//! embedding distance. Face detection and embedding extraction sit behind
//! [`FaceCapability`]; [`OnnxBackend`] provides SCRFD + ArcFace via ONNX Runtime.

pub mod backend;
pub mod capability;
pub mod detector;
pub mod frame;
pub mod gallery;
pub mod matcher;
pub mod recognizer;
pub mod types;

pub use backend::{default_model_dir, OnnxBackend, ARCFACE_MATCH_THRESHOLD};
pub use capability::{FaceCapability, DEFAULT_MATCH_THRESHOLD};
pub use frame::Frame;
pub use gallery::{Gallery, GalleryError, LoadReport};
pub use matcher::{FrameMatcher, MatchError, MatcherConfig, DEFAULT_RESIZE_FACTOR};
pub use types::{Detection, Embedding, FaceLocation, GalleryEntry, UNKNOWN_LABEL};
