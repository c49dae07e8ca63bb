//! Known-faces gallery, built once from a directory of reference images.
//!
//! Every regular file in the directory is treated as a candidate image. Files
//! that fail to decode, contain no face, or trip a capability error are skipped
//! with a warning; only a missing or unlistable directory aborts the load.

use crate::capability::FaceCapability;
use crate::types::{Embedding, GalleryEntry};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("gallery directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("failed to read gallery directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a gallery image did not produce an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The file could not be opened or decoded as an image.
    Unreadable(String),
    /// The image decoded but no face was found in it.
    NoFace,
    /// The capability failed on this image.
    Capability(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Unreadable(e) => write!(f, "could not load image: {e}"),
            SkipReason::NoFace => write!(f, "no face found in image"),
            SkipReason::Capability(e) => write!(f, "face capability failed: {e}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkippedImage {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Outcome of a gallery load, alongside the gallery itself.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Regular files found in the directory.
    pub images_found: usize,
    /// Files that produced a gallery entry.
    pub loaded: usize,
    pub skipped: Vec<SkippedImage>,
}

/// Immutable collection of known faces.
///
/// Entry order follows the sorted file names of the source directory and is
/// used to break distance ties during matching.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
}

impl Gallery {
    /// Build a gallery from explicit entries.
    pub fn from_entries(entries: Vec<GalleryEntry>) -> Self {
        Self { entries }
    }

    /// Load every image in `directory` (non-recursive) into a gallery.
    pub fn load<C: FaceCapability>(
        directory: impl AsRef<Path>,
        capability: &mut C,
    ) -> Result<Self, GalleryError> {
        Self::load_with_report(directory, capability).map(|(gallery, _)| gallery)
    }

    /// Like [`Gallery::load`], also returning which files were skipped and why.
    pub fn load_with_report<C: FaceCapability>(
        directory: impl AsRef<Path>,
        capability: &mut C,
    ) -> Result<(Self, LoadReport), GalleryError> {
        let directory = directory.as_ref();
        let files = list_image_files(directory)?;
        tracing::info!(
            dir = %directory.display(),
            count = files.len(),
            "gallery images found"
        );

        let mut entries = Vec::new();
        let mut report = LoadReport {
            images_found: files.len(),
            ..LoadReport::default()
        };

        for path in files {
            match embed_file(&path, capability) {
                Ok(embedding) => {
                    let label = label_for(&path);
                    tracing::debug!(path = %path.display(), %label, dim = embedding.dim(), "gallery entry added");
                    entries.push(GalleryEntry { embedding, label });
                    report.loaded += 1;
                }
                Err(reason) => {
                    tracing::warn!(path = %path.display(), %reason, "skipping gallery image");
                    report.skipped.push(SkippedImage { path, reason });
                }
            }
        }

        tracing::info!(
            loaded = report.loaded,
            skipped = report.skipped.len(),
            "gallery loaded"
        );

        Ok((Self { entries }, report))
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels in gallery order. Repeated labels are kept.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }
}

/// Regular files directly inside `directory`, sorted by file name.
fn list_image_files(directory: &Path) -> Result<Vec<PathBuf>, GalleryError> {
    if !directory.is_dir() {
        return Err(GalleryError::DirectoryNotFound(directory.to_path_buf()));
    }

    let read_dir = std::fs::read_dir(directory).map_err(|source| GalleryError::ReadDir {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|source| GalleryError::ReadDir {
            path: directory.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Decode one image and extract the embedding of its first face.
fn embed_file<C: FaceCapability>(path: &Path, capability: &mut C) -> Result<Embedding, SkipReason> {
    // Format is sniffed from content so any extension works.
    let rgb = image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| SkipReason::Unreadable(e.to_string()))?
        .decode()
        .map_err(|e| SkipReason::Unreadable(e.to_string()))?
        .to_rgb8();

    let faces = capability
        .locate_faces(&rgb)
        .map_err(|e| SkipReason::Capability(e.to_string()))?;
    if faces.is_empty() {
        return Err(SkipReason::NoFace);
    }

    let embeddings = capability
        .compute_embeddings(&rgb, &faces)
        .map_err(|e| SkipReason::Capability(e.to_string()))?;

    if embeddings.len() > 1 {
        tracing::debug!(
            path = %path.display(),
            faces = embeddings.len(),
            "multiple faces in gallery image; using the first"
        );
    }

    embeddings.into_iter().next().ok_or(SkipReason::NoFace)
}

/// Identity label: the file name with its last extension removed.
fn label_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FaceLocation;
    use image::{Rgb, RgbImage};

    /// Reads faces from the top-left pixel: red = face count, green = embedding value.
    /// A blue channel of 255 makes detection fail.
    struct PixelCoded;

    impl FaceCapability for PixelCoded {
        type Error = std::io::Error;

        fn locate_faces(&mut self, image: &RgbImage) -> Result<Vec<FaceLocation>, Self::Error> {
            let [red, _, blue] = image.get_pixel(0, 0).0;
            if blue == 255 {
                return Err(std::io::Error::other("detector crashed"));
            }
            let n = red as i32;
            Ok((0..n).map(|i| FaceLocation::new(i, i + 1, i + 1, i)).collect())
        }

        fn compute_embeddings(
            &mut self,
            image: &RgbImage,
            faces: &[FaceLocation],
        ) -> Result<Vec<Embedding>, Self::Error> {
            let v = image.get_pixel(0, 0).0[1] as f32;
            Ok(faces
                .iter()
                .map(|f| Embedding::new(vec![v, f.top as f32]))
                .collect())
        }
    }

    fn write_png(dir: &Path, name: &str, faces: u8, value: u8) {
        RgbImage::from_pixel(2, 2, Rgb([faces, value, 0]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn test_label_strips_last_extension() {
        assert_eq!(label_for(Path::new("/x/alice.jpg")), "alice");
        assert_eq!(label_for(Path::new("/x/bob.smith.png")), "bob.smith");
        assert_eq!(label_for(Path::new("/x/carol")), "carol");
    }

    #[test]
    fn test_missing_directory_is_hard_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        let err = Gallery::load(&missing, &mut PixelCoded).unwrap_err();
        assert!(matches!(err, GalleryError::DirectoryNotFound(p) if p == missing));
    }

    #[test]
    fn test_file_path_is_not_a_directory() {
        let tmp = tempfile::tempdir().unwrap();
        write_png(tmp.path(), "alice.png", 1, 10);
        let err = Gallery::load(tmp.path().join("alice.png"), &mut PixelCoded).unwrap_err();
        assert!(matches!(err, GalleryError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_empty_directory_gives_empty_gallery() {
        let tmp = tempfile::tempdir().unwrap();
        let (gallery, report) = Gallery::load_with_report(tmp.path(), &mut PixelCoded).unwrap();
        assert!(gallery.is_empty());
        assert_eq!(report.images_found, 0);
    }

    #[test]
    fn test_skips_unreadable_and_faceless() {
        let tmp = tempfile::tempdir().unwrap();
        write_png(tmp.path(), "alice.png", 1, 10);
        write_png(tmp.path(), "empty.png", 0, 10);
        std::fs::write(tmp.path().join("notes.txt"), b"not an image").unwrap();
        std::fs::create_dir(tmp.path().join("nested")).unwrap();
        write_png(&tmp.path().join("nested"), "hidden.png", 1, 99);

        let (gallery, report) = Gallery::load_with_report(tmp.path(), &mut PixelCoded).unwrap();

        assert_eq!(gallery.labels().collect::<Vec<_>>(), vec!["alice"]);
        assert_eq!(report.images_found, 3);
        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped.len(), 2);
        assert!(report
            .skipped
            .iter()
            .any(|s| s.path.ends_with("empty.png") && s.reason == SkipReason::NoFace));
        assert!(report
            .skipped
            .iter()
            .any(|s| s.path.ends_with("notes.txt") && matches!(s.reason, SkipReason::Unreadable(_))));
    }

    #[test]
    fn test_capability_error_skips_only_that_file() {
        let tmp = tempfile::tempdir().unwrap();
        write_png(tmp.path(), "alice.png", 1, 10);
        RgbImage::from_pixel(2, 2, Rgb([1, 20, 255]))
            .save(tmp.path().join("cursed.png"))
            .unwrap();
        write_png(tmp.path(), "zoe.png", 1, 30);

        let (gallery, report) = Gallery::load_with_report(tmp.path(), &mut PixelCoded).unwrap();

        assert_eq!(gallery.labels().collect::<Vec<_>>(), vec!["alice", "zoe"]);
        assert_eq!(report.loaded, 2);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("cursed.png"));
        assert!(matches!(
            &report.skipped[0].reason,
            SkipReason::Capability(msg) if msg.contains("detector crashed")
        ));
    }

    #[test]
    fn test_multi_face_image_uses_first_embedding() {
        let tmp = tempfile::tempdir().unwrap();
        write_png(tmp.path(), "group.png", 3, 42);

        let gallery = Gallery::load(tmp.path(), &mut PixelCoded).unwrap();

        assert_eq!(gallery.len(), 1);
        // First face has top == 0
        assert_eq!(gallery.entries()[0].embedding.values, vec![42.0, 0.0]);
    }

    #[test]
    fn test_entries_sorted_by_file_name() {
        let tmp = tempfile::tempdir().unwrap();
        write_png(tmp.path(), "zed.png", 1, 1);
        write_png(tmp.path(), "amy.png", 1, 2);
        write_png(tmp.path(), "mia.png", 1, 3);

        let gallery = Gallery::load(tmp.path(), &mut PixelCoded).unwrap();
        assert_eq!(gallery.labels().collect::<Vec<_>>(), vec!["amy", "mia", "zed"]);
    }
}
