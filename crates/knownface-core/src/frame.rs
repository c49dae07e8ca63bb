//! Frame type and pixel handling — BGR validation, proportional downscale, BGR→RGB.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

const BGR_CHANNELS: usize = 3;

/// A decoded video frame in the capture convention: row-major BGR, 3 bytes per pixel.
#[derive(Clone)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Frame {
    /// Wrap a packed BGR buffer. The buffer must hold exactly `width * height * 3` bytes.
    pub fn from_bgr(data: Vec<u8>, width: u32, height: u32) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroDimensions { width, height });
        }
        let expected = width as usize * height as usize * BGR_CHANNELS;
        if data.len() != expected {
            return Err(FrameError::InvalidLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Build a BGR frame from an RGB image, swapping the red and blue channels.
    pub fn from_rgb_image(image: &RgbImage) -> Result<Self, FrameError> {
        let mut data = image.as_raw().clone();
        swap_red_blue(&mut data);
        Self::from_bgr(data, image.width(), image.height())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw BGR bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Convert to an RGB image of the same size.
    pub fn to_rgb(&self) -> RgbImage {
        let stride = self.width as usize * BGR_CHANNELS;
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let i = y as usize * stride + x as usize * BGR_CHANNELS;
            Rgb([self.data[i + 2], self.data[i + 1], self.data[i]])
        })
    }

    /// Downscale by `factor` on both axes and convert to RGB.
    ///
    /// Target size is `round(width * factor)` × `round(height * factor)`, never
    /// smaller than 1×1. A factor of 1.0 skips resampling.
    pub fn downscaled_rgb(&self, factor: f64) -> RgbImage {
        let rgb = self.to_rgb();
        let (w, h) = scaled_dimensions(self.width, self.height, factor);
        if (w, h) == (self.width, self.height) {
            return rgb;
        }
        imageops::resize(&rgb, w, h, FilterType::Triangle)
    }
}

/// Proportional target size for a downscale by `factor`.
pub fn scaled_dimensions(width: u32, height: u32, factor: f64) -> (u32, u32) {
    let scale = |v: u32| ((v as f64 * factor).round() as u32).max(1);
    (scale(width), scale(height))
}

/// Swap bytes 0 and 2 of every 3-byte pixel (BGR ↔ RGB).
fn swap_red_blue(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(BGR_CHANNELS) {
        px.swap(0, 2);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid BGR buffer length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("frame dimensions are zero: {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },
}
