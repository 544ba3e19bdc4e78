//! Frame value types.
//!
//! A decoded picture exists in two forms that are never interchangeable:
//!
//! - [`Frame`] is the original colour image, the thing that ends up on a
//!   slide. Only frames can be persisted.
//! - [`ComparisonFrame`] is a grayscale, fixed-resolution derivative used
//!   only to score similarity. It is never persisted.

use image::{DynamicImage, GrayImage, imageops::FilterType};

use crate::configuration::ComparisonSize;

/// A decoded video frame at its source resolution.
#[derive(Debug, Clone)]
pub struct Frame {
    index: u64,
    image: DynamicImage,
}

impl Frame {
    /// Wrap a decoded image together with its position in decode order.
    pub fn new(index: u64, image: DynamicImage) -> Self {
        Self { index, image }
    }

    /// Position of this frame in decode order (0-based).
    pub fn index(&self) -> u64 {
        self.index
    }

    /// The colour image.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Pixel `(width, height)` of the image.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Take the image out of the frame.
    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}

/// Normalized grayscale copy of a [`Frame`], used as selector input.
#[derive(Debug, Clone)]
pub struct ComparisonFrame {
    index: u64,
    image: GrayImage,
}

impl ComparisonFrame {
    /// Convert `frame` to grayscale and resize it to `size` with a cubic
    /// filter, ignoring the source aspect ratio.
    pub fn from_frame(frame: &Frame, size: ComparisonSize) -> Self {
        let gray = frame.image.to_luma8();
        let image = if gray.dimensions() == (size.width, size.height) {
            gray
        } else {
            image::imageops::resize(&gray, size.width, size.height, FilterType::CatmullRom)
        };
        Self {
            index: frame.index,
            image,
        }
    }

    /// Wrap an already normalized grayscale image.
    pub fn from_gray(index: u64, image: GrayImage) -> Self {
        Self { index, image }
    }

    /// Decode index of the frame this was derived from.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// The grayscale pixels.
    pub fn image(&self) -> &GrayImage {
        &self.image
    }
}
