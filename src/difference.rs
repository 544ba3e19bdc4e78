//! Perceptual difference between comparison frames.
//!
//! A [`SimilarityMetric`] scores two equally-shaped grayscale images in
//! `[0, 1]`. [`difference`] turns that score into a 0–100 "percent
//! different" value, which is what the keyframe selector thresholds on.
//!
//! The default metric is [`StructuralSimilarity`], the mean structural
//! similarity index computed over every window that fits entirely inside
//! the image.
//!
//! # Example
//!
//! ```
//! use image::GrayImage;
//! use slidegen::difference::{StructuralSimilarity, difference};
//!
//! let a = GrayImage::from_pixel(64, 48, image::Luma([30]));
//! let b = a.clone();
//! let percent = difference(&StructuralSimilarity::default(), &a, &b)?;
//! assert_eq!(percent, 0.0);
//! # Ok::<(), slidegen::SlideError>(())
//! ```

use image::GrayImage;

use crate::{configuration::ComparisonSize, error::SlideError};

/// Scores how alike two grayscale images are.
///
/// Implementations receive images of identical dimensions (the caller
/// checks) and return a similarity where 1.0 means identical. Values
/// outside `[0, 1]` are clamped by [`difference`].
pub trait SimilarityMetric: Send + Sync {
    /// Similarity of `first` and `second`.
    fn similarity(&self, first: &GrayImage, second: &GrayImage) -> Result<f64, SlideError>;

    /// Reject comparison frames of `size` up front, before any frame is
    /// decoded. Accepts every size unless overridden.
    fn validate(&self, size: ComparisonSize) -> Result<(), SlideError> {
        let _ = size;
        Ok(())
    }
}

impl<M: SimilarityMetric + ?Sized> SimilarityMetric for Box<M> {
    fn similarity(&self, first: &GrayImage, second: &GrayImage) -> Result<f64, SlideError> {
        (**self).similarity(first, second)
    }

    fn validate(&self, size: ComparisonSize) -> Result<(), SlideError> {
        (**self).validate(size)
    }
}

/// Percent difference between two grayscale images: `100 * (1 - similarity)`.
///
/// # Errors
///
/// Returns [`SlideError::DimensionMismatch`] if the images differ in size,
/// or whatever the metric reports for images it cannot score.
pub fn difference<M: SimilarityMetric + ?Sized>(
    metric: &M,
    first: &GrayImage,
    second: &GrayImage,
) -> Result<f64, SlideError> {
    if first.dimensions() != second.dimensions() {
        return Err(SlideError::DimensionMismatch {
            left: first.dimensions(),
            right: second.dimensions(),
        });
    }

    let similarity = metric.similarity(first, second)?;
    if similarity.is_nan() {
        return Err(SlideError::InvalidComparison(
            "similarity metric returned NaN".to_string(),
        ));
    }
    Ok(100.0 * (1.0 - similarity.clamp(0.0, 1.0)))
}

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;

/// Mean structural similarity (SSIM) with a uniform square window.
///
/// Local means, variances and covariance are taken over `window × window`
/// neighbourhoods using sample (N-1) normalisation. The score is the mean of
/// the local SSIM map over every pixel whose window lies fully inside the
/// image, so a border of `window / 2` pixels does not contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuralSimilarity {
    window: u32,
}

impl Default for StructuralSimilarity {
    fn default() -> Self {
        Self { window: 7 }
    }
}

impl StructuralSimilarity {
    /// Use a `window × window` neighbourhood.
    ///
    /// # Errors
    ///
    /// Returns [`SlideError::InvalidComparison`] unless `window` is odd and
    /// at least 3.
    pub fn with_window(window: u32) -> Result<Self, SlideError> {
        if window < 3 || window % 2 == 0 {
            return Err(SlideError::InvalidComparison(format!(
                "SSIM window must be odd and at least 3, got {window}"
            )));
        }
        Ok(Self { window })
    }

    /// Side length of the window.
    pub fn window(&self) -> u32 {
        self.window
    }

    fn check_fits(&self, width: u32, height: u32) -> Result<(), SlideError> {
        if width < self.window || height < self.window {
            return Err(SlideError::InvalidComparison(format!(
                "{width}x{height} image is smaller than the {0}x{0} SSIM window",
                self.window
            )));
        }
        Ok(())
    }
}

impl SimilarityMetric for StructuralSimilarity {
    fn similarity(&self, first: &GrayImage, second: &GrayImage) -> Result<f64, SlideError> {
        let (width, height) = first.dimensions();
        self.check_fits(width, height)?;

        let sums = WindowSums::new(first, second);
        let window = self.window as usize;
        let samples = (window * window) as f64;
        let covariance_norm = samples / (samples - 1.0);
        let c1 = (K1 * DATA_RANGE).powi(2);
        let c2 = (K2 * DATA_RANGE).powi(2);

        let columns = width as usize - window + 1;
        let rows = height as usize - window + 1;
        let mut total = 0.0;

        for top in 0..rows {
            for left in 0..columns {
                let [sx, sy, sxx, syy, sxy] = sums.window(left, top, window);
                let mean_x = sx as f64 / samples;
                let mean_y = sy as f64 / samples;
                let variance_x = covariance_norm * (sxx as f64 / samples - mean_x * mean_x);
                let variance_y = covariance_norm * (syy as f64 / samples - mean_y * mean_y);
                let covariance = covariance_norm * (sxy as f64 / samples - mean_x * mean_y);

                let numerator = (2.0 * mean_x * mean_y + c1) * (2.0 * covariance + c2);
                let denominator =
                    (mean_x * mean_x + mean_y * mean_y + c1) * (variance_x + variance_y + c2);
                total += numerator / denominator;
            }
        }

        Ok(total / (rows * columns) as f64)
    }

    fn validate(&self, size: ComparisonSize) -> Result<(), SlideError> {
        self.check_fits(size.width, size.height)
    }
}

/// Summed-area tables of x, y, x², y² and xy, one row of padding on the
/// top and left so any window sum is four lookups.
struct WindowSums {
    stride: usize,
    tables: [Vec<u64>; 5],
}

impl WindowSums {
    fn new(first: &GrayImage, second: &GrayImage) -> Self {
        let (width, height) = first.dimensions();
        let (width, height) = (width as usize, height as usize);
        let stride = width + 1;
        let size = stride * (height + 1);
        let mut tables: [Vec<u64>; 5] = std::array::from_fn(|_| vec![0; size]);

        let xs = first.as_raw();
        let ys = second.as_raw();
        for row in 0..height {
            let mut running = [0u64; 5];
            for column in 0..width {
                let x = u64::from(xs[row * width + column]);
                let y = u64::from(ys[row * width + column]);
                let values = [x, y, x * x, y * y, x * y];
                let at = (row + 1) * stride + column + 1;
                for (table, (sum, value)) in tables.iter_mut().zip(running.iter_mut().zip(values)) {
                    *sum += value;
                    table[at] = table[at - stride] + *sum;
                }
            }
        }

        Self { stride, tables }
    }

    fn window(&self, left: usize, top: usize, size: usize) -> [u64; 5] {
        let top_left = top * self.stride + left;
        let top_right = top_left + size;
        let bottom_left = (top + size) * self.stride + left;
        let bottom_right = bottom_left + size;
        std::array::from_fn(|i| {
            let table = &self.tables[i];
            table[bottom_right] + table[top_left] - table[top_right] - table[bottom_left]
        })
    }
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    fn gradient(width: u32, height: u32, offset: u8) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            Luma([((x * 3 + y * 5) % 200) as u8 + offset])
        })
    }

    #[test]
    fn window_sums_match_direct_sum() {
        let a = gradient(12, 9, 0);
        let b = gradient(12, 9, 40);
        let sums = WindowSums::new(&a, &b);

        let mut expected = [0u64; 5];
        for y in 2..7 {
            for x in 4..9 {
                let p = u64::from(a.get_pixel(x, y).0[0]);
                let q = u64::from(b.get_pixel(x, y).0[0]);
                expected[0] += p;
                expected[1] += q;
                expected[2] += p * p;
                expected[3] += q * q;
                expected[4] += p * q;
            }
        }

        assert_eq!(sums.window(4, 2, 5), expected);
    }

    #[test]
    fn flat_images_of_different_brightness_are_not_identical() {
        let dark = GrayImage::from_pixel(16, 16, Luma([0]));
        let bright = GrayImage::from_pixel(16, 16, Luma([255]));
        let score = StructuralSimilarity::default()
            .similarity(&dark, &bright)
            .unwrap();
        assert!(score < 0.01, "score was {score}");
    }
}
