//! Keyframe selection.
//!
//! [`KeyframeSelector`] decides, frame by frame, whether a sampled frame is
//! distinct enough to become a slide. Every candidate is compared against
//! the last *retained* frame, not the last sampled one, so a slow fade is
//! retained once it has drifted far enough from the previous slide.

use crate::{
    difference::{SimilarityMetric, StructuralSimilarity, difference},
    error::SlideError,
    frame::ComparisonFrame,
};

/// Outcome of offering one comparison frame to the selector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// First frame of the run; always retained.
    Seed,
    /// Difference exceeded the threshold; the frame was retained.
    Retained {
        /// Percent difference from the previously retained frame.
        difference: f64,
    },
    /// Difference did not exceed the threshold; the frame was dropped.
    Dropped {
        /// Percent difference from the last retained frame.
        difference: f64,
    },
}

impl Decision {
    /// Whether the frame became a keyframe.
    pub fn is_retained(&self) -> bool {
        !matches!(self, Decision::Dropped { .. })
    }

    /// The computed difference; `None` for the seed frame.
    pub fn difference(&self) -> Option<f64> {
        match *self {
            Decision::Seed => None,
            Decision::Retained { difference } | Decision::Dropped { difference } => {
                Some(difference)
            }
        }
    }
}

/// Stateful keep/drop decision unit.
///
/// The selector is either empty (nothing retained yet) or seeded with the
/// last retained [`ComparisonFrame`]. Retaining a frame moves it into the
/// selector and drops the one it replaces.
///
/// # Example
///
/// ```
/// use image::{GrayImage, Luma};
/// use slidegen::{ComparisonFrame, Decision, KeyframeSelector};
///
/// let mut selector = KeyframeSelector::new(5.0)?;
/// let blank = GrayImage::from_pixel(32, 32, Luma([0]));
///
/// let first = selector.consider(ComparisonFrame::from_gray(0, blank.clone()))?;
/// assert_eq!(first, Decision::Seed);
///
/// let repeat = selector.consider(ComparisonFrame::from_gray(30, blank))?;
/// assert!(!repeat.is_retained());
/// assert_eq!(selector.retained(), &[0]);
/// # Ok::<(), slidegen::SlideError>(())
/// ```
#[derive(Debug)]
pub struct KeyframeSelector<M = StructuralSimilarity> {
    metric: M,
    threshold: f64,
    last_retained: Option<ComparisonFrame>,
    last_offered: Option<u64>,
    retained: Vec<u64>,
}

impl KeyframeSelector<StructuralSimilarity> {
    /// Selector using [`StructuralSimilarity`] and `threshold` percent.
    ///
    /// # Errors
    ///
    /// Returns [`SlideError::InvalidThreshold`] unless `threshold` is in
    /// `0.0..=100.0`.
    pub fn new(threshold: f64) -> Result<Self, SlideError> {
        Self::with_metric(StructuralSimilarity::default(), threshold)
    }
}

impl<M: SimilarityMetric> KeyframeSelector<M> {
    /// Selector using a custom similarity metric.
    ///
    /// # Errors
    ///
    /// Returns [`SlideError::InvalidThreshold`] unless `threshold` is in
    /// `0.0..=100.0`.
    pub fn with_metric(metric: M, threshold: f64) -> Result<Self, SlideError> {
        if !(0.0..=100.0).contains(&threshold) {
            return Err(SlideError::InvalidThreshold(threshold));
        }
        Ok(Self {
            metric,
            threshold,
            last_retained: None,
            last_offered: None,
            retained: Vec::new(),
        })
    }

    /// Offer the next sampled frame.
    ///
    /// # Errors
    ///
    /// Returns [`SlideError::FrameOrder`] if `candidate` does not come after
    /// the previously offered frame, or any error from the difference metric.
    pub fn consider(&mut self, candidate: ComparisonFrame) -> Result<Decision, SlideError> {
        let index = candidate.index();
        if let Some(previous) = self.last_offered {
            if index <= previous {
                return Err(SlideError::FrameOrder {
                    previous,
                    next: index,
                });
            }
        }

        let decision = match &self.last_retained {
            None => Decision::Seed,
            Some(last) => {
                let difference = difference(&self.metric, last.image(), candidate.image())?;
                if self.exceeds_threshold(difference) {
                    Decision::Retained { difference }
                } else {
                    Decision::Dropped { difference }
                }
            }
        };

        self.last_offered = Some(index);
        if decision.is_retained() {
            log::debug!(
                "Retained frame {} (difference={:?}, retained={})",
                index,
                decision.difference(),
                self.retained.len() + 1
            );
            self.retained.push(index);
            self.last_retained = Some(candidate);
        }

        Ok(decision)
    }

    /// Whether a frame `difference` percent away from the last retained
    /// frame would be retained. The comparison is strict.
    pub fn exceeds_threshold(&self, difference: f64) -> bool {
        difference > self.threshold
    }

    /// Decode indices of the retained frames, in decode order.
    pub fn retained(&self) -> &[u64] {
        &self.retained
    }

    /// Number of retained frames.
    pub fn retained_count(&self) -> usize {
        self.retained.len()
    }

    /// The last retained comparison frame, if any.
    pub fn last_retained(&self) -> Option<&ComparisonFrame> {
        self.last_retained.as_ref()
    }

    /// The metric frames are scored with.
    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// The configured threshold, in percent.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Forget all state so the next frame seeds a new selection.
    pub fn reset(&mut self) {
        self.last_retained = None;
        self.last_offered = None;
        self.retained.clear();
    }

    /// Consume the selector, returning the retained decode indices.
    pub fn into_retained(self) -> Vec<u64> {
        self.retained
    }
}
