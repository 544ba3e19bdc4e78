//! The streaming decode loop.
//!
//! [`FrameSampler`] pulls frames from a [`FrameSource`], keeps every
//! `skip_rate`-th one, normalizes it into a [`ComparisonFrame`] and offers it
//! to a [`KeyframeSelector`]. Frames the selector retains are handed to a
//! caller-supplied sink in decode order.

use crate::{
    configuration::SlideOptions,
    difference::SimilarityMetric,
    error::SlideError,
    frame::{ComparisonFrame, Frame},
    progress::{OperationType, ProgressTracker},
    selector::KeyframeSelector,
    source::FrameSource,
};

/// What a sampling pass saw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamplingSummary {
    /// Frames decoded, sampled or not.
    pub decoded_frames: u64,
    /// Decode indices offered to the selector.
    pub sampled: Vec<u64>,
    /// Decode indices the selector retained.
    pub retained: Vec<u64>,
}

/// Drives a [`FrameSource`] through a [`KeyframeSelector`].
///
/// # Example
///
/// ```no_run
/// use slidegen::{FrameSampler, KeyframeSelector, SlideOptions, VideoSource};
///
/// let options = SlideOptions::new().with_threshold(5.0).with_skip_rate(30);
/// let mut source = VideoSource::open("lecture.mp4")?;
/// let mut selector = KeyframeSelector::new(options.threshold())?;
///
/// let summary = FrameSampler::new(&options).run(&mut source, &mut selector, |frame| {
///     frame.image().save(format!("slide_{}.png", frame.index()))?;
///     Ok(())
/// })?;
/// println!("kept {} of {} sampled frames", summary.retained.len(), summary.sampled.len());
/// # Ok::<(), slidegen::SlideError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FrameSampler<'a> {
    options: &'a SlideOptions,
}

impl<'a> FrameSampler<'a> {
    /// Sampler using the skip rate, comparison size, progress callback and
    /// cancellation token from `options`.
    pub fn new(options: &'a SlideOptions) -> Self {
        Self { options }
    }

    /// Decode `source` to the end, offering every sampled frame to
    /// `selector` and passing retained frames to `on_retained`.
    ///
    /// # Errors
    ///
    /// Returns [`SlideError::InvalidSkipRate`] for a zero skip rate, the
    /// metric's error for a comparison size it cannot score (both checked
    /// before the first frame is decoded), [`SlideError::Cancelled`] if the
    /// cancellation token fires, and any error from the source, the selector
    /// or the sink.
    pub fn run<S, M, F>(
        &self,
        source: &mut S,
        selector: &mut KeyframeSelector<M>,
        mut on_retained: F,
    ) -> Result<SamplingSummary, SlideError>
    where
        S: FrameSource + ?Sized,
        M: SimilarityMetric,
        F: FnMut(Frame) -> Result<(), SlideError>,
    {
        let skip_rate = self.options.skip_rate;
        if skip_rate == 0 {
            return Err(SlideError::InvalidSkipRate);
        }
        selector.metric().validate(self.options.comparison_size)?;

        let total = source.frame_count_hint();
        log::debug!(
            "Sampling frames (skip_rate={}, threshold={}, total={:?})",
            skip_rate,
            selector.threshold(),
            total
        );

        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            OperationType::FrameSelection,
            total,
            self.options.batch_size,
        );
        let mut summary = SamplingSummary::default();
        let mut index: u64 = 0;

        loop {
            if self.options.is_cancelled() {
                return Err(SlideError::Cancelled);
            }

            if index % skip_rate != 0 {
                if !source.skip_frame()? {
                    break;
                }
                index += 1;
                continue;
            }

            let Some(image) = source.read_frame()? else {
                break;
            };
            let frame = Frame::new(index, image);
            let candidate = ComparisonFrame::from_frame(&frame, self.options.comparison_size);
            let decision = selector.consider(candidate)?;
            summary.sampled.push(index);

            if decision.is_retained() {
                summary.retained.push(index);
                on_retained(frame)?;
            }

            tracker.advance(Some(index), decision.difference(), selector.retained_count());
            index += 1;
        }

        summary.decoded_frames = index;
        log::info!(
            "Sampled {} of {} decoded frames, retained {}",
            summary.sampled.len(),
            summary.decoded_frames,
            summary.retained.len()
        );
        Ok(summary)
    }
}
