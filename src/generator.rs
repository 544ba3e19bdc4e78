//! End-to-end slide generation.
//!
//! [`SlideGenerator`] wires the stages of one run together: frames are
//! sampled and selected, every retained frame is persisted to the
//! [`ScratchStore`] as soon as it is retained, and the persisted frames are
//! read back and assembled into the store's document.
//!
//! # Example
//!
//! ```no_run
//! use slidegen::{SlideOptions, generate_from_file};
//!
//! let options = SlideOptions::new().with_threshold(5.0).with_skip_rate(30);
//! let report = generate_from_file("lecture.mp4", ".", &options)?;
//! println!("{} slides in {}", report.retained.len(), report.document.display());
//! # Ok::<(), slidegen::SlideError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::{
    configuration::SlideOptions,
    difference::{SimilarityMetric, StructuralSimilarity},
    document::SlideAssembler,
    error::SlideError,
    sampler::FrameSampler,
    selector::KeyframeSelector,
    source::{FrameSource, VideoSource},
    store::{DEFAULT_PREFIX, ScratchStore},
};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckReport {
    /// Directory holding the persisted frames and the document.
    pub directory: PathBuf,
    /// Path of the assembled PDF.
    pub document: PathBuf,
    /// Decode indices of the retained frames, one per page.
    pub retained: Vec<u64>,
    /// Frames decoded in total.
    pub decoded_frames: u64,
    /// Frames offered to the selector.
    pub sampled_frames: u64,
    /// Page width in points.
    pub page_width: u32,
    /// Page height in points, margin included.
    pub page_height: u32,
}

/// Runs the full frame-selection pipeline for one video.
#[derive(Debug, Clone)]
pub struct SlideGenerator<M = StructuralSimilarity> {
    options: SlideOptions,
    metric: M,
}

impl SlideGenerator<StructuralSimilarity> {
    /// Generator scoring frames with [`StructuralSimilarity`].
    pub fn new(options: SlideOptions) -> Self {
        Self::with_metric(options, StructuralSimilarity::default())
    }
}

impl<M: SimilarityMetric + Clone> SlideGenerator<M> {
    /// Generator scoring frames with a custom metric.
    pub fn with_metric(options: SlideOptions, metric: M) -> Self {
        Self { options, metric }
    }

    /// The options this generator runs with.
    pub fn options(&self) -> &SlideOptions {
        &self.options
    }

    /// Select keyframes from `source`, persist them into `store` and
    /// assemble `store.document_path()`. Frames are written in the store's
    /// [`FrameFormat`](crate::FrameFormat).
    ///
    /// # Errors
    ///
    /// Returns [`SlideError::EmptySelection`] if no frame was retained (the
    /// source was empty), [`SlideError::InvalidThreshold`] or
    /// [`SlideError::InvalidSkipRate`] for bad options, and any decode, I/O,
    /// image or document error. Frames persisted before a failure stay on
    /// disk.
    pub fn run<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        mut store: ScratchStore,
    ) -> Result<DeckReport, SlideError> {
        let mut selector =
            KeyframeSelector::with_metric(self.metric.clone(), self.options.threshold)?;
        let summary = FrameSampler::new(&self.options)
            .run(source, &mut selector, |frame| store.persist(frame).map(|_| ()))?;

        if summary.retained.is_empty() {
            log::info!(
                "No frames retained after decoding {} frames",
                summary.decoded_frames
            );
            return Err(SlideError::EmptySelection);
        }

        // Older files in a reused directory sort after the ones just written.
        let mut frames = store.frame_paths()?;
        frames.truncate(store.persisted());
        let document_path = store.document_path();
        let document = SlideAssembler::new(self.options.document.clone())
            .assemble_files(&frames, &document_path)?;

        Ok(DeckReport {
            directory: store.directory().to_path_buf(),
            document: document_path,
            retained: summary.retained,
            decoded_frames: summary.decoded_frames,
            sampled_frames: summary.sampled.len() as u64,
            page_width: document.page_width,
            page_height: document.page_height,
        })
    }
}

/// Open `video`, write into the next free `output{n}` directory under
/// `base_directory`, and run a [`SlideGenerator`] with `options`.
///
/// # Errors
///
/// See [`VideoSource::open`] and [`SlideGenerator::run`].
pub fn generate_from_file<P, B>(
    video: P,
    base_directory: B,
    options: &SlideOptions,
) -> Result<DeckReport, SlideError>
where
    P: AsRef<Path>,
    B: AsRef<Path>,
{
    let mut source = VideoSource::open(video)?;
    let store = ScratchStore::next_available(base_directory, DEFAULT_PREFIX)
        .with_format(options.frame_format);
    SlideGenerator::new(options.clone()).run(&mut source, store)
}
