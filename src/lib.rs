//! # slidegen
//!
//! Turn a screen-recorded lecture or presentation into a slide PDF.
//!
//! `slidegen` decodes a video with FFmpeg (via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)), looks at every Nth
//! frame, drops frames that are visually near-duplicates of the last frame it
//! kept, and writes the survivors into a PDF whose pages match the frame
//! size.
//!
//! ## Quick Start
//!
//! ```no_run
//! use slidegen::{SlideOptions, generate_from_file};
//!
//! // Keep frames that differ from the previous slide by more than 5%,
//! // looking at every 30th frame.
//! let options = SlideOptions::new().with_threshold(5.0).with_skip_rate(30);
//! let report = generate_from_file("lecture.mp4", ".", &options)?;
//! println!("{} slides written to {}", report.retained.len(), report.document.display());
//! # Ok::<(), slidegen::SlideError>(())
//! ```
//!
//! ## Pipeline
//!
//! 1. [`FrameSampler`] pulls frames from a [`FrameSource`] and keeps every
//!    `skip_rate`-th one.
//! 2. Each sampled [`Frame`] is reduced to a grayscale, fixed-size
//!    [`ComparisonFrame`].
//! 3. [`KeyframeSelector`] scores it against the last retained frame with a
//!    [`SimilarityMetric`] (SSIM by default) and keeps it only if the
//!    percent difference is strictly above the threshold.
//! 4. [`ScratchStore`] persists retained frames as `0.jpg`, `1.jpg`, … in a
//!    fresh `output{n}` directory.
//! 5. [`SlideAssembler`] reads them back in numeric order and writes
//!    `output.pdf`.
//!
//! [`SlideGenerator`] runs all of the above for one source.
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://crates.io/crates/log) facade;
//! install any logger to see them. FFmpeg's own stderr output is controlled
//! separately with [`set_decoder_log_level`].
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

mod conversion;
pub mod configuration;
pub mod difference;
pub mod document;
pub mod error;
pub mod frame;
pub mod generator;
pub mod progress;
pub mod sampler;
pub mod selector;
pub mod source;
pub mod store;

pub use configuration::{
    ComparisonSize, DEFAULT_SKIP_RATE, DEFAULT_THRESHOLD, DocumentOptions, FrameFormat,
    HEADER_MARGIN, SlideOptions,
};
pub use difference::{SimilarityMetric, StructuralSimilarity};
pub use document::{DocumentSummary, SlideAssembler};
pub use error::SlideError;
pub use frame::{ComparisonFrame, Frame};
pub use generator::{DeckReport, SlideGenerator, generate_from_file};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use sampler::{FrameSampler, SamplingSummary};
pub use selector::{Decision, KeyframeSelector};
pub use source::{DecoderLogLevel, FrameSource, VideoMetadata, VideoSource, set_decoder_log_level};
pub use store::{DOCUMENT_FILE_NAME, ScratchStore};
