//! Run configuration.
//!
//! [`SlideOptions`] is a builder that threads the selection parameters,
//! progress callbacks and cancellation tokens through a run without
//! polluting every function signature. [`DocumentOptions`] controls the
//! page layout of the assembled PDF.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use slidegen::{CancellationToken, ProgressCallback, ProgressInfo, SlideOptions};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("frame {:?}: {} retained", info.current_frame, info.retained);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = SlideOptions::new()
//!     .with_threshold(5.0)
//!     .with_skip_rate(30)
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone());
//! ```

use std::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    str::FromStr,
    sync::Arc,
};

use image::ImageFormat;

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Default minimum percent difference for a frame to be retained.
pub const DEFAULT_THRESHOLD: f64 = 5.0;

/// Default sampling interval.
pub const DEFAULT_SKIP_RATE: u64 = 30;

/// Margin reserved above every frame when a page header is drawn.
pub const HEADER_MARGIN: u32 = 40;

/// Resolution frames are normalized to before they are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ComparisonSize {
    /// Create a comparison size. Zero dimensions are clamped to 1.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }
}

impl Default for ComparisonSize {
    fn default() -> Self {
        Self {
            width: 720,
            height: 480,
        }
    }
}

impl Display for ComparisonSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for ComparisonSize {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (width, height) = value
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
        let width: u32 = width
            .parse()
            .map_err(|_| format!("invalid width in {value:?}"))?;
        let height: u32 = height
            .parse()
            .map_err(|_| format!("invalid height in {value:?}"))?;
        if width == 0 || height == 0 {
            return Err(format!("dimensions must be non-zero, got {value:?}"));
        }
        Ok(Self { width, height })
    }
}

/// Image format used for persisted frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameFormat {
    /// Baseline JPEG, `.jpg`. This is the default.
    #[default]
    Jpeg,
    /// Lossless PNG, `.png`.
    Png,
}

impl FrameFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            FrameFormat::Jpeg => "jpg",
            FrameFormat::Png => "png",
        }
    }

    pub(crate) fn image_format(self) -> ImageFormat {
        match self {
            FrameFormat::Jpeg => ImageFormat::Jpeg,
            FrameFormat::Png => ImageFormat::Png,
        }
    }
}

impl FromStr for FrameFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(FrameFormat::Jpeg),
            "png" => Ok(FrameFormat::Png),
            other => Err(format!("unsupported frame format: {other} (jpg|png)")),
        }
    }
}

/// Page layout of the assembled document.
///
/// Without a header every page is exactly the size of the first retained
/// frame. With a header, [`HEADER_MARGIN`] points are added above the frame
/// unless a different margin is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentOptions {
    pub(crate) header: Option<String>,
    pub(crate) margin: Option<u32>,
}

impl DocumentOptions {
    /// Plain pages with no header and no margin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw `text` at the top of every page.
    #[must_use]
    pub fn with_header(mut self, text: impl Into<String>) -> Self {
        self.header = Some(text.into());
        self
    }

    /// Override the margin reserved above each frame, in points.
    #[must_use]
    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = Some(margin);
        self
    }

    /// Header text, if any.
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// Effective margin: the explicit one, else [`HEADER_MARGIN`] with a
    /// header, else 0.
    pub fn margin(&self) -> u32 {
        match (self.margin, &self.header) {
            (Some(margin), _) => margin,
            (None, Some(_)) => HEADER_MARGIN,
            (None, None) => 0,
        }
    }
}

/// Configuration for a slide generation run.
///
/// All fields have defaults: threshold [`DEFAULT_THRESHOLD`], skip rate
/// [`DEFAULT_SKIP_RATE`], 720x480 comparison frames, JPEG frames, plain
/// pages, no progress callback and no cancellation.
#[derive(Clone)]
pub struct SlideOptions {
    pub(crate) threshold: f64,
    pub(crate) skip_rate: u64,
    pub(crate) comparison_size: ComparisonSize,
    pub(crate) frame_format: FrameFormat,
    pub(crate) document: DocumentOptions,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N sampled frames).
    pub(crate) batch_size: u64,
}

impl Debug for SlideOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SlideOptions")
            .field("threshold", &self.threshold)
            .field("skip_rate", &self.skip_rate)
            .field("comparison_size", &self.comparison_size)
            .field("frame_format", &self.frame_format)
            .field("document", &self.document)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for SlideOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideOptions {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            skip_rate: DEFAULT_SKIP_RATE,
            comparison_size: ComparisonSize::default(),
            frame_format: FrameFormat::default(),
            document: DocumentOptions::default(),
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Minimum percent difference (exclusive) from the last retained frame
    /// required to retain a new one. Validated when the run starts.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Evaluate every `skip_rate`-th decoded frame. Zero is rejected when
    /// the run starts.
    #[must_use]
    pub fn with_skip_rate(mut self, skip_rate: u64) -> Self {
        self.skip_rate = skip_rate;
        self
    }

    /// Resolution frames are normalized to before comparison.
    #[must_use]
    pub fn with_comparison_size(mut self, size: ComparisonSize) -> Self {
        self.comparison_size = size;
        self
    }

    /// Image format for persisted frames.
    #[must_use]
    pub fn with_frame_format(mut self, format: FrameFormat) -> Self {
        self.frame_format = format;
        self
    }

    /// Page layout of the assembled document.
    #[must_use]
    pub fn with_document(mut self, document: DocumentOptions) -> Self {
        self.document = document;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, sampling stops before the next frame and
    /// the run returns [`SlideError::Cancelled`](crate::SlideError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires, in sampled frames.
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// The configured threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The configured skip rate.
    pub fn skip_rate(&self) -> u64 {
        self.skip_rate
    }

    /// The configured comparison size.
    pub fn comparison_size(&self) -> ComparisonSize {
        self.comparison_size
    }

    /// The configured frame format.
    pub fn frame_format(&self) -> FrameFormat {
        self.frame_format
    }

    /// The configured document layout.
    pub fn document(&self) -> &DocumentOptions {
        &self.document
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
