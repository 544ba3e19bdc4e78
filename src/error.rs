//! Error types for the `slidegen` crate.
//!
//! This module defines [`SlideError`], the unified error type returned by all
//! fallible operations in the crate. Variants carry the paths, indices and
//! shapes involved so a failed run can be diagnosed from the message alone.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `slidegen` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SlideError {
    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded or converted.
    #[error("Failed to decode video frame: {0}")]
    VideoDecode(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// A skip rate of zero was provided.
    #[error("Skip rate must be greater than zero")]
    InvalidSkipRate,

    /// The difference threshold is not a percentage.
    #[error("Difference threshold must be within 0..=100, got {0}")]
    InvalidThreshold(f64),

    /// The similarity metric cannot score the given images.
    #[error("Invalid comparison: {0}")]
    InvalidComparison(String),

    /// Two comparison frames with different shapes were compared.
    #[error("Cannot compare a {}x{} frame with a {}x{} frame", left.0, left.1, right.0, right.1)]
    DimensionMismatch {
        /// `(width, height)` of the first image.
        left: (u32, u32),
        /// `(width, height)` of the second image.
        right: (u32, u32),
    },

    /// A frame was offered to the selector out of decode order.
    #[error("Frame {next} offered after frame {previous}; frames must arrive in decode order")]
    FrameOrder {
        /// Index of the previously offered frame.
        previous: u64,
        /// Index of the offending frame.
        next: u64,
    },

    /// The frame height plus the header margin does not fit a page.
    #[error("Page height overflows: frame height {height} plus margin {margin}")]
    PageOverflow {
        /// Height of the first frame in pixels.
        height: u32,
        /// Configured margin in points.
        margin: u32,
    },

    /// No frame was retained, so there is nothing to assemble.
    #[error("No frames were retained; nothing to assemble")]
    EmptySelection,

    /// The run was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate while encoding or decoding a frame.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),

    /// The PDF document could not be built or written.
    #[error("Document error: {0}")]
    Document(#[from] lopdf::Error),
}

impl From<FfmpegError> for SlideError {
    fn from(error: FfmpegError) -> Self {
        SlideError::Ffmpeg(error.to_string())
    }
}
