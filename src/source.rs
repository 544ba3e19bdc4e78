//! Sequential frame sources.
//!
//! The sampler pulls frames through the [`FrameSource`] trait, one at a
//! time in presentation order. [`VideoSource`] is the FFmpeg-backed
//! implementation; tests and embedders can supply their own.
//!
//! # Example
//!
//! ```no_run
//! use slidegen::{FrameSource, VideoSource};
//!
//! let mut source = VideoSource::open("lecture.mp4")?;
//! println!("{:?} frames", source.frame_count_hint());
//! while let Some(image) = source.read_frame()? {
//!     println!("{}x{}", image.width(), image.height());
//! }
//! # Ok::<(), slidegen::SlideError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::log::Level,
};
use image::{DynamicImage, RgbImage};

use crate::{conversion, error::SlideError};

/// A source of decoded frames in presentation order.
///
/// End of stream is signalled by `Ok(None)` / `Ok(false)`, never by an
/// error.
pub trait FrameSource {
    /// Total number of frames, if the source can tell. Used for progress
    /// reporting only.
    fn frame_count_hint(&self) -> Option<u64>;

    /// Decode the next frame and return it.
    fn read_frame(&mut self) -> Result<Option<DynamicImage>, SlideError>;

    /// Decode the next frame without returning it. Returns `false` at end of
    /// stream. Implementations may skip pixel conversion here.
    fn skip_frame(&mut self) -> Result<bool, SlideError> {
        Ok(self.read_frame()?.is_some())
    }
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn frame_count_hint(&self) -> Option<u64> {
        (**self).frame_count_hint()
    }

    fn read_frame(&mut self) -> Result<Option<DynamicImage>, SlideError> {
        (**self).read_frame()
    }

    fn skip_frame(&mut self) -> Result<bool, SlideError> {
        (**self).skip_frame()
    }
}

/// Properties of the decoded video stream, read when the file is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frame rate; 0.0 when the container does not report one.
    pub frames_per_second: f64,
    /// Frame count from the stream header, or estimated from duration and
    /// frame rate. 0 when neither is known.
    pub frame_count: u64,
    /// Stream duration.
    pub duration: Duration,
    /// Codec name, e.g. `"h264"`.
    pub codec: String,
}

/// FFmpeg verbosity for the decoder's own stderr output.
///
/// This does not affect the `log` crate messages emitted by `slidegen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderLogLevel {
    /// Print nothing.
    Quiet,
    /// Only unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings; FFmpeg's default.
    Warning,
    /// Informational messages.
    Info,
    /// Debugging messages.
    Debug,
}

impl DecoderLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            DecoderLogLevel::Quiet => Level::Quiet,
            DecoderLogLevel::Fatal => Level::Fatal,
            DecoderLogLevel::Error => Level::Error,
            DecoderLogLevel::Warning => Level::Warning,
            DecoderLogLevel::Info => Level::Info,
            DecoderLogLevel::Debug => Level::Debug,
        }
    }
}

/// Set FFmpeg's internal log level.
pub fn set_decoder_log_level(level: DecoderLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// Frames decoded from a video file with FFmpeg.
///
/// Packets are read and decoded sequentially; every decoded frame counts,
/// so frame `i` is the `i`-th frame in presentation order regardless of
/// timestamps. Sampled frames are converted to RGB; skipped frames are
/// decoded but never converted.
pub struct VideoSource {
    input_context: Input,
    decoder: VideoDecoder,
    video_stream_index: usize,
    metadata: VideoMetadata,
    path: PathBuf,
    /// Scaler plus the `(format, width, height)` it was built for.
    scaler: Option<(ScalingContext, (Pixel, u32, u32))>,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    eof_sent: bool,
    done: bool,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("path", &self.path)
            .field("video_stream_index", &self.video_stream_index)
            .field("metadata", &self.metadata)
            .field("eof_sent", &self.eof_sent)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a video file and prepare its best video stream for decoding.
    ///
    /// # Errors
    ///
    /// Returns [`SlideError::FileOpen`] if the file cannot be opened or its
    /// decoder cannot be created, and [`SlideError::NoVideoStream`] if it has
    /// no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SlideError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening video file: {}", path.display());

        let open_error = |reason: String| SlideError::FileOpen {
            path: path.clone(),
            reason,
        };

        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;
        let container_duration = input_context.duration();

        let (video_stream_index, decoder, frames_per_second, duration, header_frames) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or(SlideError::NoVideoStream)?;

            let decoder_context = CodecContext::from_parameters(stream.parameters())
                .map_err(|error| {
                    open_error(format!("Failed to read video codec parameters: {error}"))
                })?;
            let decoder = decoder_context.decoder().video().map_err(|error| {
                open_error(format!("Failed to create video decoder: {error}"))
            })?;

            let frames_per_second = conversion::positive_rate(stream.avg_frame_rate())
                .or_else(|| conversion::positive_rate(stream.rate()))
                .unwrap_or(0.0);
            let duration = conversion::stream_duration(stream.duration(), stream.time_base())
                .or_else(|| {
                    (container_duration > 0)
                        .then(|| Duration::from_micros(container_duration as u64))
                })
                .unwrap_or(Duration::ZERO);

            (
                stream.index(),
                decoder,
                frames_per_second,
                duration,
                stream.frames(),
            )
        };

        let frame_count = if header_frames > 0 {
            header_frames as u64
        } else {
            conversion::estimate_frame_count(duration, frames_per_second)
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            duration,
            codec,
        };

        log::info!(
            "Opened {} ({}x{} @ {:.2} fps, ~{} frames, {})",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec,
        );

        Ok(Self {
            input_context,
            decoder,
            video_stream_index,
            metadata,
            path,
            scaler: None,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            eof_sent: false,
            done: false,
        })
    }

    /// Stream properties read at open time.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Advance the decoder until `decoded_frame` holds the next frame.
    /// Returns `false` once the stream is exhausted.
    fn decode_next(&mut self) -> Result<bool, SlideError> {
        if self.done {
            return Ok(false);
        }

        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                return Ok(true);
            }

            if self.eof_sent {
                self.done = true;
                return Ok(false);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        self.decoder.send_packet(&packet)?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    log::debug!("Skipping unreadable packet: {error}");
                }
            }
        }
    }

    /// Convert the current `decoded_frame` to an RGB image.
    fn convert_current_frame(&mut self) -> Result<DynamicImage, SlideError> {
        let key = (
            self.decoded_frame.format(),
            self.decoded_frame.width(),
            self.decoded_frame.height(),
        );

        if self.scaler.as_ref().is_none_or(|(_, built_for)| *built_for != key) {
            let (format, width, height) = key;
            let scaler = ScalingContext::get(
                format,
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?;
            self.scaler = Some((scaler, key));
        }

        if let Some((scaler, _)) = self.scaler.as_mut() {
            scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;
        }

        let (_, width, height) = key;
        let buffer = conversion::frame_to_buffer(&self.rgb_frame, width, height, 3);
        let image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            SlideError::VideoDecode(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })?;
        Ok(DynamicImage::ImageRgb8(image))
    }
}

impl FrameSource for VideoSource {
    fn frame_count_hint(&self) -> Option<u64> {
        (self.metadata.frame_count > 0).then_some(self.metadata.frame_count)
    }

    fn read_frame(&mut self) -> Result<Option<DynamicImage>, SlideError> {
        if !self.decode_next()? {
            return Ok(None);
        }
        self.convert_current_frame().map(Some)
    }

    fn skip_frame(&mut self) -> Result<bool, SlideError> {
        self.decode_next()
    }
}
