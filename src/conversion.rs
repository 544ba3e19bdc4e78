//! Internal conversion helpers.
//!
//! Pixel-data copying and frame-rate arithmetic shared by the FFmpeg-backed
//! [`VideoSource`](crate::VideoSource).

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy the first plane of a packed FFmpeg frame into a tightly-packed
/// buffer, dropping any per-row stride padding.
///
/// `bytes_per_pixel` is 3 for RGB24.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_length = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_length {
        data[..row_length * (height as usize)].to_vec()
    } else {
        data.chunks(stride)
            .take(height as usize)
            .flat_map(|row| &row[..row_length])
            .copied()
            .collect()
    }
}

/// Value of a rational, or `None` if it is undefined or not positive.
pub(crate) fn positive_rate(rate: Rational) -> Option<f64> {
    if rate.denominator() == 0 || rate.numerator() <= 0 {
        return None;
    }
    Some(f64::from(rate.numerator()) / f64::from(rate.denominator()))
}

/// Convert a duration expressed in `time_base` units to a [`Duration`].
pub(crate) fn stream_duration(duration: i64, time_base: Rational) -> Option<Duration> {
    if time_base.denominator() == 0 {
        return None;
    }
    let seconds = duration as f64 * f64::from(time_base.numerator())
        / f64::from(time_base.denominator());
    (seconds > 0.0).then(|| Duration::from_secs_f64(seconds))
}

/// Estimate how many frames a stream of `duration` at `frames_per_second`
/// holds.
pub(crate) fn estimate_frame_count(duration: Duration, frames_per_second: f64) -> u64 {
    if frames_per_second <= 0.0 {
        return 0;
    }
    (duration.as_secs_f64() * frames_per_second).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_rate_rejects_undefined() {
        assert_eq!(positive_rate(Rational::new(30, 1)), Some(30.0));
        assert_eq!(positive_rate(Rational::new(30, 0)), None);
        assert_eq!(positive_rate(Rational::new(0, 1)), None);
    }

    #[test]
    fn estimate_frame_count_rounds() {
        assert_eq!(estimate_frame_count(Duration::from_millis(3_333), 30.0), 100);
        assert_eq!(estimate_frame_count(Duration::from_secs(10), 0.0), 0);
    }

    #[test]
    fn stream_duration_uses_time_base() {
        let duration = stream_duration(90_000, Rational::new(1, 90_000)).unwrap();
        assert_eq!(duration, Duration::from_secs(1));
        assert!(stream_duration(0, Rational::new(1, 90_000)).is_none());
    }
}
