//! Per-second frame sampling.
//!
//! One frame is selected per approximately one second of video: with stride
//! `S` derived from the frame rate, frames 0, S, 2S, ... are sampled and
//! attributed to seconds 0, 1, 2, ... The stride truncates the reported
//! rate to an integer, so non-integer rates (29.97) drift slightly; that
//! matches the timing model consumers already depend on.

use tracing::warn;

use crate::frame::Frame;
use crate::source::FrameSource;

/// Substitute rate when the decoder reports no frame rate.
pub const DEFAULT_FPS: f64 = 30.0;

/// Sampling stride for a reported frame rate.
///
/// Zero, negative and non-finite rates take the 30 fps default; the stride
/// never drops below 1 so sub-1fps streams sample every frame.
pub fn stride_for_fps(fps: f64) -> u64 {
    let fps = if fps.is_finite() && fps > 0.0 {
        fps
    } else {
        DEFAULT_FPS
    };
    (fps as u64).max(1)
}

/// Streaming sampler yielding `(second, frame)` pairs from a frame source.
pub struct SecondSampler<S> {
    source: S,
    stride: u64,
    frame_count: u64,
}

impl<S: FrameSource> SecondSampler<S> {
    /// Wrap a source, deriving the stride from its reported frame rate.
    pub fn new(source: S) -> Self {
        let stride = stride_for_fps(source.frame_rate());
        Self {
            source,
            stride,
            frame_count: 0,
        }
    }

    /// The derived sampling stride in frames.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Advance to the next sampled frame.
    ///
    /// Returns `None` at end of stream; a read failure also ends the
    /// sequence (everything sampled so far stands).
    pub fn next_sample(&mut self) -> Option<(u64, Frame)> {
        loop {
            let frame = match self.source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => return None,
                Err(e) => {
                    warn!(frame = self.frame_count, error = %e, "frame read failed, ending stream");
                    return None;
                }
            };
            let index = self.frame_count;
            self.frame_count += 1;
            if index % self.stride == 0 {
                return Some((index / self.stride, frame));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MediaError, MediaResult};

    struct StubSource {
        fps: f64,
        remaining: usize,
        fail_at: Option<usize>,
        reads: usize,
    }

    impl StubSource {
        fn new(fps: f64, frames: usize) -> Self {
            Self {
                fps,
                remaining: frames,
                fail_at: None,
                reads: 0,
            }
        }
    }

    impl FrameSource for StubSource {
        fn frame_rate(&self) -> f64 {
            self.fps
        }

        fn read_frame(&mut self) -> MediaResult<Option<Frame>> {
            if self.fail_at == Some(self.reads) {
                return Err(MediaError::decode_failed("stub read failure"));
            }
            self.reads += 1;
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(Frame::from_bgr8(2, 2, vec![0u8; 12]).unwrap()))
        }
    }

    fn collect_seconds(sampler: &mut SecondSampler<StubSource>) -> Vec<u64> {
        let mut seconds = Vec::new();
        while let Some((second, _)) = sampler.next_sample() {
            seconds.push(second);
        }
        seconds
    }

    #[test]
    fn test_stride_for_fps() {
        assert_eq!(stride_for_fps(30.0), 30);
        assert_eq!(stride_for_fps(29.97), 29);
        assert_eq!(stride_for_fps(0.0), 30);
        assert_eq!(stride_for_fps(-5.0), 30);
        assert_eq!(stride_for_fps(f64::NAN), 30);
        assert_eq!(stride_for_fps(0.5), 1);
    }

    #[test]
    fn test_sample_count_is_ceil_n_over_s() {
        // 90 frames at 30fps: samples at 0, 30, 60
        let mut sampler = SecondSampler::new(StubSource::new(30.0, 90));
        assert_eq!(sampler.stride(), 30);
        assert_eq!(collect_seconds(&mut sampler), vec![0, 1, 2]);

        // 91 frames: one extra sample at frame 90
        let mut sampler = SecondSampler::new(StubSource::new(30.0, 91));
        assert_eq!(collect_seconds(&mut sampler), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_seconds_are_unique_and_increasing() {
        let mut sampler = SecondSampler::new(StubSource::new(10.0, 47));
        let seconds = collect_seconds(&mut sampler);
        assert_eq!(seconds, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_zero_fps_uses_default_stride() {
        let mut sampler = SecondSampler::new(StubSource::new(0.0, 60));
        assert_eq!(sampler.stride(), 30);
        assert_eq!(collect_seconds(&mut sampler), vec![0, 1]);
    }

    #[test]
    fn test_sub_one_fps_samples_every_frame() {
        let mut sampler = SecondSampler::new(StubSource::new(0.5, 4));
        assert_eq!(sampler.stride(), 1);
        assert_eq!(collect_seconds(&mut sampler), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_read_failure_ends_stream() {
        let mut source = StubSource::new(2.0, 10);
        source.fail_at = Some(5);
        let mut sampler = SecondSampler::new(source);
        // Frames 0..5 read fine; samples at 0, 2, 4 then the failure stops it.
        assert_eq!(collect_seconds(&mut sampler), vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_stream_yields_nothing() {
        let mut sampler = SecondSampler::new(StubSource::new(30.0, 0));
        assert!(sampler.next_sample().is_none());
    }
}
