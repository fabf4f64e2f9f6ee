//! Video frame sources.
//!
//! A [`FrameSource`] is an opened decoder: it reports a frame rate and
//! yields frames until end of stream. A [`VideoOpener`] turns a path into a
//! source and is the seam where tests inject fakes.

use std::path::Path;

use crate::error::MediaResult;
use crate::frame::Frame;

/// Sequential, non-restartable frame stream bound to one opened video.
///
/// Implementations release the underlying decoder handle on drop.
pub trait FrameSource {
    /// Decoder-reported frames per second; `0.0` when unavailable.
    fn frame_rate(&self) -> f64;

    /// Read the next frame, or `Ok(None)` at end of stream.
    fn read_frame(&mut self) -> MediaResult<Option<Frame>>;
}

impl FrameSource for Box<dyn FrameSource> {
    fn frame_rate(&self) -> f64 {
        (**self).frame_rate()
    }

    fn read_frame(&mut self) -> MediaResult<Option<Frame>> {
        (**self).read_frame()
    }
}

/// Opens video files into frame sources.
pub trait VideoOpener: Send + Sync {
    /// Open a video file for sequential decoding.
    ///
    /// Fails when the decoder cannot open the file; callers check for
    /// existence beforehand so a missing path never reaches the decoder.
    fn open(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>>;
}

#[cfg(feature = "opencv")]
pub use opencv_impl::{OpenCvFrameSource, OpenCvOpener};

#[cfg(feature = "opencv")]
mod opencv_impl {
    use std::path::Path;

    use opencv::core::Mat;
    use opencv::prelude::{VideoCaptureTrait, VideoCaptureTraitConst};
    use opencv::videoio::{self, VideoCapture};
    use tracing::debug;

    use super::{FrameSource, VideoOpener};
    use crate::error::{MediaError, MediaResult};
    use crate::frame::Frame;

    /// Opens videos with OpenCV's VideoCapture.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct OpenCvOpener;

    impl VideoOpener for OpenCvOpener {
        fn open(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>> {
            let path_str = path
                .to_str()
                .ok_or_else(|| MediaError::open_failed(path))?;

            let cap = VideoCapture::from_file(path_str, videoio::CAP_ANY)
                .map_err(|_| MediaError::open_failed(path))?;
            if !cap.is_opened().unwrap_or(false) {
                // VideoCapture's drop releases whatever was partially acquired
                return Err(MediaError::open_failed(path));
            }

            let fps = cap.get(videoio::CAP_PROP_FPS).unwrap_or(0.0);
            debug!(video = %path.display(), fps, "opened video");

            Ok(Box::new(OpenCvFrameSource { cap, fps }))
        }
    }

    /// Frame stream over an opened VideoCapture handle.
    pub struct OpenCvFrameSource {
        cap: VideoCapture,
        fps: f64,
    }

    impl FrameSource for OpenCvFrameSource {
        fn frame_rate(&self) -> f64 {
            self.fps
        }

        fn read_frame(&mut self) -> MediaResult<Option<Frame>> {
            let mut mat = Mat::default();
            let grabbed = self
                .cap
                .read(&mut mat)
                .map_err(|e| MediaError::decode_failed(e.to_string()))?;
            if !grabbed || mat.empty() {
                return Ok(None);
            }
            Frame::from_mat(&mat).map(Some)
        }
    }

    impl Drop for OpenCvFrameSource {
        fn drop(&mut self) {
            let _ = self.cap.release();
        }
    }
}
