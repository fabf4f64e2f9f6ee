//! Owned raster frames.
//!
//! Decoders produce [`Frame`]s and the classifier consumes them. The raster
//! is an owned BGR8 buffer with no OpenCV types in the public shape, so
//! collaborator fakes can be built without native dependencies.

use crate::error::{MediaError, MediaResult};

/// One decoded video frame: packed BGR8, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Create a frame from packed BGR8 bytes (`width * height * 3` long).
    pub fn from_bgr8(width: u32, height: u32, data: Vec<u8>) -> MediaResult<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(MediaError::decode_failed(format!(
                "frame buffer is {} bytes, expected {} for {}x{} BGR8",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Packed BGR8 pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(feature = "opencv")]
mod convert {
    use opencv::core::{Mat, CV_8UC3};
    use opencv::prelude::{MatTraitConst, MatTraitConstManual};

    use super::Frame;
    use crate::error::{MediaError, MediaResult};

    impl Frame {
        /// Copy an OpenCV BGR Mat into an owned frame.
        pub fn from_mat(mat: &Mat) -> MediaResult<Self> {
            if mat.empty() {
                return Err(MediaError::decode_failed("empty frame"));
            }
            if mat.typ() != CV_8UC3 {
                return Err(MediaError::decode_failed(format!(
                    "unsupported frame type {} (expected 8-bit BGR)",
                    mat.typ()
                )));
            }

            // data_typed requires a continuous buffer
            let owned;
            let mat = if mat.is_continuous() {
                mat
            } else {
                owned = mat
                    .try_clone()
                    .map_err(|e| MediaError::decode_failed(format!("frame clone: {e}")))?;
                &owned
            };

            let data = mat
                .data_typed::<u8>()
                .map_err(|e| MediaError::decode_failed(format!("frame data: {e}")))?
                .to_vec();
            Frame::from_bgr8(mat.cols() as u32, mat.rows() as u32, data)
        }

        /// Materialize the frame as an owned OpenCV BGR Mat.
        pub fn to_mat(&self) -> MediaResult<Mat> {
            let flat = Mat::from_slice(&self.data)
                .map_err(|e| MediaError::internal(format!("frame to Mat: {e}")))?;
            let shaped = flat
                .reshape(3, self.height as i32)
                .map_err(|e| MediaError::internal(format!("frame reshape: {e}")))?;
            shaped
                .try_clone()
                .map_err(|e| MediaError::internal(format!("frame clone: {e}")))
        }
    }
}
