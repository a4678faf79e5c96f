//! Live camera source
//!
//! Opened by device index through OpenCV when the `camera` feature is
//! enabled. Without it, opening reports the camera as unavailable.

use crate::{CaptureConfig, FrameSource, VideoFrame, VisionError};

#[cfg(feature = "camera")]
pub use device::CameraSource;
#[cfg(not(feature = "camera"))]
pub use disabled::CameraSource;

#[cfg(feature = "camera")]
mod device {
    use opencv::{
        core::{Mat, Size},
        imgproc,
        prelude::*,
        videoio::{self, VideoCapture},
    };
    use tracing::{info, warn};

    use super::*;

    /// V4L / platform camera read through OpenCV
    pub struct CameraSource {
        index: i32,
        cap: VideoCapture,
        width: u32,
        height: u32,
        sequence: u64,
    }

    impl CameraSource {
        /// Acquire the camera; failure to open it is fatal for the caller
        pub fn open(index: i32, config: &CaptureConfig) -> Result<Self, VisionError> {
            let unavailable = |e: opencv::Error| VisionError::Unavailable(format!("camera {}: {}", index, e));

            let mut cap = VideoCapture::new(index, videoio::CAP_ANY).map_err(unavailable)?;
            if !cap.is_opened().map_err(unavailable)? {
                return Err(VisionError::Unavailable(format!("camera {} could not be opened", index)));
            }

            // Requested size is a hint; frames are resized anyway
            if let Err(e) = cap
                .set(videoio::CAP_PROP_FRAME_WIDTH, config.width as f64)
                .and_then(|_| cap.set(videoio::CAP_PROP_FRAME_HEIGHT, config.height as f64))
            {
                warn!("Camera {} rejected frame size: {}", index, e);
            }

            info!("Opened camera {} ({}x{})", index, config.width, config.height);
            Ok(Self {
                index,
                cap,
                width: config.width,
                height: config.height,
                sequence: 0,
            })
        }

        fn convert(&self, bgr: &Mat) -> opencv::Result<Vec<u8>> {
            let mut sized = Mat::default();
            let source = if bgr.cols() as u32 != self.width || bgr.rows() as u32 != self.height {
                imgproc::resize(
                    bgr,
                    &mut sized,
                    Size::new(self.width as i32, self.height as i32),
                    0.0,
                    0.0,
                    imgproc::INTER_LINEAR,
                )?;
                &sized
            } else {
                bgr
            };

            let mut rgb = Mat::default();
            imgproc::cvt_color(source, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;
            Ok(rgb.data_bytes()?.to_vec())
        }
    }

    impl FrameSource for CameraSource {
        fn next_frame(&mut self) -> Result<Option<VideoFrame>, VisionError> {
            let index = self.index;
            let read = move |e: opencv::Error| VisionError::Read(format!("camera {}: {}", index, e));

            let mut mat = Mat::default();
            if !self.cap.read(&mut mat).map_err(read)? || mat.empty() {
                return Err(VisionError::Read(format!("camera {} returned no frame", index)));
            }

            let data = self.convert(&mat).map_err(read)?;
            let frame = VideoFrame::new(data, self.width, self.height, self.sequence);
            self.sequence += 1;
            Ok(Some(frame))
        }
    }

    impl Drop for CameraSource {
        fn drop(&mut self) {
            if let Err(e) = self.cap.release() {
                warn!("Failed to release camera {}: {}", self.index, e);
            } else {
                info!("Released camera {}", self.index);
            }
        }
    }
}

#[cfg(not(feature = "camera"))]
mod disabled {
    use std::convert::Infallible;

    use super::*;

    /// Placeholder when built without camera support; cannot be constructed
    pub struct CameraSource {
        never: Infallible,
    }

    impl CameraSource {
        pub fn open(index: i32, _config: &CaptureConfig) -> Result<Self, VisionError> {
            Err(VisionError::Unavailable(format!(
                "camera {}: built without the `camera` feature",
                index
            )))
        }
    }

    impl FrameSource for CameraSource {
        fn next_frame(&mut self) -> Result<Option<VideoFrame>, VisionError> {
            match self.never {}
        }
    }
}
