//! Frame sources

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use tracing::{debug, info};

use crate::{CaptureConfig, VideoFrame, VisionError};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Blocking producer of video frames.
///
/// `Ok(None)` marks the end of the stream. The source is owned by the capture
/// thread and released when that thread exits.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, VisionError>;
}

/// Replays a directory of recorded frames in file-name order
pub struct ImageDirSource {
    files: Vec<PathBuf>,
    position: usize,
    sequence: u64,
    width: u32,
    height: u32,
    looping: bool,
}

impl ImageDirSource {
    /// Open a frame directory; fails if it is missing or holds no images
    pub fn open(dir: &Path, config: &CaptureConfig, looping: bool) -> Result<Self, VisionError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| VisionError::Unavailable(format!("{}: {}", dir.display(), e)))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(VisionError::Unavailable(format!(
                "{}: no frames found",
                dir.display()
            )));
        }

        info!("Opened frame directory {} ({} frames)", dir.display(), files.len());

        Ok(Self {
            files,
            position: 0,
            sequence: 0,
            width: config.width,
            height: config.height,
            looping,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.files.len()
    }
}

impl FrameSource for ImageDirSource {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, VisionError> {
        if self.position >= self.files.len() {
            if !self.looping {
                return Ok(None);
            }
            debug!("Frame directory exhausted, looping");
            self.position = 0;
        }

        let path = &self.files[self.position];
        self.position += 1;

        let img = image::open(path)
            .map_err(|e| VisionError::Decode {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
            .to_rgb8();

        let img = if img.dimensions() != (self.width, self.height) {
            image::imageops::resize(&img, self.width, self.height, FilterType::Triangle)
        } else {
            img
        };

        let frame = VideoFrame::from_rgb_image(img, self.sequence);
        self.sequence += 1;
        Ok(Some(frame))
    }
}
