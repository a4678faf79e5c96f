//! Scene classifiers
//!
//! The detection core only consumes the per-frame candidate flags; bounding
//! boxes are carried along for display and logging.

use std::collections::VecDeque;
use std::path::Path;

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::geometry::arc_length;
use imageproc::morphology::{close, open};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{VideoFrame, VisionError};

/// Axis-aligned bounding box in frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn area(&self) -> u32 {
        self.width * self.height
    }
}

/// Per-frame classifier output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Detection {
    #[serde(rename = "stop")]
    pub stop_candidate: bool,
    pub stop_bbox: Option<BoundingBox>,
    #[serde(rename = "red")]
    pub red_candidate: bool,
    pub red_bbox: Option<BoundingBox>,
}

/// Visual collaborator: decides whether a stop sign or red light is in view
pub trait SceneClassifier: Send {
    fn classify(&mut self, frame: &VideoFrame) -> Result<Detection, VisionError>;
}

/// Replays pre-recorded detections, one per classified frame.
///
/// Once the script runs out every frame classifies as empty.
#[derive(Debug, Clone, Default)]
pub struct ScriptedClassifier {
    script: VecDeque<Detection>,
}

impl ScriptedClassifier {
    pub fn new(script: impl IntoIterator<Item = Detection>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// Parse a JSON-lines script; blank lines and `#` comments are skipped
    pub fn parse(text: &str) -> Result<Self, VisionError> {
        let mut script = VecDeque::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let detection: Detection = serde_json::from_str(line).map_err(|e| VisionError::Script {
                line: idx + 1,
                reason: e.to_string(),
            })?;
            script.push_back(detection);
        }
        Ok(Self { script })
    }

    pub fn from_path(path: &Path) -> Result<Self, VisionError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| VisionError::Unavailable(format!("{}: {}", path.display(), e)))?;
        let classifier = Self::parse(&text)?;
        info!("Loaded {} scripted detections from {}", classifier.remaining(), path.display());
        Ok(classifier)
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.script.is_empty()
    }
}

impl SceneClassifier for ScriptedClassifier {
    fn classify(&mut self, _frame: &VideoFrame) -> Result<Detection, VisionError> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}

/// Thresholds for the red-blob segmentation (OpenCV HSV scale: H 0..179)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedBlobConfig {
    /// Red hue bands, inclusive
    pub hue_bands: [(u8, u8); 2],
    pub min_saturation: u8,
    pub min_value: u8,
    /// Blob pixel area bounds
    pub min_area: u32,
    pub max_area: u32,
    /// Largest allowed bbox side (an LED, not a red car)
    pub max_size: u32,
    /// Mean V channel inside the bbox
    pub min_brightness: u8,
    /// 4πA/P² of the blob contour
    pub min_circularity: f64,
}

impl Default for RedBlobConfig {
    fn default() -> Self {
        Self {
            hue_bands: [(0, 10), (160, 179)],
            min_saturation: 120,
            min_value: 120,
            min_area: 1000,
            max_area: 3000,
            max_size: 80,
            min_brightness: 50,
            min_circularity: 0.3,
        }
    }
}

/// Derives the red candidate from frame pixels and delegates the stop
/// candidate to an inner classifier.
pub struct RedBlobClassifier {
    config: RedBlobConfig,
    stop: Box<dyn SceneClassifier>,
}

impl RedBlobClassifier {
    pub fn new(config: RedBlobConfig, stop: Box<dyn SceneClassifier>) -> Self {
        Self { config, stop }
    }

    fn is_red(&self, hsv: [u8; 3]) -> bool {
        let [h, s, v] = hsv;
        s >= self.config.min_saturation
            && v >= self.config.min_value
            && self.config.hue_bands.iter().any(|(lo, hi)| h >= *lo && h <= *hi)
    }

    /// Binary red mask, cleaned with a 3x3 opening then closing
    pub fn red_mask(&self, frame: &VideoFrame, hsv: &[[u8; 3]]) -> GrayImage {
        let mask = GrayImage::from_fn(frame.width, frame.height, |x, y| {
            let px = hsv[(y * frame.width + x) as usize];
            Luma([if self.is_red(px) { 255 } else { 0 }])
        });
        close(&open(&mask, Norm::LInf, 1), Norm::LInf, 1)
    }

    /// Largest external red contour passing every geometric filter
    pub fn find_blob(&self, frame: &VideoFrame) -> Option<BoundingBox> {
        let hsv: Vec<[u8; 3]> = frame.data.chunks_exact(3).map(|p| rgb_to_hsv([p[0], p[1], p[2]])).collect();
        let mask = self.red_mask(frame, &hsv);

        let contour = find_contours::<i32>(&mask)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .map(|c| (polygon_area(&c.points), c.points))
            .max_by(|a, b| a.0.total_cmp(&b.0));
        let (area, points) = contour?;

        if area < self.config.min_area as f64 || area > self.config.max_area as f64 {
            debug!("Red blob rejected: area {:.0}", area);
            return None;
        }

        let bbox = bounding_rect(&points)?;
        if bbox.width > self.config.max_size || bbox.height > self.config.max_size {
            debug!("Red blob rejected: {}x{} too large", bbox.width, bbox.height);
            return None;
        }

        let mut v_sum = 0u64;
        for y in bbox.y..bbox.y + bbox.height {
            for x in bbox.x..bbox.x + bbox.width {
                v_sum += hsv[(y * frame.width + x) as usize][2] as u64;
            }
        }
        let mean_v = v_sum / bbox.area() as u64;
        if mean_v < self.config.min_brightness as u64 {
            debug!("Red blob rejected: mean brightness {}", mean_v);
            return None;
        }

        let perimeter = arc_length(&points, true);
        let circularity = if perimeter > 0.0 {
            4.0 * std::f64::consts::PI * area / (perimeter * perimeter)
        } else {
            0.0
        };
        if circularity < self.config.min_circularity {
            debug!("Red blob rejected: circularity {:.2}", circularity);
            return None;
        }

        Some(bbox)
    }
}

/// Shoelace area of a closed contour
fn polygon_area(points: &[Point<i32>]) -> f64 {
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}

/// Smallest upright box holding every contour pixel
fn bounding_rect(points: &[Point<i32>]) -> Option<BoundingBox> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_y = points.iter().map(|p| p.y).max()?;
    Some(BoundingBox {
        x: min_x as u32,
        y: min_y as u32,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
    })
}

impl SceneClassifier for RedBlobClassifier {
    fn classify(&mut self, frame: &VideoFrame) -> Result<Detection, VisionError> {
        let mut detection = self.stop.classify(frame)?;
        let red_bbox = self.find_blob(frame);
        detection.red_candidate = red_bbox.is_some();
        detection.red_bbox = red_bbox;
        Ok(detection)
    }
}

/// RGB to HSV on the OpenCV 8-bit scale (H 0..179, S and V 0..255)
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(|c| c as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max == 0.0 { 0.0 } else { 255.0 * delta / max };
    let mut h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    [(h / 2.0).round().min(179.0) as u8, s.round() as u8, max as u8]
}
