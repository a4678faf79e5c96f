//! Video frame type

use image::RgbImage;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Frame sequence number
    pub sequence: u64,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            data,
            width,
            height,
            sequence,
        }
    }

    /// Solid-colour frame, mostly for tests and simulation
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], sequence: u64) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Self::new(data, width, height, sequence)
    }

    pub fn from_rgb_image(img: RgbImage, sequence: u64) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height, sequence)
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        self.data.get(idx..idx + 3).map(|p| [p[0], p[1], p[2]])
    }

    /// Overwrite a rectangle with one colour, clipped to the frame
    pub fn paint(&mut self, x: u32, y: u32, w: u32, h: u32, rgb: [u8; 3]) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                let idx = ((row * self.width + col) * 3) as usize;
                self.data[idx..idx + 3].copy_from_slice(&rgb);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_and_get_pixel() {
        let frame = VideoFrame::filled(4, 2, [10, 20, 30], 7);
        assert_eq!(frame.data.len(), 24);
        assert_eq!(frame.get_pixel(3, 1), Some([10, 20, 30]));
        assert_eq!(frame.get_pixel(4, 0), None);
        assert_eq!(frame.sequence, 7);
    }

    #[test]
    fn test_paint_clips() {
        let mut frame = VideoFrame::filled(4, 4, [0, 0, 0], 0);
        frame.paint(2, 2, 10, 10, [255, 0, 0]);
        assert_eq!(frame.get_pixel(3, 3), Some([255, 0, 0]));
        assert_eq!(frame.get_pixel(1, 1), Some([0, 0, 0]));
    }

    #[test]
    fn test_from_rgb_image() {
        let img = RgbImage::from_pixel(3, 2, image::Rgb([1, 2, 3]));
        let frame = VideoFrame::from_rgb_image(img, 1);
        assert_eq!((frame.width, frame.height), (3, 2));
        assert_eq!(frame.get_pixel(2, 1), Some([1, 2, 3]));
    }
}
