//! In-memory RGBA image frames passed between editors and processors

/// An RGBA8 pixel buffer with its dimensions.
///
/// Frames are the snapshot unit of the image editor history and the
/// payload handed to OCR processors.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFrame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageFrame {
    /// Create a frame from raw RGBA bytes.
    ///
    /// Returns `None` when the buffer length does not match `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Fully transparent frame.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// RGBA value at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }
}

impl std::fmt::Debug for ImageFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_rejects_wrong_length() {
        assert!(ImageFrame::from_rgba(2, 2, vec![0; 15]).is_none());
        assert!(ImageFrame::from_rgba(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn test_pixel_lookup() {
        let mut pixels = vec![0; 16];
        pixels[12..16].copy_from_slice(&[1, 2, 3, 4]);
        let frame = ImageFrame::from_rgba(2, 2, pixels).unwrap();
        assert_eq!(frame.pixel(1, 1), Some([1, 2, 3, 4]));
        assert_eq!(frame.pixel(2, 0), None);
    }
}
