//! Decoded video frame type

use bytes::Bytes;

use super::StatusCode;

/// One validated video frame
///
/// The pixel buffer already has every 16-bit sample byte-swapped from wire
/// order into the consumer's in-memory order (RGB565 in native little-endian
/// layout for the current profile).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub width: u16,
    pub height: u16,

    /// Pixel samples, `width * height * 2` bytes (zero-copy via Bytes)
    pub pixels: Bytes,

    /// Status code from the frame's status block; `None` for profiles without one
    pub status: Option<StatusCode>,
}

impl DecodedFrame {
    /// Number of bytes per pixel sample
    pub const BYTES_PER_PIXEL: usize = 2;

    pub fn new(width: u16, height: u16, pixels: impl Into<Bytes>, status: Option<StatusCode>) -> Self {
        Self { width, height, pixels: pixels.into(), status }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Read one pixel sample in consumer order
    pub fn sample(&self, x: u16, y: u16) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y as usize * self.width as usize + x as usize) * Self::BYTES_PER_PIXEL;
        let bytes = self.pixels.get(index..index + Self::BYTES_PER_PIXEL)?;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_addressing() {
        let frame = DecodedFrame::new(2, 2, vec![0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x34, 0x12], None);
        assert_eq!(frame.pixel_count(), 4);
        assert_eq!(frame.sample(0, 0), Some(1));
        assert_eq!(frame.sample(1, 0), Some(2));
        assert_eq!(frame.sample(0, 1), Some(3));
        assert_eq!(frame.sample(1, 1), Some(0x1234));
        assert_eq!(frame.sample(2, 0), None);
        assert_eq!(frame.sample(0, 2), None);
    }
}
