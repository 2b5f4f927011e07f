//! Video frame wire format
//!
//! Frames are written back to back into a lossy datagram stream. Each frame
//! starts with fixed metadata, followed by raw 16-bit pixel samples.
//!
//! ## Current profile
//!
//! | Offset | Size | Field                               |
//! |--------|------|-------------------------------------|
//! | 0      | 4    | magic `F0 5A A5 0F`                 |
//! | 4      | 2    | width, big-endian, 1..=4096         |
//! | 6      | 2    | height, big-endian, 1..=4096        |
//! | 8      | 1    | sentinel `FF`                       |
//! | 9      | 3    | status code                         |
//! | 12     | 1    | sentinel `FF`                       |
//! | 13     | w*h*2| pixel samples, byte-swapped         |
//!
//! ## Legacy profile
//!
//! Magic `4F 47 43 20` ("OGC "), width and height as above, no status block,
//! and a fixed 640x480 resolution. Any other resolution marks the header as
//! spurious.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::types::StatusCode;
use crate::{Result, ScopeError};

/// Length of every frame magic
pub const MAGIC_LEN: usize = 4;
/// Magic of the current profile
pub const CURRENT_MAGIC: [u8; MAGIC_LEN] = [0xF0, 0x5A, 0xA5, 0x0F];
/// Magic of the legacy profile
pub const LEGACY_MAGIC: [u8; MAGIC_LEN] = *b"OGC ";
/// Byte framing each side of the status code
pub const STATUS_SENTINEL: u8 = 0xFF;
/// Largest width or height the current profile accepts
pub const MAX_DIMENSION: u16 = 4096;
/// Resolution every legacy frame must declare
pub const LEGACY_RESOLUTION: (u16, u16) = (640, 480);

const CURRENT_METADATA_LEN: usize = 13;
const LEGACY_METADATA_LEN: usize = 8;
const BYTES_PER_SAMPLE: usize = 2;

/// Revision of the framing protocol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum FrameProfile {
    /// Magic `F0 5A A5 0F`, status block, variable resolution
    #[default]
    Current,
    /// Magic "OGC ", no status block, fixed 640x480
    Legacy,
}

impl FrameProfile {
    pub fn magic(self) -> [u8; MAGIC_LEN] {
        match self {
            FrameProfile::Current => CURRENT_MAGIC,
            FrameProfile::Legacy => LEGACY_MAGIC,
        }
    }

    /// Bytes from the start of the magic to the first pixel sample
    pub fn metadata_len(self) -> usize {
        match self {
            FrameProfile::Current => CURRENT_METADATA_LEN,
            FrameProfile::Legacy => LEGACY_METADATA_LEN,
        }
    }

    pub fn has_status_block(self) -> bool {
        matches!(self, FrameProfile::Current)
    }

    pub fn fixed_resolution(self) -> Option<(u16, u16)> {
        match self {
            FrameProfile::Current => None,
            FrameProfile::Legacy => Some(LEGACY_RESOLUTION),
        }
    }

    /// Serialize one frame
    ///
    /// `pixels` are in consumer order (little-endian samples); they are swapped
    /// into wire order. `status` is ignored by profiles without a status block.
    pub fn encode(self, width: u16, height: u16, status: StatusCode, pixels: &[u8]) -> Result<Bytes> {
        let expected = payload_len(width, height);
        if pixels.len() != expected {
            return Err(ScopeError::Encode {
                details: format!(
                    "{}x{} frame needs {} pixel bytes, got {}",
                    width,
                    height,
                    expected,
                    pixels.len()
                ),
            });
        }
        if width == 0 || height == 0 {
            return Err(ScopeError::Encode {
                details: format!("{}x{} frame has an empty dimension", width, height),
            });
        }

        let mut out = BytesMut::with_capacity(self.metadata_len() + expected);
        out.put_slice(&self.magic());
        out.put_u16(width);
        out.put_u16(height);
        if self.has_status_block() {
            out.put_u8(STATUS_SENTINEL);
            out.put_slice(&status.bytes());
            out.put_u8(STATUS_SENTINEL);
        }
        for sample in pixels.chunks_exact(BYTES_PER_SAMPLE) {
            out.put_slice(&[sample[1], sample[0]]);
        }
        Ok(out.freeze())
    }
}

/// Parsed frame metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMetadata {
    pub width: u16,
    pub height: u16,
    pub status: Option<StatusCode>,
}

/// Why a candidate header was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpuriousReason {
    ZeroDimension,
    OversizedDimension,
    UnexpectedResolution,
    BadSentinel,
}

/// Frame layout used by one decoder: profile plus size limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub profile: FrameProfile,
    pub max_dimension: u16,
}

impl FrameLayout {
    pub fn new(profile: FrameProfile, max_dimension: u16) -> Self {
        Self { profile, max_dimension }
    }

    pub fn magic(&self) -> [u8; MAGIC_LEN] {
        self.profile.magic()
    }

    pub fn metadata_len(&self) -> usize {
        self.profile.metadata_len()
    }

    /// Validate metadata at the start of `bytes`
    ///
    /// The caller guarantees `bytes` begins with the magic and holds at least
    /// [`metadata_len`](Self::metadata_len) bytes.
    pub fn parse_metadata(&self, bytes: &[u8]) -> std::result::Result<FrameMetadata, SpuriousReason> {
        let width = u16::from_be_bytes([bytes[4], bytes[5]]);
        let height = u16::from_be_bytes([bytes[6], bytes[7]]);

        if width == 0 || height == 0 {
            return Err(SpuriousReason::ZeroDimension);
        }
        if width > self.max_dimension || height > self.max_dimension {
            return Err(SpuriousReason::OversizedDimension);
        }
        if self.profile.fixed_resolution().is_some_and(|fixed| fixed != (width, height)) {
            return Err(SpuriousReason::UnexpectedResolution);
        }

        let status = if self.profile.has_status_block() {
            if bytes[8] != STATUS_SENTINEL || bytes[12] != STATUS_SENTINEL {
                return Err(SpuriousReason::BadSentinel);
            }
            Some(StatusCode([bytes[9], bytes[10], bytes[11]]))
        } else {
            None
        };

        Ok(FrameMetadata { width, height, status })
    }

    /// Total frame length, metadata included
    pub fn frame_len(&self, metadata: &FrameMetadata) -> usize {
        self.metadata_len() + payload_len(metadata.width, metadata.height)
    }

    /// Length of the largest frame this layout accepts
    pub fn max_frame_len(&self) -> usize {
        let (width, height) =
            self.profile.fixed_resolution().unwrap_or((self.max_dimension, self.max_dimension));
        self.metadata_len() + payload_len(width, height)
    }
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self::new(FrameProfile::Current, MAX_DIMENSION)
    }
}

fn payload_len(width: u16, height: u16) -> usize {
    width as usize * height as usize * BYTES_PER_SAMPLE
}

/// Swap the two bytes of every 16-bit sample
pub fn swap_samples(wire: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(wire.len());
    for sample in wire.chunks_exact(BYTES_PER_SAMPLE) {
        out.put_slice(&[sample[1], sample[0]]);
    }
    out.freeze()
}

/// Position of the first occurrence of `magic` in `haystack`
pub fn find_magic(haystack: &[u8], magic: &[u8; MAGIC_LEN]) -> Option<usize> {
    haystack.windows(MAGIC_LEN).position(|window| window == magic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current_header(width: u16, height: u16, status: [u8; 3]) -> Vec<u8> {
        let mut bytes = CURRENT_MAGIC.to_vec();
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.push(STATUS_SENTINEL);
        bytes.extend_from_slice(&status);
        bytes.push(STATUS_SENTINEL);
        bytes
    }

    #[test]
    fn parses_scenario_header() {
        let header = [0xF0, 0x5A, 0xA5, 0x0F, 0x00, 0x02, 0x00, 0x01, 0xFF, 0x01, 0x00, 0x01, 0xFF];
        let layout = FrameLayout::default();
        let metadata = layout.parse_metadata(&header).unwrap();

        assert_eq!(metadata.width, 2);
        assert_eq!(metadata.height, 1);
        assert_eq!(metadata.status, Some(StatusCode::NOMINAL));
        assert_eq!(layout.frame_len(&metadata), 17);
    }

    #[test]
    fn rejects_out_of_range_dimensions() {
        let layout = FrameLayout::default();
        assert_eq!(
            layout.parse_metadata(&current_header(0, 1, [0; 3])),
            Err(SpuriousReason::ZeroDimension)
        );
        assert_eq!(
            layout.parse_metadata(&current_header(1, 0, [0; 3])),
            Err(SpuriousReason::ZeroDimension)
        );
        assert_eq!(
            layout.parse_metadata(&current_header(4097, 1, [0; 3])),
            Err(SpuriousReason::OversizedDimension)
        );
        assert!(layout.parse_metadata(&current_header(4096, 4096, [0; 3])).is_ok());
    }

    #[test]
    fn rejects_bad_sentinels() {
        let layout = FrameLayout::default();
        let mut header = current_header(2, 2, [1, 0, 1]);
        header[8] = 0xFE;
        assert_eq!(layout.parse_metadata(&header), Err(SpuriousReason::BadSentinel));

        let mut header = current_header(2, 2, [1, 0, 1]);
        header[12] = 0x00;
        assert_eq!(layout.parse_metadata(&header), Err(SpuriousReason::BadSentinel));
    }

    #[test]
    fn legacy_requires_fixed_resolution() {
        let layout = FrameLayout::new(FrameProfile::Legacy, MAX_DIMENSION);
        let mut header = LEGACY_MAGIC.to_vec();
        header.extend_from_slice(&640u16.to_be_bytes());
        header.extend_from_slice(&480u16.to_be_bytes());
        let metadata = layout.parse_metadata(&header).unwrap();
        assert_eq!(metadata.status, None);
        assert_eq!(layout.frame_len(&metadata), 8 + 640 * 480 * 2);

        header[5] = 0x81;
        assert_eq!(layout.parse_metadata(&header), Err(SpuriousReason::UnexpectedResolution));
    }

    #[test]
    fn encode_writes_wire_layout() {
        let frame = FrameProfile::Current
            .encode(2, 1, StatusCode::NOMINAL, &[0x34, 0x12, 0x78, 0x56])
            .unwrap();
        assert_eq!(
            &frame[..],
            &[
                0xF0, 0x5A, 0xA5, 0x0F, 0x00, 0x02, 0x00, 0x01, 0xFF, 0x01, 0x00, 0x01, 0xFF, 0x12,
                0x34, 0x56, 0x78
            ]
        );
    }

    #[test]
    fn encode_rejects_mismatched_payload() {
        let result = FrameProfile::Current.encode(2, 2, StatusCode::NOMINAL, &[0; 6]);
        assert!(matches!(result, Err(ScopeError::Encode { .. })));
        let result = FrameProfile::Current.encode(0, 2, StatusCode::NOMINAL, &[]);
        assert!(matches!(result, Err(ScopeError::Encode { .. })));
    }

    #[test]
    fn swap_reverses_each_sample() {
        assert_eq!(&swap_samples(&[0x12, 0x34, 0xAB, 0xCD])[..], &[0x34, 0x12, 0xCD, 0xAB]);
    }

    #[test]
    fn find_magic_locates_first_match() {
        let mut haystack = vec![0x00, 0xF0, 0x5A];
        haystack.extend_from_slice(&CURRENT_MAGIC);
        haystack.extend_from_slice(&CURRENT_MAGIC);
        assert_eq!(find_magic(&haystack, &CURRENT_MAGIC), Some(3));
        assert_eq!(find_magic(&haystack[..5], &CURRENT_MAGIC), None);
        assert_eq!(find_magic(&[], &CURRENT_MAGIC), None);
    }
}
