//! Resynchronizing video frame decoder

use bytes::BytesMut;
use tracing::{debug, trace};

use super::format::{FrameLayout, MAGIC_LEN, find_magic, swap_samples};
use super::fps::FpsMeter;
use crate::types::{DecodedFrame, StatusCode};

/// Output of one scan pass, in the order it was produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderEvent {
    Frame(DecodedFrame),
    /// The status code differs from the previously observed one
    StatusChanged(StatusCode),
}

/// Cumulative decoder counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub frames: u64,
    pub spurious_headers: u64,
    pub truncated_frames: u64,
    pub discarded_bytes: u64,
    pub status_changes: u64,
}

/// Extracts frames from a continuous, lossy byte stream
///
/// Each chunk is appended to an internal buffer and a scan pass runs
/// immediately. After every pass the buffer holds either no recognizable
/// header, or the start of a header whose metadata or payload is still
/// incomplete.
///
/// Recovery is silent: spurious headers cost one byte each, a frame cut short
/// by the next header is dropped up to that header, and noise before a header
/// is discarded. Only [`DecoderStats`] and debug logs reveal that it happened.
#[derive(Debug)]
pub struct VideoFrameDecoder {
    layout: FrameLayout,
    buffer: BytesMut,
    /// Prefix of the buffer already searched for a header without success
    scanned: usize,
    /// Bytes after the header at offset 0 already known to hold no magic
    clean_until: usize,
    max_buffered: usize,
    last_status: StatusCode,
    resolution: Option<(u16, u16)>,
    fps: FpsMeter,
    stats: DecoderStats,
}

impl VideoFrameDecoder {
    pub fn new(layout: FrameLayout) -> Self {
        // Two of the largest frames: enough for a frame in flight plus the next
        let max_buffered = layout.max_frame_len().saturating_mul(2);
        Self {
            layout,
            buffer: BytesMut::new(),
            scanned: 0,
            clean_until: 0,
            max_buffered,
            last_status: StatusCode::UNKNOWN,
            resolution: None,
            fps: FpsMeter::new(),
            stats: DecoderStats::default(),
        }
    }

    /// Cap on bytes retained while no header is visible
    ///
    /// When a pass finds no header and the buffer exceeds this limit, all but
    /// the last `MAGIC_LEN - 1` bytes (a possible partial magic) are dropped.
    pub fn with_buffer_limit(mut self, max_buffered: usize) -> Self {
        self.max_buffered = max_buffered.max(MAGIC_LEN);
        self
    }

    /// Append a chunk and decode everything it completes
    pub fn on_chunk(&mut self, bytes: &[u8]) -> Vec<DecoderEvent> {
        self.buffer.extend_from_slice(bytes);
        self.scan()
    }

    /// Run one scan pass over the buffered bytes
    pub fn scan(&mut self) -> Vec<DecoderEvent> {
        let mut events = Vec::new();
        let magic = self.layout.magic();
        let metadata_len = self.layout.metadata_len();

        loop {
            // A magic may straddle the end of the previous search
            let resume = self.scanned.saturating_sub(MAGIC_LEN - 1);
            let Some(header_pos) = find_magic(&self.buffer[resume..], &magic).map(|pos| pos + resume) else {
                self.scanned = self.buffer.len();
                self.enforce_buffer_limit();
                break;
            };

            if header_pos > 0 {
                trace!("Resynchronizing: skipping {} bytes before header", header_pos);
                self.discard(header_pos);
            }

            if self.buffer.len() < metadata_len {
                break;
            }

            let metadata = match self.layout.parse_metadata(&self.buffer[..metadata_len]) {
                Ok(metadata) => metadata,
                Err(reason) => {
                    debug!("Spurious header ({:?}), skipping one byte", reason);
                    self.stats.spurious_headers += 1;
                    self.discard(1);
                    continue;
                }
            };

            let frame_len = self.layout.frame_len(&metadata);

            // A header inside the declared frame means this frame lost data
            let search_end = self.buffer.len().min(frame_len + MAGIC_LEN - 1);
            let search_start = self.clean_until.clamp(1, search_end);
            let premature = find_magic(&self.buffer[search_start..search_end], &magic)
                .map(|offset| offset + search_start)
                .filter(|&next| next < frame_len);
            if let Some(next) = premature {
                debug!(
                    "Truncated {}x{} frame: next header at {} of {} bytes",
                    metadata.width, metadata.height, next, frame_len
                );
                self.stats.truncated_frames += 1;
                self.discard(next);
                continue;
            }

            self.clean_until = search_end + 1 - MAGIC_LEN;

            if self.buffer.len() < frame_len {
                trace!("Waiting for frame: {}/{} bytes", self.buffer.len(), frame_len);
                break;
            }

            let frame_bytes = self.buffer.split_to(frame_len);
            self.scanned = 0;
            self.clean_until = 0;
            let pixels = swap_samples(&frame_bytes[metadata_len..]);

            events.push(DecoderEvent::Frame(DecodedFrame::new(
                metadata.width,
                metadata.height,
                pixels,
                metadata.status,
            )));

            if self.resolution != Some((metadata.width, metadata.height)) {
                debug!("Stream resolution {}x{}", metadata.width, metadata.height);
                self.resolution = Some((metadata.width, metadata.height));
            }

            if let Some(status) = metadata.status.filter(|&status| status != self.last_status) {
                debug!("Status changed: {} -> {}", self.last_status, status);
                self.last_status = status;
                self.stats.status_changes += 1;
                events.push(DecoderEvent::StatusChanged(status));
            }

            self.fps.record_frame();
            self.stats.frames += 1;
            trace!("Decoded {}x{} frame ({} bytes)", metadata.width, metadata.height, frame_len);
        }

        events
    }

    /// Close the FPS window; call once per wall-clock second
    pub fn sample_fps(&mut self) -> u32 {
        self.fps.sample()
    }

    /// Most recently sampled frame rate
    pub fn fps(&self) -> u32 {
        self.fps.reported()
    }

    /// Clear all session state (stream start/stop, unbind, mode switch)
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
        self.clean_until = 0;
        self.last_status = StatusCode::UNKNOWN;
        self.resolution = None;
        self.fps.reset();
    }

    pub fn last_status(&self) -> StatusCode {
        self.last_status
    }

    pub fn resolution(&self) -> Option<(u16, u16)> {
        self.resolution
    }

    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    fn discard(&mut self, count: usize) {
        let _ = self.buffer.split_to(count);
        self.scanned = 0;
        self.clean_until = 0;
        self.stats.discarded_bytes += count as u64;
    }

    fn enforce_buffer_limit(&mut self) {
        if self.buffer.len() > self.max_buffered {
            let excess = self.buffer.len() - (MAGIC_LEN - 1);
            debug!("No header in {} buffered bytes, dropping {}", self.buffer.len(), excess);
            self.discard(excess);
        }
    }
}

impl Default for VideoFrameDecoder {
    fn default() -> Self {
        Self::new(FrameLayout::default())
    }
}
