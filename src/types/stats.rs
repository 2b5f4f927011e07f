//! Session-scoped counters

use serde::{Deserialize, Serialize};

/// Counters owned by one session's driver
///
/// Recovery paths never surface as errors; these counters are the only place
/// where spurious headers, truncated frames and dropped senders become visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct SessionStats {
    /// Bytes received from the transport, accepted or not
    pub rx_bytes: u64,
    /// Chunks received from the transport
    pub chunks: u64,
    /// Chunks dropped by the single-sender filter
    pub ignored_chunks: u64,
    /// Messages flushed by quiet-period reassembly
    pub messages: u64,
    /// Frames accepted by the video decoder
    pub frames: u64,
    /// Candidate headers rejected by metadata validation
    pub spurious_headers: u64,
    /// Frames abandoned because the next header arrived early
    pub truncated_frames: u64,
    /// Bytes discarded while resynchronizing
    pub discarded_bytes: u64,
    /// Status transitions reported
    pub status_changes: u64,
}
