//! Quiet-period reassembly for a single logical stream

use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::types::{Message, SourceId};

/// Which senders may contribute to the message being accumulated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum SourceFilter {
    /// Every chunk is appended (serial, TCP client)
    #[default]
    AnySource,
    /// Only the sender of the first chunk may contribute until the next flush (UDP)
    SingleSender,
}

/// What happened to a delivered chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Appended, idle timer restarted
    Accepted,
    /// Dropped by the single-sender filter
    Ignored,
}

/// Coalesces bursts of reads into one message after a period of silence
///
/// The reassembler holds no timer of its own. It records the instant at which
/// the idle period expires; the owner either sleeps until [`deadline`] and calls
/// [`on_idle_timeout`], or calls [`poll_expired`] with the current time.
///
/// [`deadline`]: QuietPeriodReassembler::deadline
/// [`on_idle_timeout`]: QuietPeriodReassembler::on_idle_timeout
/// [`poll_expired`]: QuietPeriodReassembler::poll_expired
#[derive(Debug)]
pub struct QuietPeriodReassembler {
    idle_period: Duration,
    filter: SourceFilter,
    buffer: BytesMut,
    active: Option<SourceId>,
    deadline: Option<Instant>,
}

impl QuietPeriodReassembler {
    /// Idle period used by every receive path of the instrument
    pub const DEFAULT_IDLE_PERIOD: Duration = Duration::from_millis(200);

    pub fn new(idle_period: Duration, filter: SourceFilter) -> Self {
        Self { idle_period, filter, buffer: BytesMut::new(), active: None, deadline: None }
    }

    /// Accept a raw read from `source` that arrived at `now`
    pub fn on_chunk(&mut self, source: SourceId, bytes: &[u8], now: Instant) -> ChunkOutcome {
        if self.buffer.is_empty() {
            self.active = Some(source);
        }

        if self.filter == SourceFilter::SingleSender && self.active != Some(source) {
            trace!(
                "Ignoring {} bytes from {} while accumulating from {:?}",
                bytes.len(),
                source,
                self.active
            );
            return ChunkOutcome::Ignored;
        }

        self.buffer.extend_from_slice(bytes);
        self.deadline = Some(now + self.idle_period);
        trace!("Buffered {} bytes from {} ({} total)", bytes.len(), source, self.buffer.len());
        ChunkOutcome::Accepted
    }

    /// Flush the accumulated bytes as one message
    ///
    /// Returns `None` when nothing is buffered, so a timer that fires after a
    /// manual flush has no effect.
    pub fn on_idle_timeout(&mut self) -> Option<Message> {
        self.deadline = None;
        if self.buffer.is_empty() {
            self.active = None;
            return None;
        }

        let payload = self.buffer.split().freeze();
        let source = match self.active.take() {
            Some(source) => source,
            None => {
                // Bytes are only appended after a source is recorded
                debug!("Dropping {} buffered bytes with no recorded source", payload.len());
                return None;
            }
        };

        debug!("Flushing {} byte message from {}", payload.len(), source);
        Some(Message { source, payload })
    }

    /// Flush only if the idle period has elapsed at `now`
    pub fn poll_expired(&mut self, now: Instant) -> Option<Message> {
        match self.deadline {
            Some(deadline) if deadline <= now => self.on_idle_timeout(),
            _ => None,
        }
    }

    /// Force out any partial message and reset all state
    pub fn on_session_end(&mut self) -> Option<Message> {
        let message = self.on_idle_timeout();
        self.buffer = BytesMut::new();
        self.active = None;
        self.deadline = None;
        message
    }

    /// Instant at which the pending message will be flushed
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn active_source(&self) -> Option<SourceId> {
        self.active
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn idle_period(&self) -> Duration {
        self.idle_period
    }
}

impl Default for QuietPeriodReassembler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_IDLE_PERIOD, SourceFilter::AnySource)
    }
}
