//! Replay provider for recorded or scripted transport traffic

use bytes::Bytes;
use std::collections::VecDeque;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, trace};

use crate::provider::ChunkProvider;
use crate::types::{Chunk, SourceId, TransportEvent};
use crate::{Result, ScopeError};

#[derive(Debug)]
enum Step {
    Event(TransportEvent),
    Fail(String),
}

/// Replays transport events with their original spacing
///
/// Each step carries the delay since the previous one. Delays are scaled by
/// the playback speed and slept on the tokio clock, so paused-time tests run
/// instantly while keeping quiet-period semantics intact.
///
/// `next_event` is cancel safe: a step is only consumed once its due time has
/// passed, and the due time survives a dropped future.
#[derive(Debug)]
pub struct ReplayProvider {
    steps: VecDeque<(Duration, Step)>,
    speed: f64,
    next_due: Option<Instant>,
    replayed: usize,
}

impl ReplayProvider {
    pub fn new() -> Self {
        Self { steps: VecDeque::new(), speed: 1.0, next_due: None, replayed: 0 }
    }

    /// Split a captured byte stream into fixed-size reads
    ///
    /// Models a sender that writes `chunk_size` bytes every `spacing`.
    pub fn from_stream(source: SourceId, stream: &[u8], chunk_size: usize, spacing: Duration) -> Self {
        let mut replay = Self::new();
        for piece in stream.chunks(chunk_size.max(1)) {
            replay = replay.chunk_after(spacing, source, Bytes::copy_from_slice(piece));
        }
        replay
    }

    /// Append a chunk delivered `delay` after the previous step
    pub fn chunk_after(mut self, delay: Duration, source: SourceId, payload: impl Into<Bytes>) -> Self {
        let event = TransportEvent::Chunk(Chunk::new(source, payload));
        self.steps.push_back((delay, Step::Event(event)));
        self
    }

    /// Append a disconnect of `source`
    pub fn close_after(mut self, delay: Duration, source: SourceId) -> Self {
        self.steps.push_back((delay, Step::Event(TransportEvent::SourceClosed(source))));
        self
    }

    /// Append a transport failure
    pub fn fail_after(mut self, delay: Duration, reason: impl Into<String>) -> Self {
        self.steps.push_back((delay, Step::Fail(reason.into())));
        self
    }

    /// Set playback speed (1.0 = recorded pace)
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(0.1, 10.0);
        debug!("Playback speed set to {}x", self.speed);
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    /// Total replay time at the current speed
    pub fn duration(&self) -> Duration {
        let total: Duration = self.steps.iter().map(|(delay, _)| *delay).sum();
        total.div_f64(self.speed)
    }
}

impl Default for ReplayProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ChunkProvider for ReplayProvider {
    async fn next_event(&mut self) -> Result<Option<TransportEvent>> {
        let Some(&(delay, _)) = self.steps.front() else {
            info!("Replay finished after {} steps", self.replayed);
            return Ok(None);
        };

        let speed = self.speed;
        let due = *self.next_due.get_or_insert_with(|| Instant::now() + delay.div_f64(speed));
        tokio::time::sleep_until(due).await;

        self.next_due = None;
        let Some((_, step)) = self.steps.pop_front() else {
            return Ok(None);
        };
        self.replayed += 1;
        trace!("Replay step {} ({} left)", self.replayed, self.steps.len());

        match step {
            Step::Event(event) => Ok(Some(event)),
            Step::Fail(reason) => Err(ScopeError::transport_failed(reason)),
        }
    }

    fn close(&mut self) {
        // Steps not yet due have not been delivered by the recorded transport
        if !self.steps.is_empty() {
            debug!("Replay closed with {} steps left", self.steps.len());
        }
        self.steps.clear();
        self.next_due = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: SourceId = SourceId::Connection(1);

    #[tokio::test(start_paused = true)]
    async fn replays_with_recorded_spacing() {
        let mut replay = ReplayProvider::new()
            .chunk_after(Duration::ZERO, SRC, &b"AB"[..])
            .chunk_after(Duration::from_millis(50), SRC, &b"CD"[..])
            .close_after(Duration::from_millis(300), SRC);
        assert_eq!(replay.duration(), Duration::from_millis(350));

        let start = Instant::now();
        assert!(matches!(replay.next_event().await, Ok(Some(TransportEvent::Chunk(_)))));
        assert_eq!(start.elapsed(), Duration::ZERO);

        assert!(matches!(replay.next_event().await, Ok(Some(TransportEvent::Chunk(_)))));
        assert_eq!(start.elapsed(), Duration::from_millis(50));

        let closed = replay.next_event().await.unwrap();
        assert_eq!(closed, Some(TransportEvent::SourceClosed(SRC)));
        assert_eq!(start.elapsed(), Duration::from_millis(350));

        assert_eq!(replay.next_event().await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn speed_scales_delays() {
        let mut replay = ReplayProvider::from_stream(SRC, b"0123456789", 4, Duration::from_millis(100));
        assert_eq!(replay.remaining(), 3);
        replay.set_speed(2.0);

        let start = Instant::now();
        while replay.next_event().await.unwrap().is_some() {}
        assert_eq!(start.elapsed(), Duration::from_millis(150));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_poll_keeps_its_place() {
        let mut replay = ReplayProvider::new()
            .chunk_after(Duration::from_millis(100), SRC, &b"AB"[..])
            .chunk_after(Duration::from_millis(100), SRC, &b"CD"[..]);

        let start = Instant::now();
        let interrupted =
            tokio::time::timeout(Duration::from_millis(60), replay.next_event()).await;
        assert!(interrupted.is_err());
        assert_eq!(replay.remaining(), 2);

        let first = replay.next_event().await.unwrap();
        assert_eq!(first, Some(TransportEvent::Chunk(Chunk::new(SRC, &b"AB"[..]))));
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn close_drops_steps_not_yet_due() {
        let mut replay = ReplayProvider::new()
            .chunk_after(Duration::ZERO, SRC, &b"AB"[..])
            .chunk_after(Duration::from_secs(5), SRC, &b"CD"[..]);
        assert!(replay.next_event().await.unwrap().is_some());

        replay.close();
        let start = Instant::now();
        assert_eq!(replay.next_event().await.unwrap(), None);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn failures_are_retryable_transport_errors() {
        let mut replay = ReplayProvider::new().fail_after(Duration::ZERO, "link down");
        let err = replay.next_event().await.unwrap_err();
        assert!(matches!(err, ScopeError::Transport { .. }));
        assert!(err.is_retryable());
    }
}
