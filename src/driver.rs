//! Driver spawns and manages the engine task of one session

use std::future::pending;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, Interval, MissedTickBehavior, interval_at, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::ScopeConfig;
use crate::provider::ChunkProvider;
use crate::reassembly::{ChunkOutcome, PerSourceReassembler, QuietPeriodReassembler};
use crate::types::{Chunk, DecodedFrame, Message, ScopeEvent, SessionStats, SourceId, StatusCode, TransportEvent};
use crate::video::{DecoderEvent, VideoFrameDecoder};

const MAX_ERRORS: u32 = 10;

/// Which engine a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// One quiet-period reassembler (serial, TCP client, UDP generic receive)
    Reassemble,
    /// One quiet-period reassembler per peer (TCP server)
    PerSource,
    /// Pseudo-video decoding (UDP video streaming)
    Video,
}

/// Result of spawning a driver task
pub struct DriverChannels {
    /// Every engine output, in production order; ends with `SessionEnded`
    pub events: mpsc::UnboundedReceiver<ScopeEvent>,
    /// Most recently decoded frame
    pub frames: watch::Receiver<Option<Arc<DecodedFrame>>>,
    /// Last observed status code, `StatusCode::UNKNOWN` outside a stream
    pub status: watch::Receiver<StatusCode>,
    /// Last sampled frame rate
    pub fps: watch::Receiver<u32>,
    /// Live session counters
    pub stats: watch::Receiver<SessionStats>,
    /// Cancellation token for ending the session
    pub cancel: CancellationToken,
    /// Resolves to the final counters once the session has ended
    pub task: JoinHandle<SessionStats>,
}

/// Driver spawns and manages the engine task
///
/// The task owns the provider and exactly one engine instance. It is the only
/// mutator of engine state, so no locking is involved: chunks, idle deadlines,
/// FPS windows and cancellation are all serialized through one `select!`.
pub struct Driver;

impl Driver {
    /// Spawn the engine task for `provider`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<P>(provider: P, config: &ScopeConfig, mode: SessionMode) -> DriverChannels
    where
        P: ChunkProvider,
    {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = watch::channel(None);
        let (status_tx, status_rx) = watch::channel(StatusCode::UNKNOWN);
        let (fps_tx, fps_rx) = watch::channel(0);
        let (stats_tx, stats_rx) = watch::channel(SessionStats::default());

        let cancel = CancellationToken::new();

        let engine = Engine::new(config, mode);
        let outputs = Outputs { events: event_tx, frames: frame_tx, status: status_tx, fps: fps_tx, stats: stats_tx };
        let fps_window = (mode == SessionMode::Video).then(|| config.fps_window());

        let task = tokio::spawn(Self::engine_task(provider, engine, outputs, fps_window, cancel.clone()));

        DriverChannels {
            events: event_rx,
            frames: frame_rx,
            status: status_rx,
            fps: fps_rx,
            stats: stats_rx,
            cancel,
            task,
        }
    }

    async fn engine_task<P>(
        mut provider: P,
        mut engine: Engine,
        outputs: Outputs,
        fps_window: Option<Duration>,
        cancel: CancellationToken,
    ) -> SessionStats
    where
        P: ChunkProvider,
    {
        info!("Engine task started ({:?})", engine.mode());
        let mut stats = SessionStats::default();
        let mut error_count = 0u32;

        let mut fps_ticker = fps_window.map(|window| {
            let mut ticker = interval_at(Instant::now() + window, window);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            let idle = engine.next_deadline();

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Session cancelled");
                    break;
                }
                _ = sleep_until_deadline(idle) => {
                    for message in engine.poll_expired(now()) {
                        outputs.message(message, &mut stats);
                    }
                }
                _ = next_tick(fps_ticker.as_mut()) => {
                    let fps = engine.sample_fps();
                    trace!("FPS sample: {}", fps);
                    outputs.fps.send_replace(fps);
                    outputs.emit(ScopeEvent::FpsSample(fps));
                }
                result = provider.next_event() => match result {
                    Ok(Some(event)) => {
                        error_count = 0;
                        engine.on_event(event, &outputs, &mut stats);
                    }
                    Ok(None) => {
                        info!("Transport ended after {} chunks", stats.chunks);
                        break;
                    }
                    Err(e) => {
                        // Provider error - don't end the session on transient failures
                        error_count += 1;
                        error!("Provider error ({}/{}): {}", error_count, MAX_ERRORS, e);

                        if error_count >= MAX_ERRORS || !e.is_retryable() {
                            error!("Giving up on transport, ending session");
                            break;
                        }

                        // Exponential backoff: 100ms, 200ms, 400ms, ...
                        let backoff = Duration::from_millis(50 * (1 << error_count.min(5)));
                        warn!("Retrying transport in {:?}", backoff);
                        tokio::select! {
                            _ = cancel.cancelled() => {
                                info!("Session cancelled during backoff");
                                break;
                            }
                            _ = tokio::time::sleep(backoff) => {}
                        }
                    }
                },
            }

            outputs.stats.send_replace(stats);
        }

        // Stop intake; what the transport already handed over still counts
        provider.close();
        let mut drained = 0usize;
        loop {
            match provider.next_event().await {
                Ok(Some(event)) => {
                    drained += 1;
                    engine.on_event(event, &outputs, &mut stats);
                }
                Ok(None) => break,
                Err(e) => warn!("Discarding queued provider error at session end: {}", e),
            }
        }
        if drained > 0 {
            debug!("Processed {} queued events at session end", drained);
        }
        drop(provider);

        for message in engine.on_session_end() {
            outputs.message(message, &mut stats);
        }
        outputs.status.send_replace(StatusCode::UNKNOWN);
        outputs.fps.send_replace(0);
        outputs.stats.send_replace(stats);
        outputs.emit(ScopeEvent::SessionEnded(stats));

        info!(
            "Engine task ended ({} bytes, {} messages, {} frames)",
            stats.rx_bytes, stats.messages, stats.frames
        );
        stats
    }
}

/// Engine output sinks
struct Outputs {
    events: mpsc::UnboundedSender<ScopeEvent>,
    frames: watch::Sender<Option<Arc<DecodedFrame>>>,
    status: watch::Sender<StatusCode>,
    fps: watch::Sender<u32>,
    stats: watch::Sender<SessionStats>,
}

impl Outputs {
    fn emit(&self, event: ScopeEvent) {
        if self.events.send(event).is_err() {
            trace!("Event receiver dropped");
        }
    }

    fn message(&self, message: Message, stats: &mut SessionStats) {
        stats.messages += 1;
        debug!("Message from {}: {} bytes", message.source, message.payload.len());
        self.emit(ScopeEvent::MessageReady(message));
    }
}

enum Engine {
    Single(QuietPeriodReassembler),
    PerSource(PerSourceReassembler),
    Video(VideoFrameDecoder),
}

impl Engine {
    fn new(config: &ScopeConfig, mode: SessionMode) -> Self {
        match mode {
            SessionMode::Reassemble => {
                Engine::Single(QuietPeriodReassembler::new(config.idle_period(), config.source_filter))
            }
            SessionMode::PerSource => Engine::PerSource(PerSourceReassembler::new(config.idle_period())),
            SessionMode::Video => Engine::Video(VideoFrameDecoder::new(config.frame_layout())),
        }
    }

    fn mode(&self) -> SessionMode {
        match self {
            Engine::Single(_) => SessionMode::Reassemble,
            Engine::PerSource(_) => SessionMode::PerSource,
            Engine::Video(_) => SessionMode::Video,
        }
    }

    fn on_event(&mut self, event: TransportEvent, outputs: &Outputs, stats: &mut SessionStats) {
        match event {
            TransportEvent::Chunk(chunk) => self.on_chunk(chunk, outputs, stats),
            TransportEvent::SourceClosed(source) => {
                if let Some(message) = self.on_source_closed(source) {
                    outputs.message(message, stats);
                }
            }
        }
    }

    fn on_chunk(&mut self, chunk: Chunk, outputs: &Outputs, stats: &mut SessionStats) {
        stats.chunks += 1;
        stats.rx_bytes += chunk.len() as u64;
        trace!("Chunk from {}: {} bytes", chunk.source, chunk.len());

        match self {
            Engine::Single(reassembler) => {
                if reassembler.on_chunk(chunk.source, &chunk.payload, now()) == ChunkOutcome::Ignored {
                    stats.ignored_chunks += 1;
                }
            }
            Engine::PerSource(reassembler) => reassembler.on_chunk(chunk.source, &chunk.payload, now()),
            Engine::Video(decoder) => {
                for event in decoder.on_chunk(&chunk.payload) {
                    match event {
                        DecoderEvent::Frame(frame) => {
                            let frame = Arc::new(frame);
                            outputs.frames.send_replace(Some(Arc::clone(&frame)));
                            outputs.emit(ScopeEvent::FrameDecoded(frame));
                        }
                        DecoderEvent::StatusChanged(status) => {
                            debug!("Status changed to {} ({:?})", status, status.kind());
                            outputs.status.send_replace(status);
                            outputs.emit(ScopeEvent::StatusChanged(status));
                        }
                    }
                }

                let decoded = decoder.stats();
                stats.frames = decoded.frames;
                stats.spurious_headers = decoded.spurious_headers;
                stats.truncated_frames = decoded.truncated_frames;
                stats.discarded_bytes = decoded.discarded_bytes;
                stats.status_changes = decoded.status_changes;
            }
        }
    }

    fn on_source_closed(&mut self, source: SourceId) -> Option<Message> {
        match self {
            Engine::Single(reassembler) if reassembler.active_source() == Some(source) => {
                debug!("Source {} closed, flushing", source);
                reassembler.on_idle_timeout()
            }
            Engine::Single(_) => None,
            Engine::PerSource(reassembler) => reassembler.on_source_closed(source),
            Engine::Video(_) => {
                debug!("Source {} closed during video session", source);
                None
            }
        }
    }

    fn poll_expired(&mut self, now: std::time::Instant) -> Vec<Message> {
        match self {
            Engine::Single(reassembler) => reassembler.poll_expired(now).into_iter().collect(),
            Engine::PerSource(reassembler) => reassembler.poll_expired(now),
            Engine::Video(_) => Vec::new(),
        }
    }

    fn next_deadline(&self) -> Option<std::time::Instant> {
        match self {
            Engine::Single(reassembler) => reassembler.deadline(),
            Engine::PerSource(reassembler) => reassembler.next_deadline(),
            Engine::Video(_) => None,
        }
    }

    fn sample_fps(&mut self) -> u32 {
        match self {
            Engine::Video(decoder) => decoder.sample_fps(),
            _ => 0,
        }
    }

    fn on_session_end(&mut self) -> Vec<Message> {
        match self {
            Engine::Single(reassembler) => reassembler.on_session_end().into_iter().collect(),
            Engine::PerSource(reassembler) => reassembler.on_session_end(),
            Engine::Video(decoder) => {
                decoder.reset();
                Vec::new()
            }
        }
    }
}

/// Current time on the tokio clock, so paused-time tests drive idle deadlines
fn now() -> std::time::Instant {
    Instant::now().into_std()
}

async fn sleep_until_deadline(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => sleep_until(Instant::from_std(deadline)).await,
        None => pending().await,
    }
}

async fn next_tick(ticker: Option<&mut Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending().await,
    }
}
