//! Session handle held by the host

use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{UnboundedReceiverStream, WatchStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ScopeConfig;
use crate::driver::{Driver, SessionMode};
use crate::provider::ChunkProvider;
use crate::providers::{ChunkSender, channel};
use crate::stream::ThrottleExt;
use crate::types::{DecodedFrame, PreviewRate, ScopeEvent, SessionStats, StatusCode};
use crate::{Result, ScopeError};

/// One active reassembly or video session
///
/// Starting a session spawns the engine task; ending it (explicitly, by
/// dropping the handle, or when the transport runs dry) flushes any pending
/// message, clears the decoder and stops all timers.
///
/// ```rust,no_run
/// use bytescope::{ScopeConfig, ScopeEvent, Session, SessionMode, SourceId};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> bytescope::Result<()> {
/// let (mut session, sender) = Session::with_channel(&ScopeConfig::default(), SessionMode::Reassemble)?;
/// let mut events = session.take_events().expect("events taken once");
///
/// sender.deliver(SourceId::Connection(1), &b"AT+GMR\r\n"[..]).await?;
/// if let Some(ScopeEvent::MessageReady(message)) = events.next().await {
///     println!("{} bytes from {}", message.payload.len(), message.source);
/// }
/// session.end().await?;
/// # Ok(())
/// # }
/// ```
pub struct Session {
    mode: SessionMode,
    preview_rate: PreviewRate,

    events: Option<mpsc::UnboundedReceiver<ScopeEvent>>,
    frames: watch::Receiver<Option<Arc<DecodedFrame>>>,
    status: watch::Receiver<StatusCode>,
    fps: watch::Receiver<u32>,
    stats: watch::Receiver<SessionStats>,

    /// Cancellation token for stopping the engine task
    cancel: CancellationToken,
    task: Option<JoinHandle<SessionStats>>,
}

impl Session {
    /// Start a session over an existing provider
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<P>(provider: P, config: &ScopeConfig, mode: SessionMode) -> Result<Self>
    where
        P: ChunkProvider,
    {
        config.validate()?;
        info!("Starting {:?} session", mode);

        let channels = Driver::spawn(provider, config, mode);

        Ok(Self {
            mode,
            preview_rate: config.preview_rate,
            events: Some(channels.events),
            frames: channels.frames,
            status: channels.status,
            fps: channels.fps,
            stats: channels.stats,
            cancel: channels.cancel,
            task: Some(channels.task),
        })
    }

    /// Start a session fed through a bounded channel
    ///
    /// The returned sender can be cloned into transport workers; use
    /// [`ChunkSender::blocking_deliver`] from plain threads.
    pub fn with_channel(config: &ScopeConfig, mode: SessionMode) -> Result<(Self, ChunkSender)> {
        config.validate()?;
        let (sender, provider) = channel(config.channel_capacity);
        let session = Self::start(provider, config, mode)?;
        Ok((session, sender))
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Take the event stream; only the first call returns it
    ///
    /// Events are buffered from session start, so nothing is lost between
    /// `start` and this call. The stream ends after `SessionEnded`.
    pub fn take_events(&mut self) -> Option<impl Stream<Item = ScopeEvent> + Send + 'static> {
        self.events.take().map(UnboundedReceiverStream::new)
    }

    /// Decoded frames for preview, rate limited per `rate`
    ///
    /// The latest frame wins when the consumer is capped below the stream rate.
    pub fn frames(&self, rate: PreviewRate) -> BoxStream<'static, Arc<DecodedFrame>> {
        let frames = WatchStream::new(self.frames.clone()).filter_map(|frame| async move { frame });

        match rate.normalize(self.fps()).throttle_interval() {
            None => frames.boxed(),
            Some(interval) => frames.throttle(interval).boxed(),
        }
    }

    /// Frames at the configured preview rate
    pub fn preview(&self) -> BoxStream<'static, Arc<DecodedFrame>> {
        self.frames(self.preview_rate)
    }

    /// Status transitions as a stream of the current code
    pub fn status_updates(&self) -> impl Stream<Item = StatusCode> + Send + 'static {
        WatchStream::from_changes(self.status.clone())
    }

    pub fn latest_frame(&self) -> Option<Arc<DecodedFrame>> {
        self.frames.borrow().clone()
    }

    pub fn current_status(&self) -> StatusCode {
        *self.status.borrow()
    }

    /// Last sampled frame rate (0 before the first window closes)
    pub fn fps(&self) -> u32 {
        *self.fps.borrow()
    }

    pub fn stats(&self) -> SessionStats {
        *self.stats.borrow()
    }

    /// Whether the engine task is still running
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// End the session and wait for the engine to flush
    ///
    /// Chunks the transport delivered before this call are still processed.
    /// Pending reassembly is then emitted as a final message before
    /// `SessionEnded`; chunks delivered afterwards are rejected.
    pub async fn end(&mut self) -> Result<SessionStats> {
        let task = self.task.take().ok_or(ScopeError::SessionClosed)?;
        self.cancel.cancel();

        let stats = task
            .await
            .map_err(|e| ScopeError::transport_failed_with_source("engine task failed", Box::new(e)))?;
        info!(
            "{:?} session ended: {} chunks, {} messages, {} frames",
            self.mode, stats.chunks, stats.messages, stats.frames
        );
        Ok(stats)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("Dropping {:?} session", self.mode);
        // Cancel the engine task on drop for clean shutdown
        self.cancel.cancel();
    }
}
