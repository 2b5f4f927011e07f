//! Channel provider fed by transport workers

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::provider::ChunkProvider;
use crate::types::{Chunk, SourceId, TransportEvent};
use crate::{Result, ScopeError};

type Envelope = Result<TransportEvent>;

/// Create a bounded transport channel
///
/// The sender half goes to whatever reads the socket or port; the provider
/// half goes to the driver. The transport ends once every sender is dropped.
pub fn channel(capacity: usize) -> (ChunkSender, ChannelProvider) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChunkSender { tx }, ChannelProvider { rx })
}

/// Handle used by transport workers to deliver raw reads
///
/// Reads are delivered in the order the transport produced them. Once the
/// session has ended every delivery fails with [`ScopeError::SessionClosed`].
#[derive(Debug, Clone)]
pub struct ChunkSender {
    tx: mpsc::Sender<Envelope>,
}

impl ChunkSender {
    pub async fn deliver(&self, source: SourceId, payload: impl Into<Bytes>) -> Result<()> {
        self.send(Ok(Chunk::new(source, payload).into())).await
    }

    /// Report that a peer disconnected (TCP server client, serial unplug)
    pub async fn close_source(&self, source: SourceId) -> Result<()> {
        self.send(Ok(TransportEvent::SourceClosed(source))).await
    }

    /// Forward a transport failure to the driver
    pub async fn report_error(&self, error: ScopeError) -> Result<()> {
        self.send(Err(error)).await
    }

    /// Deliver from a plain OS thread
    ///
    /// Blocks while the channel is full. Must not be called from inside an
    /// async runtime.
    pub fn blocking_deliver(&self, source: SourceId, payload: impl Into<Bytes>) -> Result<()> {
        self.tx
            .blocking_send(Ok(Chunk::new(source, payload).into()))
            .map_err(|_| ScopeError::SessionClosed)
    }

    /// Whether the session on the other end has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn send(&self, envelope: Envelope) -> Result<()> {
        self.tx.send(envelope).await.map_err(|_| {
            trace!("Delivery after session end");
            ScopeError::SessionClosed
        })
    }
}

/// Provider side of [`channel`]
#[derive(Debug)]
pub struct ChannelProvider {
    rx: mpsc::Receiver<Envelope>,
}

#[async_trait::async_trait]
impl ChunkProvider for ChannelProvider {
    async fn next_event(&mut self) -> Result<Option<TransportEvent>> {
        let next = self.rx.recv().await;
        if next.is_none() {
            debug!("All chunk senders dropped");
        }
        next.transpose()
    }

    fn close(&mut self) {
        self.rx.close();
    }
}
