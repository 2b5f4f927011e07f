//! Independent quiet-period reassembly per connected peer (TCP server path)

use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::debug;

use super::quiet::{QuietPeriodReassembler, SourceFilter};
use crate::types::{Message, SourceId};

/// One [`QuietPeriodReassembler`] per peer, each with its own idle deadline
///
/// Peers never share a buffer, so interleaved traffic from several clients is
/// reassembled into separate messages instead of being dropped.
#[derive(Debug)]
pub struct PerSourceReassembler {
    idle_period: Duration,
    peers: BTreeMap<SourceId, QuietPeriodReassembler>,
}

impl PerSourceReassembler {
    pub fn new(idle_period: Duration) -> Self {
        Self { idle_period, peers: BTreeMap::new() }
    }

    pub fn on_chunk(&mut self, source: SourceId, bytes: &[u8], now: Instant) {
        let idle_period = self.idle_period;
        self.peers
            .entry(source)
            .or_insert_with(|| QuietPeriodReassembler::new(idle_period, SourceFilter::AnySource))
            .on_chunk(source, bytes, now);
    }

    /// Flush every peer whose idle period has elapsed at `now`
    pub fn poll_expired(&mut self, now: Instant) -> Vec<Message> {
        let mut flushed = Vec::new();
        self.peers.retain(|_, peer| match peer.poll_expired(now) {
            Some(message) => {
                flushed.push(message);
                false
            }
            None => !peer.is_empty(),
        });
        flushed
    }

    /// A peer disconnected: flush whatever it had sent
    pub fn on_source_closed(&mut self, source: SourceId) -> Option<Message> {
        let mut peer = self.peers.remove(&source)?;
        debug!("Peer {} closed with {} bytes pending", source, peer.buffered_len());
        peer.on_session_end()
    }

    /// Flush every peer in source order and drop all state
    pub fn on_session_end(&mut self) -> Vec<Message> {
        let peers = std::mem::take(&mut self.peers);
        peers.into_values().filter_map(|mut peer| peer.on_session_end()).collect()
    }

    /// Earliest pending flush across all peers
    pub fn next_deadline(&self) -> Option<Instant> {
        self.peers.values().filter_map(QuietPeriodReassembler::deadline).min()
    }

    pub fn pending_sources(&self) -> usize {
        self.peers.len()
    }
}
