//! Source identity and transport input types

use bytes::Bytes;
use std::fmt;
use std::net::SocketAddr;

/// Identity of the party that produced a chunk.
///
/// UDP chunks carry the sender's address; TCP peers may be identified either by
/// address or by a connection handle; serial ports always use a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceId {
    /// Remote socket address (UDP sender, TCP peer)
    Addr(SocketAddr),
    /// Opaque connection handle (serial port, accepted TCP client)
    Connection(u64),
}

impl From<SocketAddr> for SourceId {
    fn from(addr: SocketAddr) -> Self {
        SourceId::Addr(addr)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Addr(addr) => write!(f, "{}", addr),
            SourceId::Connection(handle) => write!(f, "conn#{}", handle),
        }
    }
}

/// A raw read delivered by the transport layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub source: SourceId,
    pub payload: Bytes,
}

impl Chunk {
    pub fn new(source: SourceId, payload: impl Into<Bytes>) -> Self {
        Self { source, payload: payload.into() }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Everything a transport can tell the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Newly arrived bytes
    Chunk(Chunk),
    /// A single peer went away (TCP client disconnect) while the session continues
    SourceClosed(SourceId),
}

impl From<Chunk> for TransportEvent {
    fn from(chunk: Chunk) -> Self {
        TransportEvent::Chunk(chunk)
    }
}

/// One logical message produced by quiet-period reassembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Source whose bytes make up the message
    pub source: SourceId,
    /// Every accepted byte of the accumulation cycle, in arrival order
    pub payload: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        let addr: SocketAddr = "192.168.1.20:5000".parse().unwrap();
        assert_eq!(SourceId::from(addr).to_string(), "192.168.1.20:5000");
        assert_eq!(SourceId::Connection(7).to_string(), "conn#7");
    }

    #[test]
    fn sources_differ_by_port() {
        let a: SocketAddr = "10.0.0.1:4000".parse().unwrap();
        let b: SocketAddr = "10.0.0.1:4001".parse().unwrap();
        assert_ne!(SourceId::from(a), SourceId::from(b));
    }

    #[test]
    fn chunk_length_tracks_payload() {
        let chunk = Chunk::new(SourceId::Connection(1), &b"ABC"[..]);
        assert_eq!(chunk.len(), 3);
        assert!(!chunk.is_empty());
        assert!(Chunk::new(SourceId::Connection(1), Bytes::new()).is_empty());
    }
}
