//! Engine output events

use std::sync::Arc;

use super::{DecodedFrame, Message, SessionStats, StatusCode};

/// Everything a session reports to its host, in production order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeEvent {
    /// A quiet period ended a burst of reads
    MessageReady(Message),
    FrameDecoded(Arc<DecodedFrame>),
    /// Emitted after the frame that carried the new code
    StatusChanged(StatusCode),
    /// Frames decoded during the last sampling window
    FpsSample(u32),
    /// Final event of every session
    SessionEnded(SessionStats),
}

impl ScopeEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScopeEvent::SessionEnded(_))
    }
}
