//! Provider trait for transport event sources

use crate::Result;
use crate::types::TransportEvent;

/// Trait for transport event sources
///
/// Providers abstract over how raw reads reach the engine (a channel fed by
/// transport workers, a scripted replay, a test harness) and handle their own
/// timing internally.
#[async_trait::async_trait]
pub trait ChunkProvider: Send + 'static {
    /// Get the next transport event
    ///
    /// Returns:
    /// - `Ok(Some(event))` - A chunk arrived or a source closed
    /// - `Ok(None)` - Transport ended (normal termination)
    /// - `Err(e)` - Transport error; the driver backs off and retries
    async fn next_event(&mut self) -> Result<Option<TransportEvent>>;

    /// Stop accepting new events
    ///
    /// Events already handed over by the transport stay queued. Afterwards
    /// `next_event` must yield them without waiting and then return `Ok(None)`.
    fn close(&mut self);
}
