//! Core value types shared by the engine, the driver and session handles.
//!
//! - [`SourceId`], [`Chunk`] and [`TransportEvent`] describe what transports deliver
//! - [`Message`] is one flushed quiet-period reassembly result
//! - [`DecodedFrame`] and [`StatusCode`] are the video decoder's output
//! - [`SessionStats`] carries the per-session counters
//! - [`ScopeEvent`] is what a running session reports
//! - [`PreviewRate`] controls how often preview consumers see frames

mod event;
mod frame;
mod preview_rate;
mod source;
mod stats;
mod status;

pub use event::ScopeEvent;
pub use frame::DecodedFrame;
pub use preview_rate::PreviewRate;
pub use source::{Chunk, Message, SourceId, TransportEvent};
pub use stats::SessionStats;
pub use status::{StatusCode, StatusKind};
