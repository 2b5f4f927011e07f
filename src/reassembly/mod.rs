//! Quiet-period reassembly.
//!
//! Serial ports, TCP streams and UDP sockets hand over reads whose boundaries
//! have nothing to do with the sender's messages. Senders pause between
//! messages, so a message is considered complete once no new bytes have
//! arrived for a fixed idle period (200 ms by default).
//!
//! - [`QuietPeriodReassembler`] serves one logical stream (serial, TCP client,
//!   UDP generic receive with [`SourceFilter::SingleSender`])
//! - [`PerSourceReassembler`] keeps one buffer per connected peer (TCP server)

mod per_source;
mod quiet;

pub use per_source::PerSourceReassembler;
pub use quiet::{ChunkOutcome, QuietPeriodReassembler, SourceFilter};
