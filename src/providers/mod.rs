//! Transport providers

pub mod channel;
pub mod replay;

pub use channel::{ChannelProvider, ChunkSender, channel};
pub use replay::ReplayProvider;
