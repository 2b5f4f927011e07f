//! Byte-stream-to-frame reassembly for instrument transports.
//!
//! Serial ports, TCP and UDP sockets deliver bytes in whatever pieces the
//! operating system hands out. Bytescope turns those pieces back into
//! discrete, validated units:
//!
//! - **Quiet-period reassembly**: bytes that arrive in a burst become one
//!   message once the line has been silent for an idle period (200 ms by
//!   default). One stream, or one stream per connected peer.
//! - **Video frame decoding**: a resynchronizing decoder for raw RGB565 frames
//!   streamed over UDP, tolerant of lost datagrams, noise and truncation, with
//!   status-code change detection and a frames-per-second estimate.
//!
//! The engines are plain synchronous state machines ([`reassembly`],
//! [`video`]). A [`Session`] runs one of them on a tokio task fed by a
//! [`ChunkProvider`] and publishes [`ScopeEvent`]s.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bytescope::{ScopeConfig, ScopeEvent, Session, SessionMode, SourceId};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> bytescope::Result<()> {
//!     let config = ScopeConfig::load("bytescope.yaml")?;
//!     let (mut session, sender) = Session::with_channel(&config, SessionMode::Video)?;
//!     let mut events = session.take_events().expect("first call");
//!
//!     // A socket reader task hands every datagram to the session
//!     let peer: std::net::SocketAddr = "192.168.4.1:5000".parse().unwrap();
//!     tokio::spawn(async move {
//!         let datagram = vec![0u8; 1400];
//!         let _ = sender.deliver(SourceId::from(peer), datagram).await;
//!     });
//!
//!     while let Some(event) = events.next().await {
//!         match event {
//!             ScopeEvent::FrameDecoded(frame) => println!("{}x{}", frame.width, frame.height),
//!             ScopeEvent::StatusChanged(status) => println!("status {:?}", status.kind()),
//!             ScopeEvent::FpsSample(fps) => println!("{} fps", fps),
//!             ScopeEvent::SessionEnded(stats) => println!("{:?}", stats),
//!             ScopeEvent::MessageReady(_) => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod config;
mod error;
pub mod types;

// Engines
pub mod reassembly;
pub mod video;

// Stream-based session architecture
pub mod driver;
pub mod provider;
pub mod providers;
mod session;
pub mod stream;

// Core exports
pub use config::ScopeConfig;
pub use error::*;
pub use types::*;

// Engine exports
pub use reassembly::{ChunkOutcome, PerSourceReassembler, QuietPeriodReassembler, SourceFilter};
pub use video::{DecoderEvent, FrameLayout, FrameProfile, VideoFrameDecoder};

// Main API exports
pub use driver::SessionMode;
pub use provider::ChunkProvider;
pub use providers::{ChannelProvider, ChunkSender, ReplayProvider};
pub use session::Session;
