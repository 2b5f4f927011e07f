//! Pseudo-video stream decoding.
//!
//! A sender streams raw RGB565 frames over UDP. Datagrams may be lost, so the
//! receiver cannot trust chunk boundaries or even declared frame lengths; it
//! resynchronizes on a fixed magic and validates each candidate header before
//! accepting a frame. See [`format`] for the wire layout.

mod decoder;
pub mod format;
mod fps;

pub use decoder::{DecoderEvent, DecoderStats, VideoFrameDecoder};
pub use format::{FrameLayout, FrameMetadata, FrameProfile, SpuriousReason};
pub use fps::FpsMeter;
