//! Rate control for frame preview streams

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Update rate for frame preview streams
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum PreviewRate {
    /// Latest frame without a rate cap; a slow consumer still skips frames
    #[default]
    Native,

    /// At most this many frames per second, latest frame wins
    Max(u32),
}

impl PreviewRate {
    /// Normalize against the observed stream rate
    ///
    /// A cap at or above the observed rate never throttles, so Native is used
    /// instead. A zero observed rate means "not known yet" and keeps the cap.
    pub fn normalize(self, observed_fps: u32) -> Self {
        match self {
            PreviewRate::Native => PreviewRate::Native,
            PreviewRate::Max(0) => PreviewRate::Native,
            PreviewRate::Max(hz) if observed_fps > 0 && hz >= observed_fps => PreviewRate::Native,
            PreviewRate::Max(hz) => PreviewRate::Max(hz),
        }
    }

    /// Throttle interval if a cap applies
    pub fn throttle_interval(self) -> Option<Duration> {
        match self {
            PreviewRate::Native | PreviewRate::Max(0) => None,
            PreviewRate::Max(hz) => Some(Duration::from_secs_f64(1.0 / hz as f64)),
        }
    }
}
