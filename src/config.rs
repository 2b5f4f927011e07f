//! Session configuration
//!
//! Every field has a default matching the instrument's fixed behavior, so an
//! empty document is a valid configuration:
//!
//! ```rust
//! use bytescope::{FrameProfile, ScopeConfig};
//!
//! let config = ScopeConfig::from_yaml_str("profile: legacy\nfps_window_ms: 500\n").unwrap();
//! assert_eq!(config.profile, FrameProfile::Legacy);
//! assert_eq!(config.idle_period_ms, 200);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::reassembly::SourceFilter;
use crate::types::PreviewRate;
use crate::video::format::MAX_DIMENSION;
use crate::video::{FrameLayout, FrameProfile};
use crate::{Result, ScopeError};

/// Tunables for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ScopeConfig {
    /// Silence after which buffered bytes are flushed as one message
    pub idle_period_ms: u64,
    /// Sender filter for generic (single-stream) reassembly
    pub source_filter: SourceFilter,
    /// Video wire layout revision
    pub profile: FrameProfile,
    /// Largest accepted frame width or height
    pub max_dimension: u16,
    /// Length of the FPS sampling window
    pub fps_window_ms: u64,
    /// Default rate for frame preview streams
    pub preview_rate: PreviewRate,
    /// Capacity of the transport-to-driver channel
    pub channel_capacity: usize,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            idle_period_ms: 200,
            source_filter: SourceFilter::AnySource,
            profile: FrameProfile::Current,
            max_dimension: MAX_DIMENSION,
            fps_window_ms: 1000,
            preview_rate: PreviewRate::Native,
            channel_capacity: 256,
        }
    }
}

impl ScopeConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ScopeConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| ScopeError::config_file_error(path.to_path_buf(), e))?;
        debug!("Loaded config from {} ({} bytes)", path.display(), yaml.len());
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.idle_period_ms == 0 {
            return Err(ScopeError::invalid_config("idle_period_ms", "must be positive"));
        }
        if self.fps_window_ms == 0 {
            return Err(ScopeError::invalid_config("fps_window_ms", "must be positive"));
        }
        if self.max_dimension == 0 {
            return Err(ScopeError::invalid_config("max_dimension", "must be positive"));
        }
        if self.max_dimension > MAX_DIMENSION {
            return Err(ScopeError::invalid_config(
                "max_dimension",
                format!("{} exceeds the wire limit of {}", self.max_dimension, MAX_DIMENSION),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(ScopeError::invalid_config("channel_capacity", "must be positive"));
        }
        let fixed = self.profile.fixed_resolution();
        if let Some((width, height)) = fixed.filter(|&(w, h)| w.max(h) > self.max_dimension) {
            return Err(ScopeError::invalid_config(
                "max_dimension",
                format!("{:?} frames are {}x{}", self.profile, width, height),
            ));
        }
        Ok(())
    }

    pub fn idle_period(&self) -> Duration {
        Duration::from_millis(self.idle_period_ms)
    }

    pub fn fps_window(&self) -> Duration {
        Duration::from_millis(self.fps_window_ms)
    }

    pub fn frame_layout(&self) -> FrameLayout {
        FrameLayout::new(self.profile, self.max_dimension)
    }
}
