//! Device status codes carried in the video frame status block

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw 3-byte status code as transmitted in the frame status block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct StatusCode(pub [u8; 3]);

impl StatusCode {
    /// Sentinel meaning "no status observed yet"
    pub const UNKNOWN: StatusCode = StatusCode([0xFF, 0xFF, 0xFF]);
    pub const NOMINAL: StatusCode = StatusCode([0x01, 0x00, 0x01]);
    pub const FAULT: StatusCode = StatusCode([0x00, 0x01, 0x01]);
    pub const PENDING: StatusCode = StatusCode([0x00, 0x00, 0x01]);
    pub const ABSENT: StatusCode = StatusCode([0x00, 0x00, 0x00]);

    pub fn bytes(self) -> [u8; 3] {
        self.0
    }

    /// Classify the code with the fixed lookup used by status displays
    pub fn kind(self) -> StatusKind {
        match self {
            StatusCode::NOMINAL => StatusKind::Nominal,
            StatusCode::FAULT => StatusKind::Fault,
            StatusCode::PENDING => StatusKind::Pending,
            StatusCode::ABSENT => StatusKind::Absent,
            _ => StatusKind::Unrecognized,
        }
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::UNKNOWN
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{:02X} {:02X} {:02X}", a, b, c)
    }
}

/// Interpretation of a [`StatusCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum StatusKind {
    Nominal,
    Fault,
    Pending,
    Absent,
    Unrecognized,
}
