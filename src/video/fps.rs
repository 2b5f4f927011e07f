//! Frames-per-second estimation

/// Counts decoded frames and turns them into a rate once per sampling window
///
/// The owner calls [`sample`](FpsMeter::sample) once per wall-clock second.
/// Between samples [`reported`](FpsMeter::reported) returns the last rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FpsMeter {
    frames_in_window: u32,
    reported: u32,
}

impl FpsMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&mut self) {
        self.frames_in_window = self.frames_in_window.saturating_add(1);
    }

    /// Close the current window: its frame count becomes the reported rate
    pub fn sample(&mut self) -> u32 {
        self.reported = std::mem::take(&mut self.frames_in_window);
        self.reported
    }

    pub fn reported(&self) -> u32 {
        self.reported
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
