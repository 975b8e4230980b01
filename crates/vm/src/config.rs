//! Execution limits.

/// Default maximum call depth.
pub const DEFAULT_MAX_FRAMES: usize = 1024;

/// Default maximum number of value slots across all frames.
pub const DEFAULT_MAX_SLOTS: usize = 1 << 20;

/// Bounds on a thread's call stack. Exceeding either is `StackOverflow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    pub max_frames: usize,
    pub max_slots: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
            max_slots: DEFAULT_MAX_SLOTS,
        }
    }
}

impl VmConfig {
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn with_max_slots(mut self, max_slots: usize) -> Self {
        self.max_slots = max_slots;
        self
    }
}
