//! Attach protocol timing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Safety timer armed after binding a guest, in milliseconds.
    pub fallback_delay_ms: u64,
    /// Paint yields between the attaching and attached visual states.
    pub reveal_frames: u32,
    /// Quiet period before accumulated ctrl+wheel deltas become a zoom step.
    pub zoom_debounce_ms: u64,
    /// Period of the default frame clock.
    pub frame_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fallback_delay_ms: 2000,
            reveal_frames: 3,
            zoom_debounce_ms: 20,
            frame_interval_ms: 16,
        }
    }
}
