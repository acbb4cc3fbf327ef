use std::time::Duration;

use guestview_config::GuestViewConfig;

/// Runtime options for a [`GuestDisplay`](crate::GuestDisplay).
#[derive(Debug, Clone)]
pub struct DisplayOptions {
    /// Class every surface carries.
    pub class_base: String,
    /// Class of the surface currently shown.
    pub class_attached: String,
    /// Class of a surface being revealed, stacked under the attached one.
    pub class_attaching: String,
    /// Free surfaces wanted while nothing is attached.
    pub idle_pool_size: usize,
    /// Free surfaces wanted while a surface is attached.
    pub attached_pool_size: usize,
    /// Safety timer for a missing attach notification.
    pub fallback_delay: Duration,
    /// Paint yields between the attaching and attached visual states.
    pub reveal_frames: u32,
    pub zoom_debounce: Duration,
    /// Period of the default frame clock.
    pub frame_interval: Duration,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self::from(&GuestViewConfig::default())
    }
}

impl From<&GuestViewConfig> for DisplayOptions {
    fn from(config: &GuestViewConfig) -> Self {
        Self {
            class_base: config.display.class_base.clone(),
            class_attached: config.display.class_attached.clone(),
            class_attaching: config.display.class_attaching.clone(),
            idle_pool_size: config.pool.idle_size as usize,
            attached_pool_size: config.pool.attached_size as usize,
            fallback_delay: Duration::from_millis(config.timing.fallback_delay_ms),
            reveal_frames: config.timing.reveal_frames,
            zoom_debounce: Duration::from_millis(config.timing.zoom_debounce_ms),
            frame_interval: Duration::from_millis(config.timing.frame_interval_ms),
        }
    }
}
