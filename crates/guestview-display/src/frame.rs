//! Paint-boundary yields.

use std::time::Duration;

use async_trait::async_trait;

/// Suspends until the next rendering frame.
#[async_trait(?Send)]
pub trait FrameClock {
    async fn next_frame(&self);
}

/// Frame clock driven by the tokio timer at a fixed interval.
#[derive(Debug, Clone)]
pub struct TokioFrameClock {
    interval: Duration,
}

impl TokioFrameClock {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for TokioFrameClock {
    fn default() -> Self {
        Self::new(Duration::from_millis(16))
    }
}

#[async_trait(?Send)]
impl FrameClock for TokioFrameClock {
    async fn next_frame(&self) {
        tokio::time::sleep(self.interval).await;
    }
}

/// Yield `count` frames in a row.
pub async fn frames(clock: &dyn FrameClock, count: u32) {
    for _ in 0..count {
        clock.next_frame().await;
    }
}
