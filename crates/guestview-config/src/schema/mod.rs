//! Configuration schema types for guestview.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the values the display has always used.

mod display;
mod logging;
mod timing;

pub use display::*;
pub use logging::*;
pub use timing::*;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct GuestViewConfig {
    pub display: DisplayConfig,
    pub pool: PoolConfig,
    pub timing: TimingConfig,
    pub logging: LoggingConfig,
}
