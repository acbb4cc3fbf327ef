//! Surface styling and pool sizing.

use serde::{Deserialize, Serialize};

/// Visual class names applied to display surfaces.
///
/// `class_attaching` stacks a revealing surface above the base layer but
/// below the final `class_attached` layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub class_base: String,
    pub class_attached: String,
    pub class_attaching: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            class_base: "guest-surface".into(),
            class_attached: "guest-surface--attached".into(),
            class_attaching: "guest-surface--attaching".into(),
        }
    }
}

/// Free surfaces kept ready by the pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Free surfaces wanted while nothing is attached (valid range: 1-4).
    pub idle_size: u32,
    /// Free surfaces wanted while one surface is attached (1 to `idle_size`).
    pub attached_size: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            idle_size: 2,
            attached_size: 1,
        }
    }
}
