//! guestview configuration system.
//!
//! TOML-based configuration for the pooled guest display: surface class
//! names, pool sizing, attach timing, and logging. All sections use defaults
//! so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use guestview_config::load_config;
//!
//! let config = load_config().expect("failed to load config");
//! println!("fallback after {}ms", config.timing.fallback_delay_ms);
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::GuestViewConfig;
pub use toml_loader::{default_config_path, load_from_path};

use guestview_common::ConfigError;

/// Load config from the platform default path, creating it if missing.
///
/// The result is always valid: a file that fails validation yields the
/// defaults.
pub fn load_config() -> Result<GuestViewConfig, ConfigError> {
    toml_loader::load_default()
}
