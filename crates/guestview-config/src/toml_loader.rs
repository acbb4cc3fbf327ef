//! Reading and writing the TOML config file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use guestview_common::ConfigError;
use tracing::{info, warn};

use crate::schema::GuestViewConfig;
use crate::validation;

/// Parse `path` into a config.
///
/// Missing fields take serde defaults. A file that parses but fails
/// validation is not an error: the problems are logged and the defaults
/// are used instead.
pub fn load_from_path(path: &Path) -> Result<GuestViewConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(io_error("read", path, e)),
    };

    let config: GuestViewConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;

    if let Err(e) = validation::validate(&config) {
        warn!(path = %path.display(), "{e}; using default config");
        return Ok(GuestViewConfig::default());
    }

    info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Load from [`default_config_path`], writing a commented default file
/// first if there is none.
pub fn load_default() -> Result<GuestViewConfig, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            create_default_config(&path)?;
            Ok(GuestViewConfig::default())
        }
        other => other,
    }
}

/// `<config_dir>/guestview/config.toml`, e.g. `~/.config/guestview/config.toml`
/// on Linux.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        ConfigError::ParseError("could not determine config directory".into())
    })?;
    Ok(config_dir.join("guestview").join("config.toml"))
}

/// Write the commented default config to `path`, creating parent
/// directories as needed.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_error("create", parent, e))?;
    }
    std::fs::write(path, default_config_toml()).map_err(|e| io_error("write", path, e))?;
    info!(path = %path.display(), "wrote default config");
    Ok(())
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> ConfigError {
    ConfigError::ParseError(format!("failed to {action} {}: {e}", path.display()))
}

fn default_config_toml() -> &'static str {
    r##"# guestview configuration
# Only override what you want to change -- missing fields use defaults.

[display]
# class_base = "guest-surface"
# class_attached = "guest-surface--attached"
# class_attaching = "guest-surface--attaching"

[pool]
# idle_size = 2          # 1-4
# attached_size = 1      # 1-idle_size

[timing]
# fallback_delay_ms = 2000   # 100-10000
# reveal_frames = 3          # 1-10
# zoom_debounce_ms = 20      # 1-500
# frame_interval_ms = 16     # 1-100

[logging]
# level = "INFO"         # DEBUG, INFO, WARNING, ERROR
"##
}
