//! Logging configuration types.

use serde::{Deserialize, Serialize};

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
#[derive(Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// `EnvFilter` directive for the guestview crates at this level.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "guestview=debug",
            LogLevel::Info => "guestview=info",
            LogLevel::Warning => "guestview=warn",
            LogLevel::Error => "guestview=error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}
