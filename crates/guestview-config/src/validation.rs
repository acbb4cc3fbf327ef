//! Full configuration validation.
//!
//! Validates numeric ranges and class names, collecting every problem.

use crate::schema::GuestViewConfig;
use guestview_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &GuestViewConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    // Class names end up as style selectors, so they must be non-empty and distinct
    let display = &config.display;
    for (name, value) in [
        ("display.class_base", &display.class_base),
        ("display.class_attached", &display.class_attached),
        ("display.class_attaching", &display.class_attaching),
    ] {
        if value.trim().is_empty() {
            errors.push(format!("{name} must not be empty"));
        }
    }
    if display.class_attached == display.class_attaching {
        errors.push("display.class_attached and display.class_attaching must differ".into());
    }

    // Pool sizing
    validate_range(&mut errors, "pool.idle_size", config.pool.idle_size, 1, 4);
    validate_range(
        &mut errors,
        "pool.attached_size",
        config.pool.attached_size,
        1,
        config.pool.idle_size.max(1),
    );

    // Timing
    validate_range_u64(
        &mut errors,
        "timing.fallback_delay_ms",
        config.timing.fallback_delay_ms,
        100,
        10_000,
    );
    validate_range(&mut errors, "timing.reveal_frames", config.timing.reveal_frames, 1, 10);
    validate_range_u64(
        &mut errors,
        "timing.zoom_debounce_ms",
        config.timing.zoom_debounce_ms,
        1,
        500,
    );
    validate_range_u64(
        &mut errors,
        "timing.frame_interval_ms",
        config.timing.frame_interval_ms,
        1,
        100,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

fn validate_range_u64(errors: &mut Vec<String>, name: &str, value: u64, min: u64, max: u64) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}
