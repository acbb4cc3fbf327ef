//! Scenario scripts.
//!
//! One command per line; blank lines and `#` comments are skipped.
//!
//! ```text
//! open 1
//! show 1
//! wait 10
//! confirm 1
//! wheel 120 ctrl
//! wait 250
//! snapshot
//! ```

use std::time::Duration;

use guestview_common::GuestId;
use thiserror::Error;

/// Script run when no `--script` is given.
pub const DEMO: &str = "\
# a confirmed show, a coalesced burst, and a reveal by the fallback timer
open 1
open 2
open 3
show 1
wait 10
confirm 1
wait 200
snapshot
show 2
show 3
wait 10
auto-confirm on
confirm 2
wait 200
snapshot
auto-confirm off
navigate https://example.com/
wheel 120 ctrl
wheel 60 ctrl
wait 50
focus
show 1
wait 2500
snapshot
destroy 2
teardown
";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a live session for a guest.
    Open(GuestId),
    Show(GuestId),
    /// Have the host report the guest as attached.
    Confirm(GuestId),
    Destroy(GuestId),
    AutoConfirm(bool),
    Focus,
    /// Wheel input on the shown surface.
    Wheel { delta_y: f64, ctrl: bool },
    /// Navigation finished in the shown surface.
    Navigate(String),
    Wait(Duration),
    Snapshot,
    Teardown,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("line {line}: unknown command `{command}`")]
    UnknownCommand { line: usize, command: String },

    #[error("line {line}: {message}")]
    InvalidArgument { line: usize, message: String },
}

pub fn parse(source: &str) -> Result<Vec<Command>, ScenarioError> {
    let mut commands = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        commands.push(parse_line(index + 1, line)?);
    }
    Ok(commands)
}

fn parse_line(line: usize, text: &str) -> Result<Command, ScenarioError> {
    let mut tokens = text.split_whitespace();
    let name = tokens.next().unwrap_or_default();
    let args: Vec<&str> = tokens.collect();
    let invalid = |message: String| ScenarioError::InvalidArgument { line, message };

    let expect_args = |count: usize| {
        if args.len() == count {
            Ok(())
        } else {
            Err(invalid(format!(
                "`{name}` takes {count} argument(s), got {}",
                args.len()
            )))
        }
    };

    let command = match name {
        "open" | "show" | "confirm" | "destroy" => {
            expect_args(1)?;
            let guest = parse_guest(args[0]).ok_or_else(|| {
                invalid(format!("`{}` is not a guest id", args[0]))
            })?;
            match name {
                "open" => Command::Open(guest),
                "show" => Command::Show(guest),
                "confirm" => Command::Confirm(guest),
                _ => Command::Destroy(guest),
            }
        }
        "auto-confirm" => {
            expect_args(1)?;
            match args[0] {
                "on" => Command::AutoConfirm(true),
                "off" => Command::AutoConfirm(false),
                other => return Err(invalid(format!("expected `on` or `off`, got `{other}`"))),
            }
        }
        "focus" => {
            expect_args(0)?;
            Command::Focus
        }
        "wheel" => {
            let ctrl = match args.as_slice() {
                [_] => false,
                [_, "ctrl"] => true,
                _ => return Err(invalid("usage: wheel DELTA [ctrl]".into())),
            };
            let delta_y = args[0]
                .parse::<f64>()
                .map_err(|_| invalid(format!("`{}` is not a wheel delta", args[0])))?;
            Command::Wheel { delta_y, ctrl }
        }
        "navigate" => {
            expect_args(1)?;
            Command::Navigate(args[0].to_string())
        }
        "wait" => {
            expect_args(1)?;
            let ms = args[0]
                .parse::<u64>()
                .map_err(|_| invalid(format!("`{}` is not a duration in ms", args[0])))?;
            Command::Wait(Duration::from_millis(ms))
        }
        "snapshot" => {
            expect_args(0)?;
            Command::Snapshot
        }
        "teardown" => {
            expect_args(0)?;
            Command::Teardown
        }
        other => {
            return Err(ScenarioError::UnknownCommand {
                line,
                command: other.to_string(),
            })
        }
    };
    Ok(command)
}

/// Accepts `3` or `guest-3`.
fn parse_guest(token: &str) -> Option<GuestId> {
    token
        .strip_prefix("guest-")
        .unwrap_or(token)
        .parse()
        .ok()
        .map(GuestId)
}
