//! Line-oriented command session over a reader/writer pair.
//!
//! Each non-empty input line is one command and produces one response (the
//! `keys` command prints a count line followed by one line per key).

use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use keyrot::{Key, Manager};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("missing argument for '{0}'")]
    MissingArgument(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Current,
    Validate(String),
    Keys,
    Stats,
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default();
        match name {
            "current" => Ok(Command::Current),
            "validate" => parts
                .next()
                .map(|value| Command::Validate(value.to_string()))
                .ok_or(CommandError::MissingArgument("validate")),
            "keys" => Ok(Command::Keys),
            "stats" => Ok(Command::Stats),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn unix_secs(at: SystemTime) -> u64 {
    at.duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

fn describe(key: &Key) -> String {
    format!(
        "{} {} {}",
        key,
        unix_secs(key.created_at()),
        key.valid_for().as_secs()
    )
}

/// Run a command against the manager and return the response text.
///
/// Returns `None` for [`Command::Quit`].
pub fn execute(manager: &Manager, command: &Command) -> Option<String> {
    let response = match command {
        Command::Current => describe(&manager.current_key()),
        Command::Validate(value) => {
            let verdict = if manager.validate(value) {
                "valid"
            } else {
                "invalid"
            };
            log::debug!("Validation result: {}", verdict);
            verdict.to_string()
        }
        Command::Keys => {
            let keys = manager.keys();
            let mut lines = vec![keys.len().to_string()];
            lines.extend(
                keys.iter()
                    .map(|key| format!("{} {}", key, unix_secs(key.created_at()))),
            );
            lines.join("\n")
        }
        Command::Stats => format!("rotations {}", manager.rotations()),
        Command::Quit => return None,
    };
    Some(response)
}

/// Read commands from `input` until EOF or `quit`, writing responses to `output`.
pub fn run<R: BufRead, W: Write>(manager: &Manager, input: R, mut output: W) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match line.parse::<Command>() {
            Ok(command) => match execute(manager, &command) {
                Some(response) => response,
                None => break,
            },
            Err(e) => {
                log::warn!("Rejected command: {}", e);
                format!("error: {}", e)
            }
        };

        writeln!(output, "{}", response)?;
        output.flush()?;
    }
    Ok(())
}
