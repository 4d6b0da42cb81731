//! Inline command protocol
//!
//! A client line starting with `/` is a command. The text after the slash is
//! split on whitespace; the first token is the verb (matched
//! case-insensitively) and the rest are its arguments:
//!
//! | Verb   | Arguments      | Reply                              |
//! |--------|----------------|------------------------------------|
//! | `TIME` | none           | current server time                |
//! | `ECHO` | one or more    | the arguments joined by spaces     |
//! | `ADD`  | exactly two    | the sum of both numbers            |
//! | `WHO`  | none           | nicknames of all registered users  |
//! | `EXIT` | none           | acknowledgement, then disconnect   |
//!
//! Malformed commands never close the connection; they produce a one-line
//! error reply instead. Apart from WHO reading the registry, processing a
//! command has no side effects.

use crate::registry::Registry;
use chrono::{DateTime, Local};
use thiserror::Error;

/// A successfully parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Time,
    Echo(String),
    Add(f64, f64),
    Who,
    Exit,
}

/// Reasons a command line is rejected; the display text is sent to the client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Error: empty command")]
    Empty,
    #[error("Error: no text to echo")]
    NoEchoText,
    #[error("Usage: /ADD <a> <b>")]
    AddUsage,
    #[error("Error: please provide numbers")]
    NotANumber,
    #[error("Unknown command")]
    Unknown(String),
}

impl Command {
    /// Parses the part of a client line that follows the `/` prefix
    pub fn parse(input: &str) -> Result<Command, CommandError> {
        let mut tokens = input.split_whitespace();
        let verb = tokens.next().ok_or(CommandError::Empty)?;
        let args: Vec<&str> = tokens.collect();

        match verb.to_ascii_uppercase().as_str() {
            "TIME" => Ok(Command::Time),
            "ECHO" => {
                if args.is_empty() {
                    Err(CommandError::NoEchoText)
                } else {
                    Ok(Command::Echo(args.join(" ")))
                }
            }
            "ADD" => {
                if args.len() != 2 {
                    return Err(CommandError::AddUsage);
                }
                let a = args[0].parse::<f64>().map_err(|_| CommandError::NotANumber)?;
                let b = args[1].parse::<f64>().map_err(|_| CommandError::NotANumber)?;
                Ok(Command::Add(a, b))
            }
            "WHO" => Ok(Command::Who),
            "EXIT" => Ok(Command::Exit),
            _ => Err(CommandError::Unknown(verb.to_string())),
        }
    }
}

/// Text to send back to the issuing client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Newline-terminated response line
    pub text: String,
    /// Set when the session should close after sending `text`
    pub disconnect: bool,
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        let mut text = text.into();
        text.push('\n');
        Self {
            text,
            disconnect: false,
        }
    }
}

/// Answers commands for one session, reading the registry only for WHO
pub struct CommandProcessor<'a> {
    registry: &'a Registry,
}

impl<'a> CommandProcessor<'a> {
    /// Creates a processor that lists users from `registry`
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Runs a command against the current wall clock
    pub fn process(&self, input: &str) -> Reply {
        self.process_at(input, Local::now())
    }

    /// Runs a command, using `now` as the server time for TIME
    pub fn process_at(&self, input: &str, now: DateTime<Local>) -> Reply {
        match Command::parse(input) {
            Ok(command) => self.execute(command, now),
            Err(e) => Reply::line(e.to_string()),
        }
    }

    fn execute(&self, command: Command, now: DateTime<Local>) -> Reply {
        match command {
            Command::Time => Reply::line(format!(
                "Current time: {}",
                now.format("%Y-%m-%d %H:%M:%S")
            )),
            Command::Echo(text) => Reply::line(text),
            Command::Add(a, b) => Reply::line(format!("Result: {}", a + b)),
            Command::Who => {
                let nicknames = self.registry.nicknames();
                if nicknames.is_empty() {
                    Reply::line("No active users")
                } else {
                    Reply::line(format!("Active users: {}", nicknames.join(", ")))
                }
            }
            Command::Exit => Reply {
                text: "Disconnecting...\n".to_string(),
                disconnect: true,
            },
        }
    }
}
