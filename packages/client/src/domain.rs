//! Domain logic for client-side operations.
//!
//! Pure functions and small state holders without I/O, so they are easy to
//! test.

use std::collections::HashMap;

use missionlink_shared::protocol::ClientJoinData;

use crate::error::ClientError;

/// Check if the client should exit immediately based on the error type.
///
/// A rejection (server full, banned, bad invite, ...) will not change by
/// retrying, and neither will a malformed URL.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::Rejected(_) | ClientError::InvalidUrl(_)
    )
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    // Don't reconnect if the error requires immediate exit
    if should_exit_immediately(error) {
        return false;
    }

    // Don't reconnect if we've exhausted all attempts
    current_attempt < max_attempts
}

/// Players currently on the server, keyed by client id.
#[derive(Debug, Default)]
pub struct Roster {
    names: HashMap<String, String>,
    me: Option<String>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, client: &ClientJoinData, is_me: bool) {
        if is_me {
            self.me = Some(client.client_id.clone());
        }
        self.names
            .insert(client.client_id.clone(), client.name.clone());
    }

    pub fn drop_client(&mut self, client_id: &str) -> Option<String> {
        self.names.remove(client_id)
    }

    /// Display name, falling back to the id for unknown clients.
    pub fn name_of<'a>(&'a self, client_id: &'a str) -> &'a str {
        self.names
            .get(client_id)
            .map(String::as_str)
            .unwrap_or(client_id)
    }

    pub fn is_me(&self, client_id: &str) -> bool {
        self.me.as_deref() == Some(client_id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    SetReady(bool),
    Rename(String),
    Help,
    Quit,
}

/// Parse one prompt line. Unknown input yields a usage message.
pub fn parse_input_line(line: &str) -> Result<InputCommand, String> {
    let line = line.trim();
    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map(|(head, rest)| (head, rest.trim()))
        .unwrap_or((line, ""));

    match head {
        "ready" => Ok(InputCommand::SetReady(true)),
        "unready" => Ok(InputCommand::SetReady(false)),
        "name" if !rest.is_empty() => Ok(InputCommand::Rename(rest.to_string())),
        "name" => Err("usage: name <new name>".to_string()),
        "help" | "?" => Ok(InputCommand::Help),
        "quit" | "exit" => Ok(InputCommand::Quit),
        other => Err(format!("unknown command '{}', type 'help'", other)),
    }
}

pub const HELP_TEXT: &str = "commands: ready | unready | name <new name> | help | quit";
