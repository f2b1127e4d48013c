//! Chat command parsing.
//!
//! Only the first token is matched, case-insensitively, with any
//! `@botname` suffix stripped. Argument text keeps its original case;
//! keys are lowercased later by the registry.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tasks,
    Help,
    Status,
    Reset,
    ResetAll,
    Add { key: String, label: String },
    Remove { key: String },
    Label { key: String, label: String },
    Default { key: String },
    Done { key: Option<String> },
}

impl Command {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Tasks => "tasks",
            Command::Help => "help",
            Command::Status => "status",
            Command::Reset => "reset",
            Command::ResetAll => "resetall",
            Command::Add { .. } => "add",
            Command::Remove { .. } => "remove",
            Command::Label { .. } => "label",
            Command::Default { .. } => "default",
            Command::Done { .. } => "done",
        }
    }
}

/// A recognized command with missing arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage(pub &'static str);

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Usage: {}", self.0)
    }
}

pub const ADD_USAGE: Usage = Usage("/add <key> <label>");
pub const REMOVE_USAGE: Usage = Usage("/remove <key>");
pub const LABEL_USAGE: Usage = Usage("/label <key> <label>");
pub const DEFAULT_USAGE: Usage = Usage("/default <key>");

/// Split off the first whitespace-delimited token.
fn split_token(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (text, ""),
    }
}

/// `None` for anything that is not a recognized command; such text is
/// ignored without a reply.
pub fn parse(text: &str) -> Option<Result<Command, Usage>> {
    let (head, args) = split_token(text);
    let head = head.to_lowercase();
    let name = head.split('@').next().unwrap_or_default();

    let (first, rest) = split_token(args);
    let first = (!first.is_empty()).then(|| first.to_string());
    let rest = (!rest.is_empty()).then(|| rest.to_string());

    let parsed = match name {
        "/tasks" => Ok(Command::Tasks),
        "/help" => Ok(Command::Help),
        "/status" => Ok(Command::Status),
        "/reset" => Ok(Command::Reset),
        "/resetall" => Ok(Command::ResetAll),
        "/done" => Ok(Command::Done { key: first }),
        "/remove" => first.map(|key| Command::Remove { key }).ok_or(REMOVE_USAGE),
        "/default" => first.map(|key| Command::Default { key }).ok_or(DEFAULT_USAGE),
        "/add" => match (first, rest) {
            (Some(key), Some(label)) => Ok(Command::Add { key, label }),
            _ => Err(ADD_USAGE),
        },
        "/label" => match (first, rest) {
            (Some(key), Some(label)) => Ok(Command::Label { key, label }),
            _ => Err(LABEL_USAGE),
        },
        _ => return None,
    };
    Some(parsed)
}
