//! Line protocol definitions
//!
//! Client → Server lines are classified into a `Command`; Server → Client
//! output is a `ServerMessage`, encoded as one `">> {text}\n"` line.

use std::fmt;

/// Help text sent for `HELP` and for any unrecognized input
pub const HELP_TEXT: &str = "Available commands: HELP, LIST, EXIT, SAY.";

/// Private greeting sent right after a client joins
pub const WELCOME_TEXT: &str = "Hello there, friend!";

/// Reply to `EXIT`, written just before the connection is closed
pub const FAREWELL_TEXT: &str = "bye!";

/// Prefix used for server-authored broadcasts
pub const SERVER_ORIGIN: &str = "[SERVER]";

/// Client → Server command
///
/// The command set is closed. Unrecognized input is not an error: it
/// falls back to `Help`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List available commands
    Help,
    /// Show connected clients
    List,
    /// Disconnect gracefully
    Exit,
    /// Broadcast the rest of the line
    Say(String),
}

impl Command {
    /// Classify one framed line
    ///
    /// `HELP`, `LIST` and `EXIT` must match the whole line. `SAY ` only has to
    /// prefix it; everything after the first space is the message body and
    /// may be empty. Matching is case-sensitive.
    pub fn parse(line: &str) -> Self {
        match line {
            "HELP" => Command::Help,
            "LIST" => Command::List,
            "EXIT" => Command::Exit,
            _ => match line.strip_prefix("SAY ") {
                Some(body) => Command::Say(body.to_string()),
                None => Command::Help,
            },
        }
    }

    /// Keyword of this command, for logging
    pub fn keyword(&self) -> &'static str {
        match self {
            Command::Help => "HELP",
            Command::List => "LIST",
            Command::Exit => "EXIT",
            Command::Say(_) => "SAY",
        }
    }
}

/// Server → Client message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Private greeting after join
    Welcome,
    /// Command overview
    Help,
    /// Names of all connected clients, in join order
    Roster { names: Vec<String> },
    /// Broadcast line; `from` is `None` for server announcements
    Chat { from: Option<String>, content: String },
    /// Final line before the server closes the connection
    Farewell,
}

impl ServerMessage {
    /// Server-authored announcement
    pub fn announcement(content: impl Into<String>) -> Self {
        ServerMessage::Chat {
            from: None,
            content: content.into(),
        }
    }

    /// Whether the writer should close the connection after this line
    pub fn closes_connection(&self) -> bool {
        matches!(self, ServerMessage::Farewell)
    }

    /// Encode as a complete wire line
    pub fn encode(&self) -> String {
        format!(">> {}\n", self)
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Welcome => f.write_str(WELCOME_TEXT),
            ServerMessage::Help => f.write_str(HELP_TEXT),
            ServerMessage::Roster { names } => {
                write!(f, "{} clients connected: {}.", names.len(), names.join(", "))
            }
            ServerMessage::Chat { from, content } => {
                write!(f, "{} > {}", from.as_deref().unwrap_or(SERVER_ORIGIN), content)
            }
            ServerMessage::Farewell => f.write_str(FAREWELL_TEXT),
        }
    }
}
