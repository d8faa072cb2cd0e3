//! Interactive input: plain lines are chat messages, `/word` lines are
//! commands.

use parley_store::Theme;

/// One line typed at the chat prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    /// Send this text.
    Message(String),
    /// Run a local command.
    Command(ChatCommand),
    /// Blank line.
    Empty,
}

/// Slash commands available inside `parley chat`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatCommand {
    /// Reload the transcript from the backend.
    History,
    /// Start a fresh session.
    New,
    /// Clear the local transcript.
    Clear,
    /// Show reading lists.
    Lists,
    /// Replay the offline log.
    Sync,
    /// Dial immediately instead of waiting for the next attempt.
    Reconnect,
    /// Switch theme, or toggle it when no argument is given.
    Theme(Option<Theme>),
    /// Print the command list.
    Help,
    /// Leave the chat.
    Quit,
    /// Anything else starting with `/`.
    Unknown(String),
}

pub const HELP: &str = "\
/history    reload the transcript
/new        start a new session
/clear      clear the local transcript
/lists      show reading lists
/sync       replay queued offline changes
/reconnect  reconnect now
/theme [light|dark]
/quit       leave";

impl Input {
    /// Classify a raw line.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        // `//text` sends a message starting with a slash.
        if let Some(escaped) = line.strip_prefix("//") {
            return Self::Message(format!("/{escaped}"));
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Message(line.to_string());
        };
        let mut words = rest.split_whitespace();
        let name = words.next().unwrap_or_default().to_ascii_lowercase();
        let arg = words.next();
        let command = match name.as_str() {
            "history" => ChatCommand::History,
            "new" => ChatCommand::New,
            "clear" => ChatCommand::Clear,
            "lists" => ChatCommand::Lists,
            "sync" => ChatCommand::Sync,
            "reconnect" => ChatCommand::Reconnect,
            "theme" => match arg.map(str::parse::<Theme>) {
                None => ChatCommand::Theme(None),
                Some(Ok(theme)) => ChatCommand::Theme(Some(theme)),
                Some(Err(_)) => ChatCommand::Unknown(line.to_string()),
            },
            "help" | "?" => ChatCommand::Help,
            "quit" | "exit" | "q" => ChatCommand::Quit,
            _ => ChatCommand::Unknown(line.to_string()),
        };
        Self::Command(command)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
