//! Writes [`Render`] instructions to a terminal.

use std::io::{self, Write};

use chrono::Local;
use parley_client::{NoticeLevel, Render};
use parley_core::{ConnectionState, Message, Sender};
use parley_store::Theme;

const RESET: &str = "\x1b[0m";

/// Line-oriented view over any writer.
pub struct Terminal<W: Write> {
    out: W,
    theme: Theme,
    color: bool,
}

impl<W: Write> Terminal<W> {
    /// View over `out`. ANSI colours are emitted only when `color` is set.
    pub fn new(out: W, theme: Theme, color: bool) -> Self {
        Self { out, theme, color }
    }

    /// Apply every instruction in order.
    pub fn render_all(&mut self, renders: &[Render]) -> io::Result<()> {
        for render in renders {
            self.render(render)?;
        }
        self.out.flush()
    }

    /// Apply one instruction.
    pub fn render(&mut self, render: &Render) -> io::Result<()> {
        match render {
            Render::AppendMessage(message) => self.message(message),
            Render::ReplaceMessages(messages) => {
                self.rule("transcript")?;
                for message in messages {
                    self.message(message)?;
                }
                Ok(())
            }
            Render::ClearMessages => self.rule("cleared"),
            Render::ShowTyping => self.dim("bot is typing…"),
            // Typing lines are not erased; the next message follows them.
            Render::HideTyping | Render::Busy(_) => Ok(()),
            Render::Connection(state) => self.connection(*state),
            Render::Notice { level, text } => self.notice(*level, text),
            Render::SessionLabel(Some(label)) => self.rule(&format!("session {label}")),
            Render::SessionLabel(None) => self.rule("no session"),
            Render::Theme(theme) => {
                self.theme = *theme;
                self.dim(&format!("theme: {theme}"))
            }
        }
    }

    /// Print a message line, e.g. `[14:02] bot: Hi`.
    pub fn message(&mut self, message: &Message) -> io::Result<()> {
        let time = message.timestamp.with_timezone(&Local).format("%H:%M");
        let who = match message.sender {
            Sender::User => self.paint("you", self.user_color()),
            Sender::Bot => self.paint("bot", self.bot_color()),
        };
        writeln!(self.out, "[{time}] {who}: {}", message.text)
    }

    /// Print an error that did not come through the reducer.
    pub fn error(&mut self, err: &dyn std::fmt::Display) -> io::Result<()> {
        self.notice(NoticeLevel::Error, &err.to_string())?;
        self.out.flush()
    }

    /// Print a plain line.
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    fn notice(&mut self, level: NoticeLevel, text: &str) -> io::Result<()> {
        let (tag, code) = match level {
            NoticeLevel::Info => ("info", "36"),
            NoticeLevel::Success => ("ok", "32"),
            NoticeLevel::Warning => ("warn", "33"),
            NoticeLevel::Error => ("error", "31"),
        };
        let tag = self.paint(tag, code);
        writeln!(self.out, "! {tag}: {text}")
    }

    fn connection(&mut self, state: ConnectionState) -> io::Result<()> {
        let code = match state {
            ConnectionState::Open => "32",
            ConnectionState::Connecting | ConnectionState::Reconnecting => "33",
            ConnectionState::Closed => "31",
        };
        let state = self.paint(&state.to_string(), code);
        writeln!(self.out, "-- connection: {state} --")
    }

    fn rule(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "-- {text} --")
    }

    fn dim(&mut self, text: &str) -> io::Result<()> {
        let text = self.paint(text, "2");
        writeln!(self.out, "{text}")
    }

    fn user_color(&self) -> &'static str {
        match self.theme {
            Theme::Dark => "94",
            Theme::Light => "34",
        }
    }

    fn bot_color(&self) -> &'static str {
        match self.theme {
            Theme::Dark => "95",
            Theme::Light => "35",
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn output(renders: &[Render]) -> String {
        let mut buf = Vec::new();
        Terminal::new(&mut buf, Theme::Dark, false)
            .render_all(renders)
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn messages_show_sender() {
        let out = output(&[
            Render::AppendMessage(Message::user("Hello")),
            Render::AppendMessage(Message::bot("Hi")),
        ]);
        let lines: Vec<_> = out.lines().collect();
        assert!(lines[0].ends_with("] you: Hello"), "{out}");
        assert!(lines[1].ends_with("] bot: Hi"), "{out}");
    }

    #[test]
    fn notices_are_tagged_by_level() {
        let out = output(&[Render::Notice {
            level: NoticeLevel::Warning,
            text: "Connection lost. Reconnecting…".into(),
        }]);
        assert_eq!(out, "! warn: Connection lost. Reconnecting…\n");
    }

    #[test]
    fn busy_and_hide_typing_print_nothing() {
        assert_eq!(output(&[Render::Busy(true), Render::HideTyping]), "");
    }

    #[test]
    fn session_and_connection_rules() {
        let out = output(&[
            Render::SessionLabel(Some("#0042".into())),
            Render::Connection(ConnectionState::Reconnecting),
        ]);
        assert_eq!(out, "-- session #0042 --\n-- connection: reconnecting --\n");
    }

    #[test]
    fn colour_only_when_enabled() {
        let mut buf = Vec::new();
        Terminal::new(&mut buf, Theme::Light, true)
            .render_all(&[Render::Notice {
                level: NoticeLevel::Error,
                text: "boom".into(),
            }])
            .unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("\x1b[31merror\x1b[0m"), "{out:?}");
    }

    #[test]
    fn theme_switch_is_reported() {
        assert_eq!(output(&[Render::Theme(Theme::Light)]), "theme: light\n");
    }
}
