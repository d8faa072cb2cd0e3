//! # parley
//!
//! Terminal client for the Parley chat backend: account commands, an
//! interactive chat loop, reading lists and offline sync.

#![deny(unsafe_code)]

mod input;
mod render;

use std::io::{self, BufRead, IsTerminal, Stdout, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand, ValueEnum};
use parley_client::{ChatController, Outcome, RegisterForm};
use parley_settings::{ParleySettings, TransportMode, loader};
use parley_store::Theme;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::input::{ChatCommand, HELP, Input};
use crate::render::Terminal;

/// Parley chat client.
#[derive(Parser, Debug)]
#[command(name = "parley", about = "Parley chat client", version)]
struct Cli {
    /// Settings file (defaults to `~/.parley/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Disable ANSI colours.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the access token.
    Login {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Password; prompted for when absent.
        #[arg(long, env = "PARLEY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account.
    Register {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Display name.
        #[arg(long)]
        username: Option<String>,
        /// Password; prompted for (twice) when absent.
        #[arg(long, env = "PARLEY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored token.
    Logout,
    /// Show the logged-in account.
    Whoami,
    /// Interactive chat.
    Chat {
        /// Transport override.
        #[arg(long)]
        transport: Option<TransportMode>,
    },
    /// Print the current session's transcript.
    History,
    /// Replay changes made while offline.
    Sync,
    /// Reading lists.
    Lists {
        #[command(subcommand)]
        action: ListsCommand,
    },
    /// Display preferences.
    Prefs {
        #[command(subcommand)]
        action: PrefsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ListsCommand {
    /// Print every list.
    Show,
    /// Add a book to a list.
    Add {
        /// List name.
        list: String,
        /// Book id.
        book: String,
    },
    /// Remove a book from a list.
    Remove {
        /// List name.
        list: String,
        /// Book id.
        book: String,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsCommand {
    /// Print the stored preferences.
    Show,
    /// Set the theme, or toggle it when no value is given.
    Theme {
        /// `dark` or `light`.
        theme: Option<Theme>,
    },
    /// Turn informational notices on or off.
    Notifications {
        /// `on` or `off`.
        state: Switch,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Switch {
    On,
    Off,
}

fn load_settings(cli: &Cli) -> Result<ParleySettings> {
    let path = cli.settings.clone().unwrap_or_else(loader::settings_path);
    let mut settings = loader::load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    if let Some(raw) = &cli.log_level {
        settings.logging.level =
            loader::parse_log_level(raw).ok_or_else(|| anyhow!("unknown log level: {raw}"))?;
    }
    if let Command::Chat {
        transport: Some(mode),
    } = &cli.command
    {
        settings.transport.mode = *mode;
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;
    parley_logging::init_from_settings(&settings.logging);
    info!(
        base_url = %settings.api.base_url,
        mode = %settings.transport.mode,
        "parley starting"
    );

    let mut controller =
        ChatController::from_settings(settings).context("Failed to build client")?;
    let color = !cli.no_color && io::stdout().is_terminal();
    let mut term = Terminal::new(io::stdout(), controller.state().theme, color);

    match cli.command {
        Command::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password: ")?,
            };
            term.render_all(&controller.login(&email, &password).await?)?;
        }
        Command::Register {
            email,
            username,
            password,
        } => {
            let (password, confirm) = match password {
                Some(p) => (p.clone(), p),
                None => (prompt("Password: ")?, prompt("Confirm password: ")?),
            };
            let form = RegisterForm {
                email,
                username,
                password,
                confirm,
            };
            term.render_all(&controller.register(&form).await?)?;
        }
        Command::Logout => {
            term.render_all(&controller.logout().await?)?;
        }
        Command::Whoami => {
            let user = controller.whoami().await?;
            match user.username {
                Some(name) => term.line(&format!("{name} <{}>", user.email))?,
                None => term.line(&user.email)?,
            }
        }
        Command::Chat { .. } => chat(&mut controller, &mut term).await?,
        Command::History => {
            let _ = controller.resume().await?;
            if controller.state().session.is_none() {
                term.line("No active session.")?;
            }
            for message in &controller.state().messages {
                term.message(message)?;
            }
        }
        Command::Sync => {
            let (report, renders) = controller.sync().await;
            term.render_all(&renders)?;
            term.line(&format!(
                "replayed {}, {} remaining",
                report.replayed, report.remaining
            ))?;
            if let Some(err) = report.error {
                return Err(err).context("Sync stopped");
            }
        }
        Command::Lists { action } => lists(&mut controller, &mut term, action).await?,
        Command::Prefs { action } => match action {
            PrefsCommand::Show => {
                let state = controller.state();
                let notifications = if state.notifications { "on" } else { "off" };
                term.line(&format!("theme: {}", state.theme))?;
                term.line(&format!("notifications: {notifications}"))?;
            }
            PrefsCommand::Theme { theme } => {
                let theme = theme.unwrap_or_else(|| controller.state().theme.toggled());
                term.render_all(&controller.set_theme(theme)?)?;
            }
            PrefsCommand::Notifications { state } => {
                let renders = controller.set_notifications(state == Switch::On)?;
                term.render_all(&renders)?;
                term.line(&format!("notifications: {state:?}").to_lowercase())?;
            }
        },
    }
    Ok(())
}

async fn lists(
    controller: &mut ChatController,
    term: &mut Terminal<Stdout>,
    action: ListsCommand,
) -> Result<()> {
    let outcome = match action {
        ListsCommand::Show => {
            let lists = controller.lists().await?;
            return Ok(term.line(&serde_json::to_string_pretty(&lists)?)?);
        }
        ListsCommand::Add { list, book } => controller.add_to_list(&list, &book).await?,
        ListsCommand::Remove { list, book } => controller.remove_from_list(&list, &book).await?,
    };
    match outcome {
        Outcome::Completed(_) => term.line("Done.")?,
        Outcome::Deferred { pending } => term.line(&format!(
            "Backend unreachable; saved for `parley sync` ({pending} pending)."
        ))?,
    }
    Ok(())
}

async fn chat(controller: &mut ChatController, term: &mut Terminal<Stdout>) -> Result<()> {
    term.render_all(&controller.restore().await?)?;
    if controller.state().user.is_none() {
        bail!("not logged in; run `parley login` first");
    }
    term.render_all(&controller.start_chat().await?)?;
    term.line("Type /help for commands.")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Input::parse(&line) {
                    Input::Empty => {}
                    Input::Message(text) => match controller.submit(&text) {
                        Ok(renders) => term.render_all(&renders)?,
                        Err(e) => term.error(&e)?,
                    },
                    Input::Command(ChatCommand::Quit) => break,
                    Input::Command(command) => run_command(controller, term, command).await?,
                }
            }
            event = controller.next_event() => {
                let renders = controller.handle(event).await;
                term.render_all(&renders)?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    controller.shutdown().await;
    Ok(())
}

/// Run a slash command. Backend failures are printed, not returned.
async fn run_command(
    controller: &mut ChatController,
    term: &mut Terminal<Stdout>,
    command: ChatCommand,
) -> io::Result<()> {
    match command {
        ChatCommand::History => match controller.history().await {
            Ok(messages) => {
                for message in &messages {
                    term.message(message)?;
                }
                Ok(())
            }
            Err(e) => term.error(&e),
        },
        ChatCommand::New => match controller.new_session().await {
            Ok(renders) => term.render_all(&renders),
            Err(e) => term.error(&e),
        },
        ChatCommand::Clear => term.render_all(&controller.clear_chat()),
        ChatCommand::Lists => match controller.lists().await {
            Ok(lists) => term.line(&lists.to_string()),
            Err(e) => term.error(&e),
        },
        ChatCommand::Sync => {
            let (report, renders) = controller.sync().await;
            term.render_all(&renders)?;
            match report.error {
                Some(err) => term.error(&err),
                None => Ok(()),
            }
        }
        ChatCommand::Reconnect => match controller.reconnect_now() {
            Ok(()) => Ok(()),
            Err(e) => term.error(&e),
        },
        ChatCommand::Theme(theme) => {
            let theme = theme.unwrap_or_else(|| controller.state().theme.toggled());
            match controller.set_theme(theme) {
                Ok(renders) => term.render_all(&renders),
                Err(e) => term.error(&e),
            }
        }
        ChatCommand::Help => term.line(HELP),
        ChatCommand::Quit => Ok(()),
        ChatCommand::Unknown(raw) => term.line(&format!("Unknown command: {raw} (try /help)")),
    }
}

/// Read one line from stdin after printing `label`.
fn prompt(label: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{label}")?;
    stdout.flush()?;
    let mut line = String::new();
    let _ = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_login() {
        let cli = Cli::parse_from(["parley", "login", "--email", "a@b.co", "--password", "pw"]);
        match cli.command {
            Command::Login { email, password } => {
                assert_eq!(email, "a@b.co");
                assert_eq!(password.as_deref(), Some("pw"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cli_chat_transport_override() {
        let cli = Cli::parse_from(["parley", "chat", "--transport", "request"]);
        assert!(matches!(
            cli.command,
            Command::Chat {
                transport: Some(TransportMode::Request)
            }
        ));
    }

    #[test]
    fn cli_chat_rejects_unknown_transport() {
        assert!(Cli::try_parse_from(["parley", "chat", "--transport", "carrier-pigeon"]).is_err());
    }

    #[test]
    fn cli_lists_add() {
        let cli = Cli::parse_from(["parley", "lists", "add", "reading", "12"]);
        match cli.command {
            Command::Lists {
                action: ListsCommand::Add { list, book },
            } => {
                assert_eq!(list, "reading");
                assert_eq!(book, "12");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cli_prefs_theme_optional() {
        let cli = Cli::parse_from(["parley", "prefs", "theme"]);
        assert!(matches!(
            cli.command,
            Command::Prefs {
                action: PrefsCommand::Theme { theme: None }
            }
        ));
        let cli = Cli::parse_from(["parley", "prefs", "theme", "light"]);
        assert!(matches!(
            cli.command,
            Command::Prefs {
                action: PrefsCommand::Theme {
                    theme: Some(Theme::Light)
                }
            }
        ));
    }

    #[test]
    fn cli_notifications_switch() {
        let cli = Cli::parse_from(["parley", "prefs", "notifications", "off"]);
        assert!(matches!(
            cli.command,
            Command::Prefs {
                action: PrefsCommand::Notifications { state: Switch::Off }
            }
        ));
    }

    #[test]
    fn cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["parley", "whoami", "--log-level", "debug", "--no-color"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(cli.no_color);
    }

    #[test]
    fn settings_file_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"api": {"baseUrl": "http://example.test/api"}}"#).unwrap();
        let path = path.to_str().unwrap();

        let cli = Cli::parse_from([
            "parley",
            "--settings",
            path,
            "--log-level",
            "debug",
            "chat",
            "--transport",
            "request",
        ]);
        let settings = load_settings(&cli).unwrap();
        assert_eq!(settings.api.base_url, "http://example.test/api");
        assert_eq!(settings.transport.mode, TransportMode::Request);
        assert_eq!(settings.logging.level, parley_settings::LogLevel::Debug);
    }

    #[test]
    fn bad_log_level_is_an_error() {
        let cli = Cli::parse_from(["parley", "--log-level", "loud", "whoami"]);
        assert!(load_settings(&cli).is_err());
    }
}
