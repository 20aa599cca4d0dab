use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use uplink_core::Session;
use uplink_core::agent::{AgentId, AgentStatus};
use uplink_core::conversation::{Message, MessageBody, MessageId, MessageRole};
use uplink_core::observer::SessionObserver;
use uplink_core::session::SendOutcome;
use uplink_interaction::{BackendConfig, HttpChatBackend};

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
    agent_keys: Vec<String>,
}

impl CliHelper {
    fn new(agent_keys: Vec<String>) -> Self {
        Self {
            commands: vec![
                "/agents".to_string(),
                "/focus".to_string(),
                "/regenerate".to_string(),
                "/clear".to_string(),
                "/export".to_string(),
                "/follow".to_string(),
                "/help".to_string(),
                "/quit".to_string(),
            ],
            agent_keys,
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if let Some(stub) = line.strip_prefix("/focus ") {
            let candidates: Vec<Pair> = self
                .agent_keys
                .iter()
                .filter(|key| key.starts_with(stub))
                .map(|key| Pair {
                    display: key.clone(),
                    replacement: key.clone(),
                })
                .collect();
            return Ok((line.len() - stub.len(), candidates));
        }

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Renders session state changes to the terminal.
///
/// With auto-follow off, appended messages are held instead of printed;
/// turning it back on flushes them in order.
struct TerminalRenderer {
    follow: AtomicBool,
    held: Mutex<Vec<Message>>,
}

impl TerminalRenderer {
    fn new() -> Self {
        Self {
            follow: AtomicBool::new(true),
            held: Mutex::new(Vec::new()),
        }
    }

    fn set_follow(&self, enabled: bool) {
        self.follow.store(enabled, Ordering::SeqCst);
        if enabled {
            let held = std::mem::take(&mut *self.held.lock().unwrap());
            for message in &held {
                print_message(message);
            }
        }
    }
}

impl SessionObserver for TerminalRenderer {
    fn message_appended(&self, message: &Message) {
        if self.follow.load(Ordering::SeqCst) {
            print_message(message);
        } else {
            self.held.lock().unwrap().push(message.clone());
        }
    }

    fn agent_status_changed(&self, agent: AgentId, status: AgentStatus) {
        if self.follow.load(Ordering::SeqCst) {
            let line = format!("● {} is {}", agent.profile().name, status);
            println!("{}", line.bright_black());
        }
    }
}

fn print_message(message: &Message) {
    match message.role {
        MessageRole::User => {
            if let Some(text) = message.body.as_text() {
                println!("{}", format!("> {}", text).green());
            }
        }
        MessageRole::Agent => {
            let header = match message.agent {
                Some(agent) => {
                    let profile = agent.profile();
                    format!("[{} {}]", profile.icon, profile.name)
                }
                None => "[agent]".to_string(),
            };
            println!("{}", header.bright_magenta());
            print_body(&message.body, |line| line.bright_blue().to_string());
        }
        MessageRole::System => {
            print_body(&message.body, |line| line.cyan().to_string());
        }
    }
}

fn print_body(body: &MessageBody, paint: impl Fn(&str) -> String) {
    match body {
        MessageBody::Text { text } => {
            for line in text.lines() {
                println!("{}", paint(line));
            }
        }
        MessageBody::Data { label, value } => {
            println!("{}", format!("[{}]", label).bright_magenta());
            let pretty =
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            for line in pretty.lines() {
                println!("{}", line.bright_black());
            }
        }
    }
}

/// A recognized slash command with its parsed argument.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Agents,
    Focus(Option<String>),
    Regenerate(Option<String>),
    Clear,
    Export(Option<PathBuf>),
    Follow(Option<bool>),
    Help,
    Quit,
    Unknown(String),
}

/// Parses one input line. `None` means the line is a chat message.
fn parse_command(line: &str) -> Option<Command> {
    if !line.starts_with('/') {
        return None;
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };
    let arg = (!rest.is_empty()).then(|| rest.to_string());

    let command = match name {
        "/agents" => Command::Agents,
        "/focus" => Command::Focus(arg),
        "/regenerate" => Command::Regenerate(arg),
        "/clear" => Command::Clear,
        "/export" => Command::Export(arg.map(PathBuf::from)),
        "/follow" => Command::Follow(match rest {
            "on" => Some(true),
            "off" => Some(false),
            _ => None,
        }),
        "/help" => Command::Help,
        "/quit" => Command::Quit,
        _ => Command::Unknown(name.to_string()),
    };
    Some(command)
}

fn default_export_path() -> PathBuf {
    PathBuf::from(format!(
        "chat-export-{}.json",
        chrono::Local::now().format("%Y-%m-%d")
    ))
}

const SUGGESTIONS: &[&str] = &[
    "Find next SpaceX launch",
    "Check weather at launch site",
    "Analyze launch conditions",
    "Get mission summary",
    "Show raw data",
];

fn print_help() {
    println!("{}", "Commands:".bright_black());
    let lines = [
        "/agents                list agents and their status",
        "/focus <agent>         direct questions at one agent",
        "/regenerate [id]       re-send the question behind a reply",
        "/clear                 clear the conversation",
        "/export [file]         save the conversation as JSON",
        "/follow <on|off>       toggle live printing of replies",
        "/help                  show this help",
        "/quit                  exit (also: quit, exit)",
    ];
    for line in lines {
        println!("{}", format!("  {}", line).bright_black());
    }
    println!();
    println!("{}", "Try asking:".bright_black());
    for suggestion in SUGGESTIONS {
        println!("{}", format!("  {}", suggestion).bright_black());
    }
}

async fn print_roster(session: &Session) {
    for (agent, status) in session.agents().await {
        let profile = agent.profile();
        let dot = match status {
            AgentStatus::Online => "●".green(),
            AgentStatus::Busy => "●".yellow(),
        };
        println!(
            "  {} {} {} ({}) - {}",
            dot,
            profile.icon,
            profile.name.bold(),
            agent.key(),
            profile.description.bright_black()
        );
    }
}

/// The main entry point for the uplink REPL.
///
/// Sets up a rustyline editor with slash-command completion, connects a
/// [`Session`] to the HTTP backend, and renders replies through a
/// [`TerminalRenderer`] as they are appended. Chat requests run on
/// background tasks so the prompt stays responsive while a reply is in
/// flight.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = BackendConfig::load()?;
    let backend = Arc::new(HttpChatBackend::from_config(&config));
    let renderer = Arc::new(TerminalRenderer::new());

    println!("{}", "=== Uplink ===".bright_magenta().bold());
    println!(
        "{}",
        format!("Connected to {}", backend.endpoint()).bright_black()
    );
    println!(
        "{}",
        "Type /help for commands, or 'quit' to exit.".bright_black()
    );
    println!();

    // The welcome greeting prints through the renderer as soon as the
    // session appends it
    let session = Arc::new(Session::new(backend, renderer.clone()));
    println!();
    print_roster(&session).await;
    println!();

    let agent_keys: Vec<String> = session
        .agents()
        .await
        .into_iter()
        .map(|(agent, _)| agent.key().to_string())
        .collect();

    let helper = CliHelper::new(agent_keys.clone());
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    loop {
        let prompt = match session.focused_agent().await {
            Some(agent) => format!("{} >> ", agent.key()),
            None => ">> ".to_string(),
        };

        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                let Some(command) = parse_command(trimmed) else {
                    // Chat message: dispatch without blocking the prompt.
                    // The user echo and the reply print via the renderer.
                    let session = Arc::clone(&session);
                    let text = trimmed.to_string();
                    tokio::spawn(async move {
                        if session.send(&text).await == SendOutcome::Rejected {
                            println!(
                                "{}",
                                "Still working on the previous message - give it a moment."
                                    .yellow()
                            );
                        }
                    });
                    continue;
                };

                match command {
                    Command::Agents => print_roster(&session).await,
                    Command::Focus(Some(key)) => {
                        if let Err(err) = session.focus_agent(&key).await {
                            eprintln!("{}", err.to_string().red());
                        }
                    }
                    Command::Focus(None) => {
                        println!(
                            "{}",
                            format!("Usage: /focus <agent> ({})", agent_keys.join(", "))
                                .bright_black()
                        );
                    }
                    Command::Regenerate(raw) => {
                        let id = match raw {
                            Some(text) => match text.parse::<MessageId>() {
                                Ok(id) => Some(id),
                                Err(err) => {
                                    eprintln!("{}", err.to_string().red());
                                    None
                                }
                            },
                            None => {
                                let last = session.last_message_id().await;
                                if last.is_none() {
                                    println!("{}", "Nothing to regenerate yet.".bright_black());
                                }
                                last
                            }
                        };
                        if let Some(id) = id {
                            let session = Arc::clone(&session);
                            tokio::spawn(async move {
                                match session.regenerate(id).await {
                                    Ok(SendOutcome::Rejected) => println!(
                                        "{}",
                                        "Still working on the previous message - give it a moment."
                                            .yellow()
                                    ),
                                    Ok(_) => {}
                                    Err(err) => eprintln!("{}", err.to_string().red()),
                                }
                            });
                        }
                    }
                    Command::Clear => session.clear().await,
                    Command::Export(path) => {
                        let snapshot = session.export_snapshot().await;
                        let path = path.unwrap_or_else(default_export_path);
                        let written = serde_json::to_string_pretty(&snapshot)
                            .map_err(anyhow::Error::from)
                            .and_then(|json| {
                                std::fs::write(&path, json).map_err(anyhow::Error::from)
                            });
                        match written {
                            Ok(()) => println!(
                                "{}",
                                format!(
                                    "Exported {} messages to {}",
                                    snapshot.messages.len(),
                                    path.display()
                                )
                                .bright_black()
                            ),
                            Err(err) => {
                                eprintln!("{}", format!("Export failed: {}", err).red());
                            }
                        }
                    }
                    Command::Follow(Some(enabled)) => {
                        session.set_auto_follow(enabled);
                        renderer.set_follow(enabled);
                        let notice = if enabled {
                            "Auto-follow on."
                        } else {
                            "Auto-follow off. Replies are held until you turn it back on."
                        };
                        println!("{}", notice.bright_black());
                    }
                    Command::Follow(None) => {
                        println!("{}", "Usage: /follow <on|off>".bright_black());
                    }
                    Command::Help => print_help(),
                    Command::Quit => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    Command::Unknown(name) => {
                        println!(
                            "{}",
                            format!("Unknown command: {} (try /help)", name).bright_black()
                        );
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}
