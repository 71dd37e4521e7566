//! Interactive mentor chat
//!
//! A rustyline loop around `AssistantSession` with slash commands for
//! switching tiers, clearing the history and focusing an axiom.

use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor, Stylize},
};
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::Helper;
use std::borrow::Cow;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::assistant::credentials::{self, CredentialResolution};
use crate::assistant::prompt;
use crate::assistant::{AssistantSession, GeminiClient, SendOutcome};
use crate::config::Config;
use crate::curriculum::Curriculum;
use crate::progress::Progress;
use crate::types::ModelTier;
use crate::view;

const COMMANDS: &[(&str, &str)] = &[
    ("/flash", "Switch to the fast model"),
    ("/pro", "Switch to the deep model"),
    ("/reset", "Clear the conversation"),
    ("/focus", "Contemplate an axiom: /focus <id>"),
    ("/key", "Select an API key: /key [value]"),
    ("/help", "Show commands"),
    ("/exit", "Leave the chat"),
];

/// A parsed line of chat input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Send(String),
    SetTier(ModelTier),
    Reset,
    Focus(String),
    Key(Option<String>),
    Help,
    Exit,
    Unknown(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if !line.starts_with('/') {
            return ChatCommand::Send(line.to_string());
        }

        let (cmd, arg) = match line.split_once(char::is_whitespace) {
            Some((cmd, arg)) => (cmd, arg.trim()),
            None => (line, ""),
        };
        let arg = (!arg.is_empty()).then(|| arg.to_string());

        match cmd.to_lowercase().as_str() {
            "/flash" => ChatCommand::SetTier(ModelTier::Fast),
            "/pro" => ChatCommand::SetTier(ModelTier::Deep),
            "/reset" | "/clear" => ChatCommand::Reset,
            "/focus" => match arg {
                Some(id) => ChatCommand::Focus(id),
                None => ChatCommand::Unknown(line.to_string()),
            },
            "/key" => ChatCommand::Key(arg),
            "/help" | "/?" => ChatCommand::Help,
            "/exit" | "/quit" => ChatCommand::Exit,
            _ => ChatCommand::Unknown(line.to_string()),
        }
    }
}

struct ChatHelper {
    commands: Vec<&'static str>,
    /// Hide typed characters while reading a secret
    masking: bool,
}

impl ChatHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|(c, _)| *c).collect(),
            masking: false,
        }
    }
}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let partial = &line[..pos];
        if !partial.starts_with('/') {
            return Ok((pos, Vec::new()));
        }
        let matches = self
            .commands
            .iter()
            .filter(|c| c.starts_with(partial))
            .map(|c| Pair {
                display: c.to_string(),
                replacement: c[partial.len()..].to_string(),
            })
            .collect();
        Ok((pos, matches))
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if self.masking || !line.starts_with('/') || pos < line.len() {
            return None;
        }
        self.commands
            .iter()
            .find(|c| c.starts_with(line) && **c != line)
            .map(|c| c[line.len()..].to_string())
    }
}

impl Validator for ChatHelper {
    fn validate(&self, _ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

impl Highlighter for ChatHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if self.masking {
            Cow::Owned("*".repeat(line.chars().count()))
        } else {
            Cow::Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, kind: CmdKind) -> bool {
        self.masking && kind != CmdKind::MoveCursor
    }
}

impl Helper for ChatHelper {}

fn print_colored(color: Color, text: &str) {
    let _ = execute!(
        io::stdout(),
        SetForegroundColor(color),
        Print(text),
        Print("\n"),
        ResetColor
    );
}

fn print_help() {
    println!();
    for (cmd, desc) in COMMANDS {
        println!("  {} {}", format!("{:<8}", cmd).cyan(), desc);
    }
    println!();
}

/// Lines that go into the editor history; key material never does
fn keeps_in_history(line: &str) -> bool {
    !line.is_empty() && !matches!(ChatCommand::parse(line), ChatCommand::Key(_))
}

type ChatEditor = rustyline::Editor<ChatHelper, rustyline::history::DefaultHistory>;

/// Read a line with the input masked
fn read_secret(rl: &mut ChatEditor, prompt_text: &str) -> rustyline::Result<String> {
    if let Some(helper) = rl.helper_mut() {
        helper.masking = true;
    }
    let result = rl.readline(prompt_text);
    if let Some(helper) = rl.helper_mut() {
        helper.masking = false;
    }
    result
}

fn thinking_spinner(tier: ModelTier) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner:.dim} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    let verb = match tier {
        ModelTier::Fast => "Listening",
        ModelTier::Deep => "Contemplating deeply",
    };
    pb.set_message(format!("{}...", verb));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn build_client(config: &Config, key: Option<String>) -> Result<GeminiClient> {
    GeminiClient::new(&config.assistant, key)
}

/// Send one message and print whatever the session appended
pub async fn send_and_print(session: &mut AssistantSession, text: &str) -> SendOutcome {
    let before = session.messages().len();
    let spinner = thinking_spinner(session.tier());
    let outcome = session.send(text).await;
    spinner.finish_and_clear();

    // The user's own line is already on screen
    for message in session.messages().iter().skip(before) {
        if message.role == crate::types::Role::User {
            continue;
        }
        print!("{}", view::render_message(message));
        println!();
    }
    outcome
}

fn select_key(
    session: &mut AssistantSession,
    config: &Config,
    value: Option<String>,
    rl: &mut ChatEditor,
) -> Result<()> {
    let value = match value {
        Some(v) => v,
        None => read_secret(rl, "API key: ")?,
    };
    let value = value.trim().to_string();
    if let Err(e) = credentials::validate(&value) {
        print_colored(Color::Yellow, &e.remediation());
        return Ok(());
    }
    credentials::set_api_key(&value)?;
    session.credential_selected(Box::new(build_client(config, Some(value))?));
    if let Some(last) = session.messages().last() {
        print!("{}", view::render_message(last));
    }
    Ok(())
}

pub struct ChatOptions {
    pub api_key: Option<String>,
    pub tier: ModelTier,
    pub focus: Option<String>,
}

pub async fn run_chat(
    config: &Config,
    curriculum: Arc<Curriculum>,
    progress: &Progress,
    options: ChatOptions,
) -> Result<()> {
    let resolution = credentials::resolve(options.api_key);
    if let CredentialResolution::Configured(c) = &resolution {
        tracing::debug!("Chat using key from {}", c.source);
    }
    let key = resolution.credential().map(|c| c.value.clone());
    let client = build_client(config, key)?;

    let mut session = AssistantSession::new(Box::new(client), Arc::clone(&curriculum))
        .with_tier(options.tier)
        .with_fallback(config.assistant.fallback_to_other_tier)
        .with_credential_present(resolution.is_configured());

    println!();
    print_colored(Color::Cyan, "  AXIOMS OF BEING  mentor");
    println!(
        "  model: {} ({})   /help for commands",
        config.assistant.model(session.tier()),
        session.tier()
    );
    println!();
    for message in session.messages() {
        print!("{}", view::render_message(message));
    }
    if !session.credential_present() {
        print_colored(Color::Yellow, &format!("  {} Type /key to select one.", prompt::KEY_REQUIRED));
    }
    println!();

    let mut prefill = match options.focus {
        Some(id) => focus(&mut session, &curriculum, progress, &id),
        None => None,
    };

    let rl_config = rustyline::Config::builder()
        .completion_type(rustyline::CompletionType::List)
        .edit_mode(rustyline::EditMode::Emacs)
        .auto_add_history(false)
        .build();
    let mut rl = ChatEditor::with_config(rl_config)?;
    rl.set_helper(Some(ChatHelper::new()));

    let prompt_text = format!("{} ", "❯".green());
    loop {
        let readline = match prefill.take() {
            Some(initial) => rl.readline_with_initial(&prompt_text, (initial.as_str(), "")),
            None => rl.readline(&prompt_text),
        };

        match readline {
            Ok(line) => {
                if keeps_in_history(line.trim()) {
                    let _ = rl.add_history_entry(line.trim());
                }
                match ChatCommand::parse(&line) {
                    ChatCommand::Send(text) => {
                        if text.is_empty() {
                            continue;
                        }
                        send_and_print(&mut session, &text).await;
                    }
                    ChatCommand::SetTier(tier) => {
                        session.set_tier(tier);
                        print_colored(
                            Color::DarkGrey,
                            &format!("  model: {} ({})", config.assistant.model(tier), tier),
                        );
                    }
                    ChatCommand::Reset => {
                        session.reset();
                        for message in session.messages() {
                            print!("{}", view::render_message(message));
                        }
                    }
                    ChatCommand::Focus(id) => {
                        prefill = focus(&mut session, &curriculum, progress, &id);
                    }
                    ChatCommand::Key(value) => {
                        if let Err(e) = select_key(&mut session, config, value, &mut rl) {
                            print_colored(Color::Red, &format!("Error: {}", e));
                        }
                    }
                    ChatCommand::Help => print_help(),
                    ChatCommand::Exit => break,
                    ChatCommand::Unknown(cmd) => {
                        print_colored(Color::Yellow, &format!("Unknown command: {} (try /help)", cmd));
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => {
                print_colored(Color::Red, &format!("Error: {}", err));
                break;
            }
        }
    }

    print_colored(Color::DarkGrey, &format!("  {}", prompt::FOOTER));
    Ok(())
}

/// Focus an accessible axiom and return the text to pre-fill
fn focus(
    session: &mut AssistantSession,
    curriculum: &Curriculum,
    progress: &Progress,
    id: &str,
) -> Option<String> {
    match view::open_axiom(curriculum, progress, id) {
        Ok(axiom) => session.focus(&axiom.id),
        Err(e) => {
            print_colored(Color::Yellow, &format!("  {}", e));
            None
        }
    }
}
