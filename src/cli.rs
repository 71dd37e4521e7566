//! CLI interface for axioms

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;

use crate::assistant::{credentials, AssistantSession, GeminiClient, SendOutcome};
use crate::chat::{self, ChatOptions};
use crate::config::{self, Config};
use crate::dashboard::{DashboardSummary, JournalOrder};
use crate::progress::{FileKeyValueStore, ProgressStore};
use crate::types::ModelTier;
use crate::unlock;
use crate::view;

#[derive(Parser)]
#[command(name = "axioms")]
#[command(about = "Study the Axioms of Being: levels, notes, insights and a mentor to talk with", long_about = None)]
#[command(version)]
struct Cli {
    /// Gemini API key for this run (takes precedence over the stored key and the environment)
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List levels with their lock state (default)
    Levels,
    /// Show the axioms of a level
    Level {
        /// Level number or code (e.g. 3 or III)
        level: String,
    },
    /// Show an axiom with its explanation, practice, note and insights
    Show {
        /// Axiom id (e.g. A7)
        axiom: String,
    },
    /// Toggle the studied flag of an axiom
    Study { axiom: String },
    /// Replace the note of an axiom (no text clears it)
    Note {
        axiom: String,
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Add a dated insight to an axiom
    Insight {
        axiom: String,
        #[arg(trailing_var_arg = true, required = true)]
        text: Vec<String>,
    },
    /// Overall progress, level map and journal
    Dashboard {
        /// Newest journal entries first
        #[arg(short, long)]
        reverse: bool,
    },
    /// Ask the mentor a single question
    Ask {
        /// Message; defaults to the contemplation prompt when --axiom is given
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
        /// Use the deep (pro) model
        #[arg(long)]
        deep: bool,
        /// Axiom to contemplate
        #[arg(short, long)]
        axiom: Option<String>,
    },
    /// Open an interactive chat with the mentor
    Chat {
        /// Start on the deep (pro) model
        #[arg(long)]
        deep: bool,
        /// Pre-fill a contemplation prompt for this axiom
        #[arg(short, long)]
        axiom: Option<String>,
    },
    /// Configure axioms
    Config {
        /// Store a Gemini API key in the keyring
        #[arg(long)]
        set_api_key: Option<String>,
        /// Remove the stored API key
        #[arg(long)]
        clear_api_key: bool,
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Set the model for a tier (usage: --set-model flash|pro model_id)
        #[arg(long, value_names = &["tier", "model"], num_args = 2)]
        set_model: Option<Vec<String>>,
        /// Retry once on the other tier after a connection or provider error
        #[arg(long, value_enum)]
        fallback: Option<Toggle>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Levels) => {
            let (_, store) = open_store()?;
            print!("{}", view::render_levels(store.curriculum(), store.progress()));
        }
        Some(Commands::Level { level }) => {
            let (_, store) = open_store()?;
            let index = view::open_level(store.curriculum(), store.progress(), &level)?;
            print!("{}", view::render_level(store.curriculum(), store.progress(), index));
        }
        Some(Commands::Show { axiom }) => {
            let (_, store) = open_store()?;
            let axiom = view::open_axiom(store.curriculum(), store.progress(), &axiom)?;
            print!("{}", view::render_axiom(axiom, store.progress()));
        }
        Some(Commands::Study { axiom }) => {
            let (_, mut store) = open_store()?;
            toggle_studied(&mut store, &axiom)?;
        }
        Some(Commands::Note { axiom, text }) => {
            let (_, mut store) = open_store()?;
            let id = view::open_axiom(store.curriculum(), store.progress(), &axiom)?.id.clone();
            let text = text.join(" ");
            store.update_note(&id, &text)?;
            if text.is_empty() {
                println!("Note for {} cleared.", id);
            } else {
                println!("Note for {} saved.", id);
            }
        }
        Some(Commands::Insight { axiom, text }) => {
            let (_, mut store) = open_store()?;
            let id = view::open_axiom(store.curriculum(), store.progress(), &axiom)?.id.clone();
            if store.add_insight(&id, &text.join(" "))? {
                println!("Insight added to {}.", id);
            } else {
                println!("Nothing to add: the insight is empty.");
            }
        }
        Some(Commands::Dashboard { reverse }) => {
            let (_, store) = open_store()?;
            let order = if reverse { JournalOrder::Reverse } else { JournalOrder::Chronological };
            let summary = DashboardSummary::compute(store.curriculum(), store.progress(), order);
            print!("{}", view::render_dashboard(&summary));
        }
        Some(Commands::Ask { message, deep, axiom }) => {
            let (config, store) = open_store()?;
            let tier = if deep { ModelTier::Deep } else { config.assistant.default_tier };
            ask(&config, &store, cli.api_key, tier, message.join(" "), axiom).await?;
        }
        Some(Commands::Chat { deep, axiom }) => {
            let (config, store) = open_store()?;
            let tier = if deep { ModelTier::Deep } else { config.assistant.default_tier };
            let options = ChatOptions {
                api_key: cli.api_key,
                tier,
                focus: axiom,
            };
            chat::run_chat(&config, store.curriculum_arc(), store.progress(), options).await?;
        }
        Some(Commands::Config { set_api_key, clear_api_key, show, set_model, fallback }) => {
            if let Some(key) = set_api_key {
                config::set_api_key(&key)?;
            } else if clear_api_key {
                config::clear_api_key()?;
            } else if let Some(args) = set_model {
                match args.as_slice() {
                    [tier, model] => config::set_model(tier, model)?,
                    _ => anyhow::bail!("Usage: axioms config --set-model <flash|pro> <model>"),
                }
            } else if let Some(toggle) = fallback {
                config::set_fallback(matches!(toggle, Toggle::On))?;
            } else if show {
                config::show_config()?;
            } else {
                println!("Nothing to change. Options:");
                println!("  --show                       Show current configuration");
                println!("  --set-api-key <KEY>          Store a Gemini API key");
                println!("  --clear-api-key              Remove the stored key");
                println!("  --set-model <tier> <model>   Set the model for flash or pro");
                println!("  --fallback <on|off>          Retry once on the other tier");
            }
        }
    }

    Ok(())
}

/// Load config, curriculum and persisted progress
fn open_store() -> Result<(Config, ProgressStore)> {
    let config = Config::load()?;
    let curriculum = Arc::new(config.curriculum.load()?);

    let kv = match &config.storage.data_dir {
        Some(dir) => FileKeyValueStore::new(dir.clone())?,
        None => FileKeyValueStore::default_store()?,
    };
    let mut store = ProgressStore::open(curriculum, kv, &config.storage.progress_key);
    store.set_date_format(&config.display.date_format);
    Ok((config, store))
}

fn toggle_studied(store: &mut ProgressStore, query: &str) -> Result<()> {
    let axiom = view::open_axiom(store.curriculum(), store.progress(), query)?;
    let id = axiom.id.clone();
    let loc = store
        .curriculum()
        .locate(&id)
        .with_context(|| format!("Axiom {} is not in the curriculum", id))?;

    let studied = store.toggle_studied(&id)?;
    if !studied {
        println!("{} is no longer marked as studied.", id);
        return Ok(());
    }
    println!("{} marked as studied.", id);

    let curriculum = store.curriculum();
    let progress = store.progress();
    let level = &curriculum.levels()[loc.level_index];
    if let Some(next) = level.axioms.get(loc.axiom_index + 1) {
        if !unlock::is_axiom_locked(level, progress, loc.axiom_index + 1) && !progress.is_studied(&next.id) {
            println!("Next: {} {}", next.id, next.title);
        }
    } else if unlock::is_level_complete(level, progress) {
        if let Some(next_level) = curriculum.level(loc.level_index + 1) {
            println!(
                "Level {} complete. Level {} ({}) is now open.",
                level.code, next_level.code, next_level.name
            );
        } else {
            println!("Level {} complete. The whole path is walked.", level.code);
        }
    }
    Ok(())
}

async fn ask(
    config: &Config,
    store: &ProgressStore,
    api_key: Option<String>,
    tier: ModelTier,
    message: String,
    axiom: Option<String>,
) -> Result<()> {
    let resolution = credentials::resolve(api_key);
    let client = GeminiClient::new(&config.assistant, resolution.credential().map(|c| c.value.clone()))?;
    let mut session = AssistantSession::new(Box::new(client), store.curriculum_arc())
        .with_tier(tier)
        .with_fallback(config.assistant.fallback_to_other_tier)
        .with_credential_present(resolution.is_configured());

    let mut text = message;
    if let Some(query) = axiom {
        let axiom = view::open_axiom(store.curriculum(), store.progress(), &query)?;
        let prompt = session
            .focus(&axiom.id)
            .with_context(|| format!("Unknown axiom {}", axiom.id))?;
        if text.trim().is_empty() {
            text = prompt;
        }
    }
    if text.trim().is_empty() {
        anyhow::bail!("Nothing to ask: give a message or --axiom <id>");
    }

    if let SendOutcome::Failed(err) = chat::send_and_print(&mut session, &text).await {
        tracing::debug!("Assistant turn failed: {}", err);
    }
    Ok(())
}
