//! CLI for knobel.
//!
//! Runs decision rounds (yes/no, die, custom lists, AI-weighted yes/no) and
//! manages the saved lists and the decision history. The data files share
//! their shape with the legacy client storage, so they are interchangeable.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use knobel_client::{describe, WeightsClient};
use knobel_core::storage::{HistoryStore, ListStore, SavedList};
use knobel_core::{ChoiceSet, DecisionMode, HistoryEntry};
use knobel_engine::{pick_uniform, pick_weighted, suspense_duration, DecisionSession};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about = "Decisiones rápidas: sí/no, dado o listas propias", long_about = None)]
struct Cli {
    /// Path to the saved lists file
    #[arg(long, global = true, default_value = "data/customLists.json")]
    lists_file: PathBuf,

    /// Path to the decision history file
    #[arg(long, global = true, default_value = "data/decisionHistory.json")]
    history_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one decision round
    Decide {
        /// binary, binary-ai, dice, or a saved list id
        #[arg(long, default_value = "binary")]
        mode: String,

        /// Route the round through the AI weighting (implied by binary-ai)
        #[arg(long)]
        ai: bool,

        /// Question for the AI weighting
        #[arg(long)]
        question: Option<String>,

        /// Base URL of the scoring service
        #[arg(long, default_value = "http://127.0.0.1:8787")]
        api_base: String,

        /// Fixed RNG seed for reproducible draws
        #[arg(long)]
        seed: Option<u64>,

        /// Skip the suspense pause before the result
        #[arg(long)]
        no_wait: bool,
    },
    /// Manage saved lists
    List {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Inspect or prune the decision history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum ListAction {
    /// Save a new list (2-12 items)
    Add {
        name: String,
        #[arg(num_args = 2..)]
        items: Vec<String>,
    },
    /// Delete a list by id
    Remove { id: String },
    /// Show all saved lists
    Show,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Show the history, newest first
    Show,
    /// Delete one entry by id
    Delete { id: String },
    /// Delete the whole history
    Clear,
}

/// Resolves a mode to its candidates; list modes also yield the list name
/// for the history label.
fn resolve_choices(mode: &DecisionMode, lists: &ListStore) -> Result<(ChoiceSet, Option<String>)> {
    match mode {
        DecisionMode::Binary | DecisionMode::BinaryAi => Ok((ChoiceSet::binary(), None)),
        DecisionMode::Dice => Ok((ChoiceSet::dice(), None)),
        DecisionMode::List(id) => {
            let list = lists
                .find(id)?
                .with_context(|| format!("no saved list with id {id}"))?;
            let set = ChoiceSet::from_items(&list.items)
                .with_context(|| format!("saved list {id} is not usable"))?;
            Ok((set, Some(list.name)))
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn decide(
    lists_file: &Path,
    history_file: &Path,
    mode: String,
    ai: bool,
    question: Option<String>,
    api_base: String,
    seed: Option<u64>,
    no_wait: bool,
) -> Result<()> {
    let mode = DecisionMode::parse(&mode);
    let lists = ListStore::new(lists_file);
    let (choices, list_name) = resolve_choices(&mode, &lists)?;
    let weighted = ai || mode == DecisionMode::BinaryAi;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut session = DecisionSession::new(mode.clone());
    session.begin().context("round already in flight")?;

    let picked = if weighted {
        let question = question
            .as_deref()
            .context("--question is required for AI-weighted rounds")?;
        let client = WeightsClient::new(&api_base)?;
        let scoring = match client.request_scores(question, &choices).await {
            Ok(scoring) => scoring,
            Err(err) => {
                session.finish();
                bail!("{}", describe(&err.code()));
            }
        };
        println!("IA: {}", scoring.reason);
        match pick_weighted(&scoring.scores, &mut rng) {
            Some(id) => id,
            None => {
                session.finish();
                bail!("la IA no devolvió una ponderación utilizable");
            }
        }
    } else {
        if !no_wait {
            std::thread::sleep(suspense_duration(&mut rng));
        }
        pick_uniform(&choices, &mut rng).id.clone()
    };
    session.finish();

    let label = choices
        .label_of(&picked)
        .unwrap_or(picked.as_str())
        .to_string();
    println!("{label}");

    // Only AI rounds carry a question into the record.
    let recorded_question = if weighted { question } else { None };
    let entry = HistoryEntry::now(
        mode.label(list_name.as_deref()),
        label,
        recorded_question,
        &mut rng,
    );
    HistoryStore::new(history_file)
        .append(entry)
        .context("failed to record the decision")?;
    Ok(())
}

fn run_list(lists_file: &Path, action: ListAction) -> Result<()> {
    let lists = ListStore::new(lists_file);
    match action {
        ListAction::Add { name, items } => {
            // Same bounds the decision round will enforce later.
            ChoiceSet::from_items(&items).context("list is not usable for decisions")?;
            let name = name.trim().to_string();
            if name.is_empty() {
                bail!("list name must not be empty");
            }
            let saved = lists.save(SavedList {
                id: String::new(),
                name,
                items,
            })?;
            println!("saved list {} ({})", saved.id, saved.name);
        }
        ListAction::Remove { id } => {
            if lists.delete(&id)? {
                println!("removed list {id}");
            } else {
                bail!("no saved list with id {id}");
            }
        }
        ListAction::Show => {
            for list in lists.all()? {
                println!("{}  {} ({} items)", list.id, list.name, list.items.len());
                for item in &list.items {
                    println!("    - {item}");
                }
            }
        }
    }
    Ok(())
}

fn run_history(history_file: &Path, action: HistoryAction) -> Result<()> {
    let history = HistoryStore::new(history_file);
    match action {
        HistoryAction::Show => {
            for entry in history.all()? {
                match &entry.question {
                    Some(question) => println!(
                        "{}  [{}] {}  «{}»  ({})",
                        entry.timestamp, entry.kind, entry.result, question, entry.id
                    ),
                    None => println!(
                        "{}  [{}] {}  ({})",
                        entry.timestamp, entry.kind, entry.result, entry.id
                    ),
                }
            }
        }
        HistoryAction::Delete { id } => {
            if history.delete(&id)? {
                println!("deleted entry {id}");
            } else {
                bail!("no history entry with id {id}");
            }
        }
        HistoryAction::Clear => {
            history.clear()?;
            println!("history cleared");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let lists_file = cli.lists_file;
    let history_file = cli.history_file;

    match cli.command {
        Commands::Decide {
            mode,
            ai,
            question,
            api_base,
            seed,
            no_wait,
        } => {
            decide(
                &lists_file,
                &history_file,
                mode,
                ai,
                question,
                api_base,
                seed,
                no_wait,
            )
            .await
        }
        Commands::List { action } => run_list(&lists_file, action),
        Commands::History { action } => run_history(&history_file, action),
    }
}
