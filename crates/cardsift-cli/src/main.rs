use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cardsift_core::{AppConfig, Card, CardsiftError, ExitCode};
use cardsift_dedup::{DedupError, DedupResult, DeduplicationService, ScanOptions};

/// Resolution of the progress bar; `on_progress` fractions are scaled to it.
const PROGRESS_STEPS: u64 = 1_000;

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "cardsift",
    about = "Find duplicate and overlapping flashcards in a deck",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting CARDSIFT_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Report near-duplicate groups (word overlap and edit distance).
    Scan {
        #[arg(long)]
        deck: PathBuf,
        /// Defaults to `dedup.near_duplicate_threshold` from the config.
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Report cards that cover the same subject in different words.
    Concepts {
        #[arg(long)]
        deck: PathBuf,
        /// Defaults to `dedup.concept_threshold` from the config.
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Remove every card a scan marks for deletion.
    Prune {
        #[arg(long)]
        deck: PathBuf,
        #[arg(long, value_enum, default_value_t = Mode::Near)]
        mode: Mode,
        #[arg(long)]
        threshold: Option<f64>,
        /// Write the pruned deck here instead of overwriting `--deck`.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Report what would be removed without writing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Near,
    Concept,
}

// ─── Config Actions ──────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective config.
    Show,
    /// Print the config file location.
    Path,
    /// Write a default config file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let json_output = cli.json || std::env::var("CARDSIFT_JSON").as_deref() == Ok("1");

    if let Err(err) = run(cli, json_output).await {
        let code = exit_code_for(&err);
        if json_output {
            let body = serde_json::json!({
                "status": "error",
                "error": { "message": format!("{err:#}"), "code": code as i32 }
            });
            println!("{body:#}");
        } else {
            eprintln!("Error: {err:#}");
        }
        std::process::exit(code as i32);
    }
}

async fn run(cli: Cli, json_output: bool) -> Result<()> {
    let start = Instant::now();
    let config = AppConfig::load()?;
    init_tracing(&config.logging.level);
    debug!("config loaded from {}", AppConfig::config_path().display());

    match cli.command {
        Commands::Scan { deck, threshold } => {
            let threshold = threshold.unwrap_or(config.dedup.near_duplicate_threshold);
            let cards = cardsift_core::load_deck(&deck)?;
            let result = detect(&config, &cards, Mode::Near, threshold, json_output).await?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "deck": deck, "threshold": threshold, "result": result },
                    "meta": { "duration_ms": dur, "cards": cards.len() }
                }))?;
            } else {
                print_groups(&result, cards.len());
            }
        }

        Commands::Concepts { deck, threshold } => {
            let threshold = threshold.unwrap_or(config.dedup.concept_threshold);
            let cards = cardsift_core::load_deck(&deck)?;
            let result = detect(&config, &cards, Mode::Concept, threshold, json_output).await?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "deck": deck, "threshold": threshold, "result": result },
                    "meta": { "duration_ms": dur, "cards": cards.len() }
                }))?;
            } else {
                print_groups(&result, cards.len());
            }
        }

        Commands::Prune { deck, mode, threshold, output, dry_run } => {
            let threshold = threshold.unwrap_or(match mode {
                Mode::Near => config.dedup.near_duplicate_threshold,
                Mode::Concept => config.dedup.concept_threshold,
            });
            let cards = cardsift_core::load_deck(&deck)?;
            let total = cards.len();
            let result = detect(&config, &cards, mode, threshold, json_output).await?;

            let (pruned, removed) = cardsift_core::remove_cards(cards, result.delete_ids());
            let target = output.unwrap_or_else(|| deck.clone());
            if !dry_run {
                cardsift_core::save_deck(&target, &pruned)?;
                info!("wrote {} cards to {}", pruned.len(), target.display());
            }
            let dur = start.elapsed().as_millis();

            if json_output {
                let removed_ids: Vec<&str> = result.delete_ids().collect();
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "removed": removed_ids,
                        "remaining": pruned.len(),
                        "output": target,
                        "dry_run": dry_run,
                    },
                    "meta": { "duration_ms": dur, "cards": total }
                }))?;
            } else if removed == 0 {
                println!("Nothing to prune in {}.", deck.display());
            } else if dry_run {
                println!("Would remove {removed} of {total} cards:");
                for card in &result.delete {
                    println!("  {}  {}", card.id, preview(&card.question));
                }
            } else {
                println!(
                    "Removed {removed} of {total} cards, {} left in {}.",
                    pruned.len(),
                    target.display()
                );
            }
        }

        // ── Config ─────────────────────────────────────────────────────────
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":config}))?;
                } else {
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }

            ConfigAction::Path => {
                let path = AppConfig::config_path();
                if json_output {
                    print_json(&serde_json::json!({
                        "status": "ok",
                        "data": { "path": path, "exists": path.exists() }
                    }))?;
                } else {
                    println!("{}", path.display());
                }
            }

            ConfigAction::Init { force } => {
                let path = AppConfig::config_path();
                if path.exists() && !force {
                    return Err(CardsiftError::ValidationError(format!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    ))
                    .into());
                }
                AppConfig::default().save()?;
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":{"path":path}}))?;
                } else {
                    println!("Wrote default config to {}", path.display());
                }
            }
        },
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn detect(
    config: &AppConfig,
    cards: &[Card],
    mode: Mode,
    threshold: f64,
    json_output: bool,
) -> Result<DedupResult> {
    let service = DeduplicationService::with_options(ScanOptions::from(&config.dedup));
    debug!(
        "{} cards, batch size {}, yielding {}",
        cards.len(),
        service.options().batch_size,
        service.options().yield_to_scheduler
    );
    let bar = progress_bar(json_output)?;
    let on_progress = |fraction: f64| {
        bar.set_position((fraction * PROGRESS_STEPS as f64) as u64);
    };

    let result = match mode {
        Mode::Near => service.find_near_duplicates(cards, threshold, on_progress).await,
        Mode::Concept => service.find_conceptually_similar(cards, threshold, on_progress).await,
    };
    bar.finish_and_clear();
    Ok(result?)
}

fn progress_bar(hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new(PROGRESS_STEPS);
    bar.set_style(ProgressStyle::with_template("{bar:40.cyan/blue} {percent:>3}% {elapsed}")?);
    Ok(bar)
}

fn print_groups(result: &DedupResult, total: usize) {
    if result.is_empty() {
        println!("No duplicate groups among {total} cards.");
        return;
    }

    for (n, (group, kept)) in result.groups.iter().zip(&result.keep).enumerate() {
        println!("Group {} ({} cards)", n + 1, group.members.len());
        for member in &group.members {
            let marker = if member.card.id == kept.id { "keep  " } else { "delete" };
            match member.similarity_to_seed {
                Some(similarity) => println!(
                    "  {marker}  {similarity:.2}  {}  {}",
                    member.card.id,
                    preview(&member.card.question)
                ),
                None => println!(
                    "  {marker}  {}  {}",
                    member.card.id,
                    preview(&member.card.question)
                ),
            }
        }
    }
    println!(
        "\n{} groups: keep {}, delete {} of {total} cards",
        result.groups.len(),
        result.keep.len(),
        result.delete.len()
    );
}

fn preview(text: &str) -> String {
    const MAX: usize = 60;
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX {
        flat
    } else {
        let cut: String = flat.chars().take(MAX - 1).collect();
        format!("{cut}…")
    }
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if let Some(err) = err.downcast_ref::<CardsiftError>() {
        return err.exit_code();
    }
    match err.downcast_ref::<DedupError>() {
        Some(DedupError::InvalidThreshold(_) | DedupError::InvalidOptions(_)) => {
            ExitCode::InvalidArgs
        }
        _ => ExitCode::GeneralError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_exit_codes() {
        let missing = anyhow::Error::from(CardsiftError::DeckNotFound("deck.json".into()));
        assert_eq!(exit_code_for(&missing), ExitCode::NotFound);

        let threshold = anyhow::Error::from(DedupError::InvalidThreshold(2.0));
        assert_eq!(exit_code_for(&threshold), ExitCode::InvalidArgs);

        let other = anyhow::anyhow!("boom");
        assert_eq!(exit_code_for(&other), ExitCode::GeneralError);
    }

    #[test]
    fn preview_flattens_and_truncates() {
        assert_eq!(preview("What is\n  ATP?"), "What is ATP?");
        let long = "word ".repeat(30);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), 60);
        assert!(shown.ends_with('…'));
    }

    #[test]
    fn cli_parses_prune_flags() {
        let cli = Cli::try_parse_from([
            "cardsift", "--json", "prune", "--deck", "d.json", "--mode", "concept", "--dry-run",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Prune { mode, dry_run, output, .. } => {
                assert_eq!(mode, Mode::Concept);
                assert!(dry_run);
                assert!(output.is_none());
            }
            _ => panic!("expected prune"),
        }
    }
}
