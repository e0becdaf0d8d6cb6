use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use libris_core::{
    AppConfig, Author, Book, BookStore, Database, EntityStore, Locale, Mergeable, Publisher,
    Series, TocEntry, prune,
};
use libris_sync::{
    CoverDirectory, ProcessOutcome, PseudonymTable, ResolveOutcome, SyncAction, SyncProcessor,
    resolve_authors,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "libris",
    about = "Reconcile book metadata: de-duplicate entities and merge fetched records",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format.
    /// Also enabled by setting LIBRIS_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    /// Locale used for name comparison (defaults to the configured one).
    #[arg(long, global = true)]
    locale: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// De-duplicate a JSON list of entities.
    Prune {
        kind: EntityKind,
        file: PathBuf,
        /// Skip id lookups against the database.
        #[arg(long)]
        batch: bool,
    },

    /// Merge an incoming record into a book using the configured field actions.
    Merge {
        /// Existing book, as JSON.
        #[arg(long)]
        book: PathBuf,
        /// Incoming partial record, as JSON.
        #[arg(long)]
        incoming: PathBuf,
        /// Write to the configured database and cover directory instead of a
        /// scratch copy. Covers are ignored without it.
        #[arg(long)]
        commit: bool,
    },

    /// Per-field sync actions.
    Fields {
        #[command(subcommand)]
        action: FieldsAction,
    },

    /// Attach real authors to pen names from the `[pseudonyms]` table.
    Resolve { file: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum EntityKind {
    Authors,
    Series,
    Publishers,
    Toc,
}

// ─── Fields Actions ──────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum FieldsAction {
    /// Show every field with its current action.
    List,
    /// Set the action of one field, or of all with `--all`.
    Set {
        key: Option<String>,
        action: String,
        #[arg(long)]
        all: bool,
    },
    /// Restore default actions.
    Reset { key: Option<String> },
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let json_output = cli.json || std::env::var("LIBRIS_JSON").as_deref() == Ok("1");
    let config = AppConfig::load()?;
    let locale = cli
        .locale
        .as_deref()
        .map(Locale::from)
        .unwrap_or_else(|| config.locale().clone());
    debug!(locale = %locale, config = %AppConfig::config_path().display(), "starting");

    match cli.command {
        Commands::Prune { kind, file, batch } => {
            let db = if batch { None } else { Some(open_db(&config)?) };
            match kind {
                EntityKind::Authors => prune_file::<Author>(&file, db.as_ref(), &locale, json_output)?,
                EntityKind::Series => prune_file::<Series>(&file, db.as_ref(), &locale, json_output)?,
                EntityKind::Publishers => {
                    prune_file::<Publisher>(&file, db.as_ref(), &locale, json_output)?
                }
                EntityKind::Toc => prune_file::<TocEntry>(&file, db.as_ref(), &locale, json_output)?,
            }
        }

        Commands::Merge { book, incoming, commit } => {
            let existing: Book = read_json(&book)?;
            let incoming: Book = read_json(&incoming)?;
            let db = if commit {
                open_db(&config)?
            } else {
                Database::open_in_memory()?
            };

            let book_id = if commit {
                if existing.id == 0 {
                    bail!("--commit needs a book with a stored id");
                }
                existing.id
            } else {
                db.insert_book(&existing, &locale)?
            };
            let existing = db
                .get_book(book_id)
                .with_context(|| format!("book {book_id} not found"))?;

            let covers = commit.then(|| CoverDirectory::new(config.covers_dir()));
            let processor = build_processor(&config, locale.clone(), covers);
            let needed = processor.filter(&existing);
            debug!(fields = ?needed.keys().collect::<Vec<_>>(), "fields needed");

            match processor.process_one(&db, book_id, &existing, &needed, incoming) {
                ProcessOutcome::Failed => bail!("merge of book {book_id} could not be committed"),
                ProcessOutcome::Unchanged => info!(book_id, "nothing to merge"),
                ProcessOutcome::Committed(delta) => info!(book_id, fields = ?delta.keys(), "merged"),
            }

            let merged = db.get_book(book_id)?;
            if json_output {
                print_json(&serde_json::json!({"status": "ok", "data": merged}))?;
            } else {
                println!("{}", serde_json::to_string_pretty(&merged)?);
            }
        }

        Commands::Fields { action } => run_fields(action, config, locale, json_output)?,

        Commands::Resolve { file } => {
            let mut authors: Vec<Author> = read_json(&file)?;
            let table = PseudonymTable::from_names(locale, &config.pseudonyms);
            let cancel = Arc::new(AtomicBool::new(false));

            let runtime = tokio::runtime::Runtime::new()?;
            let outcome = runtime.block_on(async {
                let flag = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        flag.store(true, Ordering::Relaxed);
                    }
                });
                resolve_authors(&table, &mut authors, &cancel).await
            })?;

            match outcome {
                ResolveOutcome::Cancelled => bail!("cancelled, nothing resolved"),
                ResolveOutcome::Completed { modified } => {
                    if json_output {
                        print_json(&serde_json::json!({
                            "status": "ok",
                            "data": { "items": authors, "modified": modified }
                        }))?;
                    } else {
                        for author in &authors {
                            match &author.real_author {
                                Some(real) => println!(
                                    "{author}  →  {}",
                                    real.to_author().formatted_name()
                                ),
                                None => println!("{author}"),
                            }
                        }
                        println!("\n{modified} pen names resolved");
                    }
                }
            }
        }
    }

    Ok(())
}

fn run_fields(action: FieldsAction, mut config: AppConfig, locale: Locale, json_output: bool) -> Result<()> {
    let mut processor = build_processor(&config, locale, None);

    match action {
        FieldsAction::List => {}
        FieldsAction::Set { key, action, all } => {
            let action: SyncAction = action.parse()?;
            match (key, all) {
                (_, true) => processor.set_all(action),
                (Some(key), false) => {
                    if !processor.set_action(&key, action) {
                        bail!("unknown field: {key}");
                    }
                }
                (None, false) => bail!("give a field key or --all"),
            }
            save_fields(&mut config, &processor)?;
        }
        FieldsAction::Reset { key: None } => {
            processor.reset_to_defaults();
            save_fields(&mut config, &processor)?;
        }
        FieldsAction::Reset { key: Some(key) } => {
            let Some(default) = processor.field(&key).map(|field| field.default_action()) else {
                bail!("unknown field: {key}");
            };
            processor.set_action(&key, default);
            save_fields(&mut config, &processor)?;
        }
    }

    if json_output {
        print_json(&serde_json::json!({"status": "ok", "data": processor.fields()}))?;
    } else {
        for field in processor.fields() {
            println!(
                "{key:<24} {label:<20} {action}",
                key = field.key,
                label = field.label,
                action = field.action().label()
            );
        }
    }
    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn build_processor(config: &AppConfig, locale: Locale, covers: Option<CoverDirectory>) -> SyncProcessor {
    let mut builder = SyncProcessor::defaults(locale);
    if let Some(covers) = covers {
        builder = builder.with_covers(covers);
    }
    let mut processor = builder.build();
    processor.apply_config(&config.sync);
    processor
}

fn save_fields(config: &mut AppConfig, processor: &SyncProcessor) -> Result<()> {
    config.sync = processor.to_config();
    config.save()?;
    info!(path = %AppConfig::config_path().display(), "field actions saved");
    Ok(())
}

fn prune_file<T>(file: &Path, db: Option<&Database>, locale: &Locale, json_output: bool) -> Result<()>
where
    T: Mergeable + Serialize + DeserializeOwned,
    Database: EntityStore<T>,
{
    let mut list: Vec<T> = read_json(file)?;
    let before = list.len();
    let modified = match db {
        Some(db) => db.prune_list(&mut list, false, locale)?,
        None => prune(&mut list, locale),
    };
    info!(kind = T::KIND, before, after = list.len(), modified, "pruned");

    if json_output {
        print_json(&serde_json::json!({
            "status": "ok",
            "data": { "items": list, "modified": modified }
        }))?;
    } else {
        println!("{}", serde_json::to_string_pretty(&list)?);
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn open_db(config: &AppConfig) -> Result<Database> {
    let db_path = config.database_path();
    Database::open(&db_path).with_context(|| format!("opening {}", db_path.display()))
}
