//! belstore CLI - store, reload and inspect assertion graphs

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use belstore::config::{self, BelStoreConfig};
use belstore::storage::DefinitionFile;
use belstore::ui::{self, Icons};
use belstore::{BelGraph, GraphStore, SqliteStore, StoreOutcome};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "belstore")]
#[command(version)]
#[command(about = "Relational storage for biological assertion graphs")]
#[command(long_about = r#"
belstore keeps assertion graphs in a SQLite database:
  • Whole graphs under a unique label, for exact reload
  • A normalized, deduplicated decomposition shared across graphs
  • Namespace and annotation terms resolved against imported definitions

Example usage:
  belstore init
  belstore definitions --file definitions.json
  belstore store --graph graph.json --label my-graph
  belstore load --label my-graph --output copy.json
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./belstore.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Import namespace and annotation definitions from a JSON file
    Definitions {
        /// Definition file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Store a graph (JSON) under a label
    Store {
        /// Graph file
        #[arg(short, long)]
        graph: PathBuf,

        /// Unique label for the stored graph
        #[arg(short, long)]
        label: String,

        /// Free-text description
        #[arg(long)]
        description: Option<String>,

        /// Only store the blob, skip relational extraction
        #[arg(long)]
        no_extract: bool,
    },

    /// Reload a stored graph
    Load {
        /// Label of the stored graph
        #[arg(short, long)]
        label: String,

        /// Write the graph here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List stored graphs
    List,

    /// Show row counts per table
    Stats,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cwd = std::env::current_dir()?;
    let settings = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let database = cli
        .database
        .clone()
        .unwrap_or_else(|| settings.database_path_in(&cwd));

    match cli.command {
        Commands::Init { force } => {
            let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
            let written = BelStoreConfig {
                database: Some(database.display().to_string()),
                extract_information: Some(settings.store_config().extract_information),
                warm_start_cache: Some(settings.store_config().warm_start_cache),
            };
            config::write_config(&config_path, &written, force)?;
            open_store(&database)?;

            ui::success("Initialized belstore");
            ui::summary_row("Config:", &config_path.display().to_string());
            ui::summary_row("Database:", &database.display().to_string());
        }

        Commands::Definitions { file } => {
            let definitions = DefinitionFile::from_path(&file)
                .with_context(|| format!("failed to read definitions from {}", file.display()))?;
            let mut store = open_store(&database)?;
            let import = store.import_definitions(&definitions)?;

            ui::header(Icons::BOOK, &format!("Imported {}", file.display()));
            ui::summary_row("Definitions in file:", &definitions.definitions.len().to_string());
            ui::summary_row("New definitions:", &import.definitions_created.to_string());
            ui::summary_row("New terms:", &import.terms_created.to_string());
        }

        Commands::Store {
            graph,
            label,
            description,
            no_extract,
        } => {
            let bytes = std::fs::read(&graph).with_context(|| format!("failed to read {}", graph.display()))?;
            let parsed = BelGraph::from_bytes(&bytes)?;
            let mut store = GraphStore::new(open_store(&database)?, settings.store_config());
            let extract = !no_extract && store.config().extract_information;

            match store.store_graph(&parsed, &label, description.as_deref(), extract)? {
                StoreOutcome::Stored(report) => {
                    ui::header(Icons::SAVE, &format!("Stored '{}'", report.label));
                    ui::summary_row("Nodes:", &report.nodes.to_string());
                    ui::summary_row("Edges:", &report.edges.to_string());
                    match &report.extraction {
                        Some(extraction) => {
                            ui::section("Extraction");
                            let created: Vec<(&str, usize)> =
                                extraction.created.iter().map(|(table, count)| (*table, *count)).collect();
                            println!("{}", ui::stats_table(&created));
                            ui::summary_row(
                                "Cache:",
                                &format!("{} hits, {} misses", extraction.cache_hits, extraction.cache_misses),
                            );
                            if extraction.skipped_evidence > 0 {
                                ui::warn(&format!(
                                    "{} evidence strings had no citation and were skipped",
                                    extraction.skipped_evidence
                                ));
                            }
                        }
                        None => ui::summary_row("Extraction:", &ui::dim("skipped")),
                    }
                }
                StoreOutcome::LabelConflict => {
                    ui::error(&format!("A graph labelled '{}' already exists", label));
                    std::process::exit(1);
                }
            }
        }

        Commands::Load { label, output } => {
            let store = GraphStore::new(open_store(&database)?, settings.store_config());
            let Some(graph) = store.load_graph(&label)? else {
                ui::error(&format!("No graph labelled '{}'", label));
                std::process::exit(1);
            };
            let bytes = graph.to_bytes()?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &bytes)?;
                    ui::header(Icons::LOAD, &format!("Loaded '{}'", label));
                    ui::summary_row("Nodes:", &graph.number_of_nodes().to_string());
                    ui::summary_row("Edges:", &graph.number_of_edges().to_string());
                    ui::summary_row("Written to:", &path.display().to_string());
                }
                None => println!("{}", String::from_utf8_lossy(&bytes)),
            }
        }

        Commands::List => {
            let store = open_store(&database)?;
            let summaries = store.graph_summaries()?;
            if summaries.is_empty() {
                ui::warn("No graphs stored yet");
            } else {
                ui::header(Icons::GRAPH, &format!("{} stored graphs", summaries.len()));
                println!("{}", ui::graphs_table(&summaries));
            }
        }

        Commands::Stats => {
            let store = open_store(&database)?;
            let stats = store.stats()?;

            ui::header(Icons::STATS, "belstore statistics");
            ui::info("Database", &database.display().to_string());
            println!("{}", ui::stats_table(&stats.tables));
            ui::summary_row("Total rows:", &stats.total_rows().to_string());
        }
    }

    Ok(())
}

fn open_store(database: &Path) -> anyhow::Result<SqliteStore> {
    config::ensure_db_dir(database)?;
    SqliteStore::open(database).with_context(|| format!("failed to open database {}", database.display()))
}
