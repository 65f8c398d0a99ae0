//! Graphmill CLI - Command-line interface
//!
//! Usage:
//!   graphmill run <file> [--search <term>]
//!   graphmill graph
//!   graphmill text list
//!   graphmill text add <body>
//!   graphmill text delete <id>

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use graphmill_cli::{FileFetcher, IngestPipeline};
use graphmill_core::AppConfig;
use graphmill_model::create_model_client;
use graphmill_store::{MemoryStore, RecordStore, SurrealStore};

#[derive(Parser)]
#[command(name = "graphmill")]
#[command(about = "Turn scraped text into a normalized knowledge graph")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the extraction pipeline over a text file and print the graph
    Run {
        /// Input text file, one snippet per line
        file: PathBuf,

        /// Keep only snippets containing this term
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Assemble the graph from the current store and print it as DOT
    Graph,
    /// Inspect the TextUnit work queue
    Text {
        #[command(subcommand)]
        action: TextAction,
    },
}

#[derive(Subcommand)]
enum TextAction {
    /// List queued snippets
    List {
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        offset: Option<usize>,
    },
    /// Enqueue a snippet
    Add { body: String },
    /// Delete a queued snippet by id
    Delete { id: uuid::Uuid },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path.clone())?.with_env_override()?,
        None => AppConfig::from_env()?,
    };

    init_tracing(&config);

    let store = open_store(&config).await?;

    match cli.command {
        Commands::Run { file, search } => {
            let model = Arc::from(create_model_client(&config.model)?);
            let pipeline = IngestPipeline::new(
                Arc::new(FileFetcher::new()),
                model,
                store,
                config.extraction.clone(),
            );

            let graph = pipeline
                .run(&file.to_string_lossy(), &search)
                .await?;

            println!("{}", graph.to_dot());
        }
        Commands::Graph => {
            let assembler = graphmill_graph::GraphAssembler::new(store);
            let graph = assembler.build().await?;
            println!("{}", graph.to_dot());
        }
        Commands::Text { action } => match action {
            TextAction::List { limit, offset } => {
                let units = store.list_text(limit, offset).await?;
                for unit in units {
                    println!("{}\t{}", unit.id, unit.body);
                }
            }
            TextAction::Add { body } => {
                let unit = store.add_text(&body).await?;
                println!("{}", unit.id);
            }
            TextAction::Delete { id } => {
                store.delete_text(id).await?;
            }
        },
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    if config.logging.json_format {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn RecordStore>> {
    match config.store.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "surrealdb" => {
            let store = SurrealStore::new(&config.store).await?;
            store.init_schema().await?;
            Ok(Arc::new(store))
        }
        other => anyhow::bail!("unknown store backend: {other}"),
    }
}
