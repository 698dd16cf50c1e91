//! `specdex` command-line interface: ingest API specifications and markdown
//! into a vector collection and query it.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use specdex_core::bootstrap::resolve_config_path;
use specdex_core::config::{Config, StoreBackend};

#[derive(Parser)]
#[command(name = "specdex", version, about = "Semantic index over API specifications and docs")]
struct Cli {
    /// Path to the TOML config file. Falls back to `SPECDEX_CONFIG`, then
    /// `config/default.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Use a process-local vector store instead of Qdrant.
    #[arg(long, global = true)]
    in_memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest an OpenAPI 3.x or Swagger 2.x document (`.json`, `.yaml`, `.yml`).
    IngestSpec {
        file: PathBuf,
        #[arg(long, short)]
        collection: String,
        /// Point id prefix; defaults to the file name.
        #[arg(long)]
        source: Option<String>,
    },
    /// Ingest a markdown document.
    IngestMarkdown {
        file: PathBuf,
        #[arg(long, short)]
        collection: String,
        #[arg(long)]
        source: Option<String>,
    },
    /// Reranked retrieval with hierarchical filtering.
    Query {
        text: String,
        #[arg(long, short)]
        collection: String,
        #[arg(long, short, default_value_t = 5)]
        limit: usize,
    },
    /// Endpoints first, each followed by its fields.
    EndpointQuery {
        text: String,
        #[arg(long, short)]
        collection: String,
        #[arg(long, short, default_value_t = 5)]
        limit: usize,
    },
    /// Manage collections.
    Collections {
        #[command(subcommand)]
        action: CollectionsAction,
    },
    /// Print the `cl100k_base` token count of a text.
    Count { text: String },
    /// Ingest a spec into a throwaway in-memory collection and query it.
    Demo {
        file: PathBuf,
        query: String,
        #[arg(long, short, default_value_t = 5)]
        limit: usize,
        /// Use the endpoint-first strategy.
        #[arg(long)]
        endpoints: bool,
    },
}

#[derive(Subcommand)]
enum CollectionsAction {
    List,
    Delete { name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_subscriber();

    let config_path = cli.config.clone().unwrap_or_else(resolve_config_path);
    let mut config = Config::load(&config_path)?;
    if cli.in_memory || matches!(cli.command, Command::Demo { .. }) {
        config.store.backend = StoreBackend::Memory;
    }
    tracing::debug!(path = %config_path.display(), "config loaded");

    let json = cli.json;
    match cli.command {
        Command::IngestSpec {
            file,
            collection,
            source,
        } => commands::ingest_spec(config, &file, &collection, source, json).await,
        Command::IngestMarkdown {
            file,
            collection,
            source,
        } => commands::ingest_markdown(config, &file, &collection, source, json).await,
        Command::Query {
            text,
            collection,
            limit,
        } => commands::query(config, &text, &collection, limit, false, json).await,
        Command::EndpointQuery {
            text,
            collection,
            limit,
        } => commands::query(config, &text, &collection, limit, true, json).await,
        Command::Collections { action } => match action {
            CollectionsAction::List => commands::list_collections(config, json).await,
            CollectionsAction::Delete { name } => {
                commands::delete_collection(config, &name, json).await
            }
        },
        Command::Count { text } => commands::count(&text, json),
        Command::Demo {
            file,
            query,
            limit,
            endpoints,
        } => commands::demo(config, &file, &query, limit, endpoints, json).await,
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
