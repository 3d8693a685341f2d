use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Context;
use books_core::{BookLoader, ClientConfig, LoadOutcome, LoadState};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "booklist")]
#[command(about = "Search Google Books from the terminal")]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,
    #[command(subcommand)]
    command: Commands,
}

/// Values that take precedence over `BOOKS_*` environment variables.
#[derive(Args)]
struct Overrides {
    /// Volumes endpoint to query
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Number of results to request (1-40)
    #[arg(long, global = true)]
    max_results: Option<u32>,
    /// Cover URL used for volumes without a thumbnail
    #[arg(long, global = true)]
    placeholder_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one search and print the results
    Search {
        /// Search terms
        #[arg(required = true)]
        query: Vec<String>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Read one query per line from stdin; a new line cancels the search in flight
    Repl {
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Overrides {
    fn apply(self, mut config: ClientConfig) -> ClientConfig {
        if let Some(url) = self.api_url {
            config.base_url = url;
        }
        if let Some(max) = self.max_results {
            config.max_results = max;
        }
        if let Some(url) = self.placeholder_url {
            config.placeholder_cover_url = url;
        }
        config.normalized()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "books_core=info,booklist=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli
        .overrides
        .apply(ClientConfig::from_env().context("reading BOOKS_* environment")?);
    debug!(base_url = %config.base_url, max_results = config.max_results, "configuration loaded");
    let mut loader = BookLoader::from_config(&config)?;

    match cli.command {
        Commands::Search { query, json } => {
            let outcome = loader.load(&query.join(" ")).wait().await?;
            print!("{}", render(&outcome, json)?);
        }
        Commands::Repl { json } => repl(&mut loader, json).await?,
    }
    Ok(())
}

async fn repl(loader: &mut BookLoader, json: bool) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut state = loader.subscribe();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let query = line.trim();
                if !query.is_empty() {
                    loader.load(query);
                }
            }
            changed = state.changed() => {
                changed?;
                let current = state.borrow_and_update().clone();
                if let LoadState::Delivered { outcome, .. } = current {
                    print!("{}", render(&outcome, json)?);
                }
            }
        }
    }

    // Input closed: let the last search finish before exiting.
    if matches!(*state.borrow_and_update(), LoadState::Loading { .. }) {
        let current = state
            .wait_for(|s| !matches!(s, LoadState::Loading { .. }))
            .await?
            .clone();
        if let LoadState::Delivered { outcome, .. } = current {
            print!("{}", render(&outcome, json)?);
        }
    }
    Ok(())
}

fn render(outcome: &Arc<LoadOutcome>, json: bool) -> anyhow::Result<String> {
    if let LoadOutcome::Empty { cause: Some(err) } = outcome.as_ref() {
        warn!(error = %err, "search failed");
    }
    if json {
        let value = json!({
            "books": outcome.books(),
            "message": outcome.empty_state_message(),
        });
        return Ok(format!("{}\n", serde_json::to_string_pretty(&value)?));
    }
    Ok(render_text(outcome))
}

fn render_text(outcome: &LoadOutcome) -> String {
    if let Some(message) = outcome.empty_state_message() {
        return format!("{message}\n");
    }
    let mut out = String::new();
    for (i, book) in outcome.books().iter().enumerate() {
        let _ = writeln!(out, "{}. {} by {} ({:.1})", i + 1, book.title, book.authors, book.rating);
        match &book.cover {
            Some(cover) => {
                let _ = writeln!(out, "   cover {}x{}", cover.width, cover.height);
            }
            None => {
                let _ = writeln!(out, "   no cover");
            }
        }
        let _ = writeln!(out, "   {}", book.info_url);
    }
    out
}
