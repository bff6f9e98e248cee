//! Patentsearch CLI - patent search with AI enrichment
//!
//! This binary provides the command-line interface over the search pipeline.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use patentsearch::{parse_keyword_group, to_json, VerifyOutcome};
use patentsearch_core::config::Config;
use patentsearch_core::KeywordGroup;
use patentsearch_enrichment::create_keyword_suggester;
use patentsearch_pipeline::{create_pipeline, SearchRequest};
use patentsearch_search_client::create_search_backend;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "patentsearch")]
#[command(about = "Patent search with AI technical-feature enrichment")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search patents and print records with metadata as JSON
    Search {
        /// Keyword group as comma-separated terms; repeat for AND
        #[arg(short, long = "group", value_name = "TERMS", value_parser = parse_keyword_group)]
        groups: Vec<KeywordGroup>,
        /// Additional free-form term, OR-ed into one extra group
        #[arg(short, long = "term", value_name = "TERM")]
        terms: Vec<String>,
        /// Maximum number of results
        #[arg(short = 'n', long)]
        max_results: Option<usize>,
        /// Skip AI enrichment
        #[arg(long)]
        no_enrich: bool,
    },
    /// Suggest keyword groups for a technical description
    Suggest {
        /// Free-text technical description
        description: String,
        /// Number of keywords to suggest
        #[arg(long, default_value_t = 3)]
        keywords: usize,
        /// Synonyms per keyword
        #[arg(long, default_value_t = 5)]
        synonyms: usize,
    },
    /// Check a search credential against the service
    Verify {
        /// Credential to check; defaults to the configured one
        credential: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;
    let config = load_config(cli.config.as_deref())?;

    let output = match cli.command {
        Commands::Search {
            groups,
            terms,
            max_results,
            no_enrich,
        } => {
            let mut request = SearchRequest::new(groups).with_extra_terms(terms);
            if let Some(max_results) = max_results {
                request = request.with_max_results(max_results);
            }
            if no_enrich {
                request = request.with_enrichment(false);
            }
            search(&config, request).await?
        }
        Commands::Suggest {
            description,
            keywords,
            synonyms,
        } => {
            let suggester = create_keyword_suggester(&config.ai)?.with_counts(keywords, synonyms);
            to_json(&suggester.suggest(&description).await)?
        }
        Commands::Verify { credential } => verify(&config, credential).await?,
    };

    println!("{output}");
    Ok(())
}

/// Initialize logging system
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("patentsearch={level},warn")));

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = Config::load(path).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn search(config: &Config, request: SearchRequest) -> Result<String> {
    let pipeline = create_pipeline(config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, returning the records processed so far");
            on_interrupt.cancel();
        }
    });

    let response = pipeline.run(request, &cancel).await?;
    let stats = pipeline.backend().stats();
    info!(
        "Search service: {} requests, {} repaired responses",
        stats.requests, stats.repaired_responses
    );
    to_json(&response)
}

async fn verify(config: &Config, credential: Option<String>) -> Result<String> {
    let credential = credential
        .or_else(|| config.search.api_key.clone())
        .context("No credential given and search.api_key is not configured")?;
    let backend = create_search_backend(&config.search)?;
    let valid = backend.verify_credential(&credential).await?;
    to_json(&VerifyOutcome {
        backend: backend.name().to_string(),
        valid,
    })
}
