//! # askdocs CLI
//!
//! Ask questions about the documents in `data/`.
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! askdocs "What does the onboarding guide say about laptops?"
//! ```
//!
//! The optional positional argument is answered first; after that askdocs
//! keeps prompting on stdin. Type `quit`, `q`, or `exit` (or press Ctrl-D)
//! to leave.
//!
//! Settings are read from `./askdocs.toml` when present, or from the file
//! given with `--config`. Diagnostics go to stderr; set `RUST_LOG` or pass
//! `--verbose` to see more of them.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use askdocs::chain::RetrievalChain;
use askdocs::chat::OpenAIChat;
use askdocs::config;
use askdocs::embedding::OpenAIEmbedder;
use askdocs::index::IndexStrategy;
use askdocs::openai::OpenAiClient;
use askdocs::session::{LineInput, Session};

/// askdocs: chat with a folder of documents.
///
/// Builds (or reuses) a semantic index over the document directory and
/// answers questions with a hosted chat model, keeping the conversation
/// history as context.
#[derive(Parser)]
#[command(name = "askdocs", version, about, long_about = None)]
struct Cli {
    /// First question to answer before prompting interactively.
    question: Option<String>,

    /// Path to a TOML configuration file (defaults to `./askdocs.toml` if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log askdocs debug diagnostics to stderr.
    #[arg(short, long)]
    verbose: bool,
}

/// Filter directives: `RUST_LOG` when set, else `warn`; `--verbose` adds
/// debug output for askdocs itself only.
fn log_directives(verbose: bool, rust_log: Option<&str>) -> String {
    let mut directives = match rust_log.map(str::trim) {
        Some(env) if !env.is_empty() => env.to_string(),
        _ => "warn".to_string(),
    };
    if verbose {
        directives.push_str(",askdocs=debug");
    }
    directives
}

fn init_tracing(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::new(log_directives(verbose, rust_log.as_deref()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config(cli.config.as_deref())?;
    let api_key = config::resolve_api_key(&cfg.openai)?;

    let client = OpenAiClient::new(&cfg.openai, api_key)?;
    let embedder = Arc::new(OpenAIEmbedder::new(client.clone(), &cfg.embedding));

    let strategy = IndexStrategy::resolve(&cfg.index);
    tracing::debug!(?strategy, "index strategy");
    let store = strategy
        .acquire(&cfg, embedder.as_ref())
        .await
        .context("failed to prepare the document index")?;

    let chat = OpenAIChat::new(client, &cfg.chat);
    let chain = RetrievalChain::new(store, embedder, Box::new(chat), &cfg.retrieval, &cfg.chat);

    let mut session = Session::new(chain, cfg.history);
    let mut input = LineInput::new(std::io::stdin().lock(), std::io::stdout());
    let exit = session
        .run(cli.question, &mut input, &mut std::io::stdout())
        .await?;
    tracing::debug!(?exit, turns = session.history().len(), "session ended");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_warn() {
        assert_eq!(log_directives(false, None), "warn");
        assert_eq!(log_directives(false, Some("  ")), "warn");
    }

    #[test]
    fn test_rust_log_is_honored() {
        assert_eq!(log_directives(false, Some("sqlx=info")), "sqlx=info");
    }

    #[test]
    fn test_verbose_only_raises_own_crate() {
        assert_eq!(log_directives(true, None), "warn,askdocs=debug");
        assert_eq!(
            log_directives(true, Some("hyper=trace")),
            "hyper=trace,askdocs=debug"
        );
    }
}
