//! CLI entry point: index a cloned repository and answer questions about it.

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use repoask_core::{artifacts_exist, load_config, repl, OpenAiClient, Session};

const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Parser)]
#[command(name = "repoask")]
#[command(about = "Ask natural-language questions about a cloned repository")]
struct Cli {
    /// Repository owner (user or organization).
    #[arg(value_name = "REPO_USER")]
    owner: String,
    /// Repository name; also the directory the clone lives in.
    #[arg(value_name = "REPO_NAME")]
    repo: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let api_key = std::env::var(API_KEY_VAR)
        .with_context(|| format!("Please set the {API_KEY_VAR} environment variable."))?;
    let cli = Cli::parse();

    let config = load_config();
    let repo_root = PathBuf::from(&cli.repo);
    if !repo_root.is_dir() && !artifacts_exist(&config.index_path, &config.mapping_path) {
        bail!(
            "repository directory {} not found; clone https://github.com/{}/{}.git first",
            repo_root.display(),
            cli.owner,
            cli.repo
        );
    }

    let client = OpenAiClient::new(&config, api_key)?;
    let session = Session::open(config, &repo_root, client.clone(), client).await?;

    let intro = format!("Enter your query about {}/{}", cli.owner, cli.repo);
    repl::run(&session, io::stdin().lock(), io::stdout().lock(), &intro).await?;
    Ok(())
}

/// Logs go to stderr so answers on stdout stay clean. `RUST_LOG` overrides the `info` default.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
