use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod app;
mod commands;
mod input;
mod theme;

#[derive(Parser)]
#[command(name = "keepchat")]
#[command(about = "keepchat - persistent terminal chat with local Ollama models")]
#[command(version)]
struct Cli {
    /// Run a single prompt against the saved session and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Model to use (skips the selection prompt)
    #[arg(short, long)]
    model: Option<String>,

    /// Directory holding history, system prompt and config (default ~/.keepchat)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Keep at most this many messages; saved to the config
    #[arg(long)]
    max_history: Option<usize>,

    /// Wait for whole replies instead of streaming them (this run only)
    #[arg(long)]
    no_stream: bool,

    /// Ollama server URL (this run only)
    #[arg(long)]
    ollama_url: Option<String>,

    /// Color theme (dark, light, mono)
    #[arg(long, default_value = "dark")]
    theme: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if theme::Theme::try_by_name(&cli.theme).is_none() {
        tracing::warn!(
            "unknown theme '{}', using dark (available: {})",
            cli.theme,
            theme::Theme::all_names().join(", ")
        );
    }

    let opts = app::RunOptions {
        data_dir: cli.data_dir,
        model: cli.model,
        max_history: cli.max_history,
        no_stream: cli.no_stream,
        ollama_url: cli.ollama_url,
        theme: cli.theme,
    };

    if let Some(prompt) = cli.prompt {
        app::run_single_prompt(opts, &prompt).await?;
    } else {
        app::run_interactive(opts).await?;
    }

    Ok(())
}
