//! codeloop CLI: the main entry point.
//!
//! ```text
//! codeloop [OPTIONS] <TASK>...
//! ```
//!
//! The task words are joined with spaces, planned by the model, and each
//! numbered step is executed against the project root with the built-in
//! tools. Progress goes to stdout; logs go to stderr.

use clap::Parser;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "codeloop",
    about = "Plan a coding task with a language model and execute it step by step",
    version,
    author
)]
struct Cli {
    /// The task, in plain words
    #[arg(required_unless_present = "print_default_config", num_args = 1..)]
    task: Vec<String>,

    /// Config file (defaults to ~/.codeloop/config.toml)
    #[arg(short, long, env = "CODELOOP_CONFIG")]
    config: Option<PathBuf>,

    /// Project directory the tools operate on
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Override the model
    #[arg(short, long)]
    model: Option<String>,

    /// Override the provider (ollama, openai, openrouter, ...)
    #[arg(short, long)]
    provider: Option<String>,

    /// Model calls allowed per step
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the transcript.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.print_default_config {
        print!("{}", codeloop_config::AppConfig::default_toml());
        return Ok(());
    }

    let options = commands::run::RunOptions {
        task: cli.task.join(" "),
        config_path: cli.config,
        root: cli.root,
        model: cli.model,
        provider: cli.provider,
        max_attempts: cli.max_attempts,
    };
    commands::run::run(options).await
}
