use academia_chat::app::App;
use academia_chat::backend::RagClient;
use academia_chat::config::Config;
use academia_chat::markup;
use academia_chat::tui;
use academia_chat::ui::chat::FALLBACK_TEXT;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "academia")]
#[command(version)]
#[command(about = "Terminal chat client for the Academ.ia research assistant", long_about = None)]
struct Cli {
    /// Base address of the answer service, overriding config and environment
    #[arg(long)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single question and print the answer
    Ask { question: String },
    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }
    init_tracing(&config)?;

    match cli.command {
        Some(Commands::Ask { question }) => ask(&config, &question).await,
        Some(Commands::Config) => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        None => run_tui(&config).await,
    }
}

async fn run_tui(config: &Config) -> Result<()> {
    let client = RagClient::new(config)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = App::new(client).run(&mut terminal).await;
    tui::restore()?;

    result
}

/// One-shot query from the command line, same dispatch path as the widget.
async fn ask(config: &Config, question: &str) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        return Ok(());
    }

    let client = RagClient::new(config)?;
    match client.send(question).await {
        Ok(answer) => println!("{}", markup::plain_text(&answer)),
        Err(error) => {
            tracing::warn!(%error, "dispatch failed");
            println!("{}", FALLBACK_TEXT);
        }
    }
    Ok(())
}

/// The TUI owns the terminal, so diagnostics go to the configured log file.
fn init_tracing(config: &Config) -> Result<()> {
    fs::create_dir_all(&config.academia_home)
        .context("Failed to create .academia directory")?;
    let file = fs::File::create(&config.log_file).context("Failed to open log file")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
