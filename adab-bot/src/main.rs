//! Adab Bot - Main entry point.

use adab_bot::{run_bot, CliChannel, TelegramChannel};
use adab_common::config::Config;
use adab_common::logging::init_logging;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "adab-bot", version, about = "Adab al-Mufrad notes and audio menu bot")]
struct Args {
    /// Talk to the bot on stdin/stdout instead of Telegram.
    /// Type /quit to leave; after Ctrl-C the process exits once shutdown completes
    #[arg(long)]
    cli: bool,

    /// Config file (defaults to ~/.adab-bot/config.json when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load_with_env(args.config.as_deref())?;

    // Initialize logging
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!("Adab Bot v{}", env!("CARGO_PKG_VERSION"));

    if args.cli {
        run_bot(CliChannel::new()).await?;
        // A pending stdin read sits on a blocking thread that would hold the runtime open.
        std::process::exit(0);
    }

    if !config.telegram.has_token() {
        tracing::warn!("TELEGRAM_BOT_TOKEN is not set; connecting with the placeholder token");
    }

    run_bot(TelegramChannel::from_config(&config.telegram)).await
}
