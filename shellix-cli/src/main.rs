//! shellix - Telegram bot giving every user a disposable container shell.

mod cli;
mod commands;
mod telegram;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Respects RUST_LOG; defaults to "info" for the bot, "warn" for admin commands.
    let default_level = match cli.command {
        Commands::Serve(_) => "info",
        _ => "warn",
    };
    if let Err(e) = tracing_subscriber::fmt()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .try_init()
    {
        eprintln!("[ERROR] Failed to initialize tracing: {}", e);
    }

    match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, &cli.global).await,
        Commands::Create(args) => commands::create::execute(args, &cli.global).await,
        Commands::Rm(args) => commands::rm::execute(args, &cli.global).await,
        Commands::Restart(args) => commands::restart::execute(args, &cli.global).await,
        Commands::Exec(args) => commands::exec::execute(args, &cli.global).await,
    }
}
