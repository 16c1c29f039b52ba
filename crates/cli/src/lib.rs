pub mod commands;

use cartfill_core::config::{AppConfig, LoadOptions};
use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "cartfill",
    about = "Cartfill cart add-on suggestion CLI",
    long_about = "Rank add-on candidates that help a shopper clear the remaining order-value gap, and inspect the ranking configuration.",
    after_help = "Examples:\n  cartfill suggest --gap 100000 --cart 12,34 --candidates candidates.json\n  CARTFILL_SUGGESTIONS_MOCK=true cartfill suggest --gap 40000\n  cartfill categories\n  cartfill config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Rank candidates for one shopper and print the suggestions as JSON")]
    Suggest(commands::suggest::SuggestArgs),
    #[command(about = "Print the effective category priority table as JSON")]
    Categories,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Suggest(args) => commands::suggest::run(args),
        Command::Categories => commands::categories::run(),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout carries only the JSON payload.
fn init_logging(config: &AppConfig) {
    use cartfill_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}
