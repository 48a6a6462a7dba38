mod categorizer;
mod cli;
mod db;
mod error;
mod fields;
mod fmt;
mod importer;
mod insights;
mod models;
mod normalizer;
mod reports;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, RulesCommands};

const LOG_ENV: &str = "SPENDLENS_LOG";

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init {
            data_dir,
            user,
            currency,
        } => cli::init::run(data_dir, user, currency),
        Commands::Upload { file, user, kind } => cli::upload::run(&file, user, kind.as_deref()),
        Commands::Transactions { user, limit } => cli::transactions::run(user, limit),
        Commands::Summary { month, user, json } => cli::summary::run(&month, user, json),
        Commands::Rules { command } => match command {
            RulesCommands::Add {
                keyword,
                category,
                user,
            } => cli::rules::add(&keyword, &category, user),
            RulesCommands::List { user } => cli::rules::list(user),
            RulesCommands::Delete { id, user } => cli::rules::delete(id, user),
        },
        Commands::Status { user } => cli::status::run(user),
        Commands::Forget { user } => cli::forget::run(user),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
