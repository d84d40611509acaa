//! Docloader CLI - watch a folder and ingest every new document once

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::Env;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Docloader - ingest each new document from a watched folder exactly once
#[derive(Parser)]
#[command(name = "docloader")]
#[command(version)]
#[command(about = "Ingest each new document from a watched folder exactly once", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize docloader (create config and ledger)
    Init,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Scan the watched folder on a schedule until Ctrl+C
    Run,

    /// Scan the watched folder once and exit
    Scan {
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List processed files, newest first
    List {
        /// Maximum number of records to show
        #[arg(short, long, default_value = "20")]
        limit: i64,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configuration, watched folder and ledger status
    Status,

    /// Fingerprint a file and report whether it was already processed
    Check {
        /// Path to the file
        path: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., loader.location)
        key: String,

        /// Value to set
        value: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = Env::load(cli.config).and_then(|env| match cli.command {
        Commands::Init => commands::init::run(&env),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(&env),
            ConfigCommands::Path => commands::config::path(&env),
            ConfigCommands::Set { key, value } => commands::config::set(&env, &key, &value),
        },
        Commands::Run => commands::run::run(&env),
        Commands::Scan { json } => commands::scan::run(&env, json),
        Commands::List { limit, json } => commands::list::run(&env, limit, json),
        Commands::Status => commands::status::run(&env),
        Commands::Check { path } => commands::check::run(&env, &path),
    });

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docloader=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docloader=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
