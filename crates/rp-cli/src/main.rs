//! rpreg
//!
//! Validates resource provider manifests and registers them with a UCP
//! control plane.

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use config::{Config, Settings};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let Some(command) = cli.command.clone() else {
        println!("{} Resource provider registration", "rpreg".green().bold());
        println!();
        println!("Run {} for available commands.", "rpreg --help".cyan());
        return Ok(());
    };

    match command {
        Commands::Validate { file } => commands::run_validate(&file),
        Commands::Completions { shell } => {
            commands::run_completions(shell);
            Ok(())
        }
        Commands::Register { file, dry_run } => {
            commands::run_register(&settings(&cli)?, &file, dry_run)
        }
        Commands::RegisterType { file, type_name } => {
            commands::run_register_type(&settings(&cli)?, &file, &type_name)
        }
        Commands::RegisterDir { dir, dry_run } => {
            commands::run_register_dir(&settings(&cli)?, &dir, dry_run)
        }
    }
}

fn settings(cli: &Cli) -> Result<Settings> {
    let config = Config::load(cli.config.as_deref())?;
    Settings::resolve(cli, config)
}
