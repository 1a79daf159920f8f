//! Coffer: compile archive descriptions into replicated, encrypted object
//! storage topologies.

use std::io;

use anyhow::Result;
use clap::Parser;
use coffer_core::config::{Config, LogFormat};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;
mod commands;

use cli::{Cli, Commands, InputArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Synth(args) => {
            let config = prepare(&args.input)?;
            commands::handle_synth(&args, &config, &mut io::stdout().lock())
        }
        Commands::Policy(args) => {
            let config = prepare(&args.input)?;
            commands::handle_policy(&args, &config, &mut io::stdout().lock())
        }
        Commands::Check(args) => {
            let config = prepare(&args.input)?;
            commands::handle_check(&args, &config, &mut io::stdout().lock())
        }
        Commands::Version => {
            println!("coffer {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn prepare(input: &InputArgs) -> Result<Config> {
    let config = commands::load_config(input)?;
    init_logging(&config)?;
    Ok(config)
}

fn init_logging(config: &Config) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    // Stdout carries the rendered documents.
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry().with(filter).with(fmt_layer.json()).init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry().with(filter).with(fmt_layer).init();
        }
    }

    Ok(())
}
