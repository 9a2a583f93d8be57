//! Framework Desktop RGB fan CLI
//!
//! Applies lighting presets to the Framework Desktop fan through the
//! ChromeOS embedded controller.

use clap::Parser;
use tracing_subscriber::EnvFilter;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = commands::config_store(cli.config);
    let device = cli.device.as_deref();

    match cli.command {
        // === Query Commands ===
        None | Some(Commands::List) => {
            commands::query::list(&store)?;
        }
        Some(Commands::Show { name }) => {
            commands::query::show(&store, &name)?;
        }
        Some(Commands::ConfigPath) => {
            commands::query::config_path(&store)?;
        }

        // === Apply Commands ===
        Some(Commands::Apply { name, no_save }) => {
            commands::apply::apply(&store, device, &name, no_save)?;
        }
        Some(Commands::Set { colors, animation }) => {
            commands::apply::set(device, colors, animation)?;
        }
        Some(Commands::Restore) => {
            commands::apply::restore(&store, device)?;
        }
        Some(Commands::Preview { name, seconds }) => {
            commands::apply::preview(&store, &name, seconds)?;
        }
    }

    Ok(())
}
