//! liveserve - a static file server with live reload for local development.

mod actor;
mod cli;
mod config;
mod core;
mod embed;
mod logger;
mod reload;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::{ServerConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = init_config(ServerConfig::load(&cli)?);
    if let Some(path) = &config.config_path {
        debug!("config"; "using {}", path.display());
    }

    cli::serve::bind_server()?.run()
}
