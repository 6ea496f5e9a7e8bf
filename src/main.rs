//! assetline - front-end asset pipeline with live reload.

mod actor;
mod asset;
mod cli;
mod config;
mod core;
mod embed;
mod logger;
mod reload;
mod task;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PipelineConfig;
use task::TaskGraph;

fn main() -> Result<()> {
    // before anything can block
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = Arc::new(PipelineConfig::load(&cli)?);
    if !config.config_path.as_os_str().is_empty() {
        debug!("config"; "using {}", config.config_path.display());
    }

    match cli.command() {
        Commands::Watch => cli::watch::run(config),
        Commands::Build => cli::build::run_once(config, &TaskGraph::pipeline()?),
        Commands::Sprites => cli::build::run_once(config, &cli::build::sprites_graph()?),
    }
}
