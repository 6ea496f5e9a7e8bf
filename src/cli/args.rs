//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Front-end asset pipeline: SCSS, scripts, sprites and cache busting
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file name, searched upward from the current directory
    #[arg(short = 'C', long, global = true, default_value = "assetline.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands (default: watch)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Watch)
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Build everything, then rebuild on change with live reload
    #[command(visible_alias = "w")]
    Watch,

    /// Build everything once
    #[command(visible_alias = "b")]
    Build,

    /// Build only the sprite sheet and its stylesheet
    Sprites,
}
