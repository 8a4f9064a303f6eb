//! Core CLI definitions

use b4s::Platform;
use clap::{Parser, Subcommand};

use super::save::SaveCommand;
use super::serial::SerialCommand;

#[derive(Parser)]
#[command(name = "b4s")]
#[command(about = "Borderlands 4 item serial and save tool", long_about = None)]
pub struct Cli {
    /// Log decode progress to stderr (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save file operations (decrypt, encrypt, items, add)
    #[command(visible_alias = "s")]
    Save {
        #[command(subcommand)]
        command: SaveCommand,
    },

    /// Item serial operations (decode, encode)
    #[command(visible_alias = "r")]
    Serial {
        #[command(subcommand)]
        command: SerialCommand,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set default user ID (Steam ID or Epic account ID)
        #[arg(long)]
        user_id: Option<String>,

        /// Set default platform (epic or steam)
        #[arg(long)]
        platform: Option<Platform>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
