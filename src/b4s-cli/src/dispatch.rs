//! Command dispatch functions
//!
//! Breaks up the main match statement into focused dispatch functions.

use anyhow::Result;

use crate::cli::*;
use crate::commands;

/// Dispatch save subcommands
pub fn dispatch_save(command: SaveCommand) -> Result<()> {
    match command {
        SaveCommand::Decrypt {
            input,
            output,
            user_id,
        } => commands::save::decrypt(&input, output.as_deref(), user_id),

        SaveCommand::Encrypt {
            output,
            yaml,
            user_id,
            platform,
        } => commands::save::encrypt(&output, yaml.as_deref(), user_id, platform),

        SaveCommand::Items { input, user_id } => commands::save::items(&input, user_id),

        SaveCommand::Add {
            input,
            item,
            state_flags,
            output,
            user_id,
        } => commands::save::add(&input, &item, state_flags, output.as_deref(), user_id),
    }
}

/// Dispatch serial subcommands
pub fn dispatch_serial(command: SerialCommand) -> Result<()> {
    match command {
        SerialCommand::Decode { serial, json, bits } => {
            commands::serial::decode(&serial, json, bits)
        }
        SerialCommand::Encode { text } => commands::serial::encode(&text),
    }
}
