//! CLI argument definitions for b4s
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

mod core;
mod save;
mod serial;

pub use core::{Cli, Commands};
pub use save::SaveCommand;
pub use serial::SerialCommand;
