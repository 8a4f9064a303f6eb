//! Command handlers for b4s CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod configure;
pub mod save;
pub mod serial;
