//! CLI command handlers
//!
//! Each subcommand is implemented in its own module.

pub mod export;
pub mod generate;
pub mod helpers;
pub mod keywords;
pub mod stats;
pub mod validate;
