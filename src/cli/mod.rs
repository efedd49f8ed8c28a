//! CLI module
//!
//! Command-line interface for counting and paging resources.
//!
//! # Commands
//!
//! - `count` - Print the total number of matching records
//! - `pages` - Fetch every page of matching records

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, QueryArgs};
pub use runner::Runner;
