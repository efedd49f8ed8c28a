//! CLI commands and argument parsing

use crate::error::{Error, Result};
use crate::filter::FilterSpec;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

/// Resource pager CLI
#[derive(Parser, Debug)]
#[command(name = "resource-pager")]
#[command(author, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the API (overrides the config file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the total number of matching records
    Count {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Fetch every page of matching records
    Pages {
        #[command(flatten)]
        query: QueryArgs,

        /// Page size (0 = let the server decide)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        page_size: i64,

        /// Starting offset
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        offset: i64,
    },
}

/// Resource, version and filter selection shared by all commands
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Resource name (e.g. persons)
    #[arg(short, long)]
    pub resource: String,

    /// Resource version
    #[arg(long)]
    pub version: Option<String>,

    /// Criteria filter JSON object
    #[arg(long)]
    pub criteria: Option<String>,

    /// Named query as NAME=JSON
    #[arg(long, value_name = "NAME=JSON")]
    pub named_query: Option<String>,

    /// Filter map entry as KEY=VALUE (repeatable)
    #[arg(long = "filter-map", value_name = "KEY=VALUE")]
    pub filter_map: Vec<String>,

    /// QAPI request body JSON
    #[arg(long)]
    pub qapi: Option<String>,
}

impl QueryArgs {
    /// Build the filter selected by the arguments
    ///
    /// At most one filter mechanism may be given.
    pub fn filter_spec(&self) -> Result<Option<FilterSpec>> {
        let given = [
            self.criteria.is_some(),
            self.named_query.is_some(),
            !self.filter_map.is_empty(),
            self.qapi.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();
        if given > 1 {
            return Err(Error::invalid_argument(
                "only one of --criteria, --named-query, --filter-map, --qapi may be given",
            ));
        }

        if let Some(criteria) = &self.criteria {
            return Ok(Some(FilterSpec::criteria_json(&parse_json(criteria)?)));
        }
        if let Some(named) = &self.named_query {
            let (name, value) = named.split_once('=').ok_or_else(|| {
                Error::invalid_argument(format!("named query must be NAME=JSON, got {named:?}"))
            })?;
            return Ok(Some(FilterSpec::named_query(name, &parse_json(value)?)));
        }
        if !self.filter_map.is_empty() {
            let pairs = self
                .filter_map
                .iter()
                .map(|entry| {
                    entry.split_once('=').ok_or_else(|| {
                        Error::invalid_argument(format!(
                            "filter map entry must be KEY=VALUE, got {entry:?}"
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(Some(FilterSpec::filter_map(pairs)));
        }
        if let Some(qapi) = &self.qapi {
            return Ok(Some(FilterSpec::qapi(&parse_json(qapi)?)));
        }
        Ok(None)
    }
}

fn parse_json(text: &str) -> Result<Value> {
    serde_json::from_str(text)
        .map_err(|e| Error::invalid_argument(format!("invalid JSON {text:?}: {e}")))
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one object per line)
    Json,
    /// Human-readable output
    Pretty,
}
