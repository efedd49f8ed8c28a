//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat, QueryArgs};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::ResponseEnvelope;
use crate::pagination::{PageQuery, PagingEngine};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let engine = PagingEngine::from_config(&self.client_config()?)?;
        match &self.cli.command {
            Commands::Count { query } => self.count(&engine, query).await,
            Commands::Pages {
                query,
                page_size,
                offset,
            } => self.pages(&engine, query, *page_size, *offset).await,
        }
    }

    /// Client config from `--config`, with `--base-url` taking precedence
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match (&self.cli.config, &self.cli.base_url) {
            (Some(path), _) => ClientConfig::from_file(path)?,
            (None, Some(base_url)) => ClientConfig::new(base_url.clone()),
            (None, None) => {
                return Err(Error::config("either --config or --base-url is required"));
            }
        };
        if let Some(base_url) = &self.cli.base_url {
            config.base_url.clone_from(base_url);
        }
        Ok(config)
    }

    async fn count(&self, engine: &PagingEngine, query: &QueryArgs) -> Result<()> {
        let filter = query.filter_spec()?;
        let version = query.version.as_deref();
        let total = match &filter {
            Some(filter) => {
                engine
                    .total_count(Some(&query.resource), version, Some(filter))
                    .await?
            }
            None => engine.resource_total_count(&query.resource, version).await?,
        };

        self.output_message(&json!({
            "type": "COUNT",
            "count": {
                "resource": query.resource,
                "filter": filter.as_ref().map(|f| f.kind().to_string()),
                "total": total
            }
        }));
        Ok(())
    }

    async fn pages(
        &self,
        engine: &PagingEngine,
        query: &QueryArgs,
        page_size: i64,
        offset: i64,
    ) -> Result<()> {
        let start = Instant::now();
        let mut page_query = PageQuery::new(query.resource.clone())
            .page_size(page_size)
            .offset(offset);
        if let Some(version) = &query.version {
            page_query = page_query.version(version.clone());
        }
        if let Some(filter) = query.filter_spec()? {
            page_query = page_query.filter(filter);
        }

        let pages = engine.resolve(&page_query).await?;
        debug!("Resolved {} pages in {:?}", pages.len(), start.elapsed());

        let mut total_records = 0usize;
        for (index, page) in pages.iter().enumerate() {
            total_records += page.record_count().unwrap_or_default();
            self.output_message(&json!({
                "type": "PAGE",
                "page": {
                    "index": index,
                    "status": page.status,
                    "records": page_records(page)
                }
            }));
        }

        self.output_message(&json!({
            "type": "SUMMARY",
            "summary": {
                "resource": query.resource,
                "pages": pages.len(),
                "records": total_records,
                "duration_ms": start.elapsed().as_millis() as u64
            }
        }));
        Ok(())
    }

    /// Output a JSON message in the configured format
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Page body as JSON, or the raw text when it does not parse
fn page_records(page: &ResponseEnvelope) -> Value {
    page.json().unwrap_or_else(|_| Value::String(page.body.clone()))
}
