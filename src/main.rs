use std::sync::Arc;

use anyhow::Context;
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters,
    model::*, tool, tool_handler, tool_router,
    transport::stdio, ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

mod config;
mod pipeline;
mod scholar;
mod store;

use config::Config;
use pipeline::{ErrorEnvelope, ScrapeError, Scraper};
use scholar::fetch::HttpFetcher;
use store::sqlite::SqliteStore;

// ── Parameter structs ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
struct GetDetailsParams {
    #[schemars(description = "Google Scholar citation view or author profile URL")]
    url: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ClassifyUrlParams {
    #[schemars(description = "URL to classify")]
    url: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetPublicationParams {
    #[schemars(description = "Stored publication id (the Scholar cluster id)")]
    id: String,
}

// ── Server ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ScholarScrapeServer {
    tool_router: ToolRouter<Self>,
    config: Arc<Config>,
    scraper: Arc<Scraper>,
    store: Arc<SqliteStore>,
}

#[tool_router]
impl ScholarScrapeServer {
    pub fn create() -> anyhow::Result<Self> {
        let config = Config::from_env();
        std::fs::create_dir_all(&config.data_dir)
            .context("Failed to create data directory")?;

        let store = Arc::new(
            SqliteStore::open(config.database_path())
                .context("Failed to open publication store")?,
        );
        let fetcher = Arc::new(
            HttpFetcher::new(&config.user_agent).context("Failed to build HTTP client")?,
        );
        let scraper = Scraper::new(fetcher, store.clone(), config.pub_limit);

        tracing::info!(
            "Publication store at {} ({} rows), pub_limit={}",
            store.path(),
            store.count().unwrap_or(0),
            config.pub_limit
        );

        Ok(Self {
            tool_router: Self::tool_router(),
            config: Arc::new(config),
            scraper: Arc::new(scraper),
            store,
        })
    }

    #[tool(description = "Scrape a Google Scholar publication (view_citation) or author profile URL, store the publications found, and return the extracted details")]
    async fn get_details(
        &self,
        Parameters(params): Parameters<GetDetailsParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!("URL posted: {:?}", params.url);
        let pending = self.scraper.fetch_details(params.url.as_deref());

        let result = match self.config.fetch_timeout {
            Some(limit) => match tokio::time::timeout(limit, pending).await {
                Ok(result) => result,
                Err(_) => {
                    let envelope = ErrorEnvelope {
                        success: false,
                        error: format!("Request timed out after {}s", limit.as_secs()),
                    };
                    let json = serde_json::to_string_pretty(&envelope)
                        .map_err(|e| McpError::internal_error(format!("{}", e), None))?;
                    return Ok(CallToolResult::success(vec![Content::text(json)]));
                }
            },
            None => pending.await,
        };

        if let Err(ref e) = result {
            if !matches!(e, ScrapeError::UrlRequired | ScrapeError::UrlNotSupported) {
                tracing::warn!("Scrape failed: {}", e);
            }
        }

        let json = pipeline::to_json(&result)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Classify a URL as a Scholar publication page (Article), author profile (Profile), or Unknown without fetching it")]
    async fn classify_url(
        &self,
        Parameters(params): Parameters<ClassifyUrlParams>,
    ) -> Result<CallToolResult, McpError> {
        let classified = self.scraper.classify(&params.url);
        let json = serde_json::to_string_pretty(&classified)
            .map_err(|e| McpError::internal_error(format!("{}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Look up a previously scraped publication in the local store by its publication id")]
    async fn get_publication(
        &self,
        Parameters(params): Parameters<GetPublicationParams>,
    ) -> Result<CallToolResult, McpError> {
        let row = self
            .store
            .get(params.id.trim())
            .map_err(|e| McpError::internal_error(format!("Store error: {}", e), None))?;

        match row {
            Some(row) => {
                let json = serde_json::to_string_pretty(&row)
                    .map_err(|e| McpError::internal_error(format!("{}", e), None))?;
                Ok(CallToolResult::success(vec![Content::text(json)]))
            }
            None => Ok(CallToolResult::success(vec![Content::text(
                format!("Publication not stored: {}", params.id),
            )])),
        }
    }
}

#[tool_handler]
impl ServerHandler for ScholarScrapeServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Extract bibliographic metadata from Google Scholar citation view and \
                 author profile pages. Scraped publications are stored locally, keyed \
                 by their Scholar publication id."
                    .into(),
            ),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting scholar-scrape MCP server");

    let server = ScholarScrapeServer::create()?;
    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    Ok(())
}
