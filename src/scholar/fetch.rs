use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Retrieves the raw HTML behind a URL.
///
/// The body is returned as text and parsed by the caller, since `scraper::Html`
/// cannot be held across an await point in a `Send` future.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentSource for HttpFetcher {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!("GET {}", url);
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }
        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Err(FetchError::Parse(format!("empty document from {}", url)));
        }
        Ok(body)
    }
}
