use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;

use crate::{
    config::DownloadConfig,
    error::{ModelsLabError, Result},
};

#[derive(Debug, Clone)]
pub struct FetchedArtifact {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedArtifact>;
}

/// Plain GET with a fixed per-request timeout. One attempt per artifact.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent())
            .timeout(config.timeout())
            .build()
            .map_err(|e| ModelsLabError::ConfigError(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArtifactFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedArtifact> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "image/*")
            .send()
            .await
            .map_err(|e| ModelsLabError::NetworkError(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ModelsLabError::NetworkError(format!(
                "GET {} returned HTTP {}",
                url, status
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ModelsLabError::NetworkError(format!("reading {} failed: {}", url, e)))?
            .to_vec();

        if bytes.is_empty() {
            return Err(ModelsLabError::NetworkError(format!(
                "empty response data from {}",
                url
            )));
        }

        log::debug!(
            "Fetched {} bytes from {} ({})",
            bytes.len(),
            url,
            content_type.as_deref().unwrap_or("no content-type")
        );

        Ok(FetchedArtifact {
            bytes,
            content_type,
        })
    }
}
