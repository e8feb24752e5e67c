//! Media download from the messaging platform.

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use crate::config::{MediaConfig, TwilioCredentials};
use crate::errors::PipelineError;

/// Authenticated, time-bounded and size-bounded media downloader
#[derive(Debug, Clone)]
pub struct MediaFetcher {
    client: reqwest::Client,
    credentials: Option<TwilioCredentials>,
    max_bytes: u64,
}

impl MediaFetcher {
    pub fn new(config: &MediaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build media HTTP client")?;
        Ok(Self {
            client,
            credentials: config.credentials.clone(),
            max_bytes: config.max_bytes,
        })
    }

    /// Download `url`, requiring a success status and an image content type
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        let mut request = self.client.get(url);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.account_sid, Some(&creds.auth_token));
        }

        let mut response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("image") {
            return Err(PipelineError::NotAnImage(content_type));
        }

        if let Some(declared) = response.content_length() {
            if declared > self.max_bytes {
                return Err(PipelineError::TooLarge(declared));
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let total = (bytes.len() + chunk.len()) as u64;
            if total > self.max_bytes {
                return Err(PipelineError::TooLarge(total));
            }
            bytes.extend_from_slice(&chunk);
        }

        debug!(bytes = bytes.len(), content_type = %content_type, "Media downloaded");
        info!(status = status.as_u16(), "Media fetch completed");
        Ok(bytes)
    }
}
