//! URL shortener clients.
//!
//! The verification link handed to users is a deep link wrapped by an
//! ad-supported shortener. Without a configured shortener the deep link is
//! handed out as-is.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::ShortenerConfig;

/// Errors that can occur while shortening a URL.
#[derive(Debug, Error)]
pub enum ShortenerError {
    #[error("Shortener request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Shortener rejected the request: {0}")]
    Rejected(String),

    #[error("Shortener returned an empty URL")]
    EmptyResult,
}

/// Wraps a long URL into a short one.
#[async_trait]
pub trait UrlShortener: Send + Sync {
    /// Returns the short URL for `long_url`.
    async fn shorten(&self, long_url: &str) -> Result<String, ShortenerError>;
}

/// Hands out the long URL unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughShortener;

#[async_trait]
impl UrlShortener for PassthroughShortener {
    async fn shorten(&self, long_url: &str) -> Result<String, ShortenerError> {
        Ok(long_url.to_owned())
    }
}

/// Reply of shortener APIs following the common `?api=KEY&url=URL` convention.
#[derive(Debug, Deserialize)]
struct ShortenResponse {
    #[serde(default)]
    status: Option<String>,

    #[serde(default, rename = "shortenedUrl")]
    shortened_url: Option<String>,

    #[serde(default)]
    message: Option<serde_json::Value>,
}

impl ShortenResponse {
    fn into_url(self) -> Result<String, ShortenerError> {
        if self.status.as_deref() == Some("error") {
            let message = self
                .message
                .map_or_else(|| "unknown error".to_owned(), |m| m.to_string());
            return Err(ShortenerError::Rejected(message));
        }

        self.shortened_url
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty())
            .ok_or(ShortenerError::EmptyResult)
    }
}

/// Shortener reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpShortener {
    client: reqwest::Client,
    config: ShortenerConfig,
}

impl HttpShortener {
    /// Creates a shortener client for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ShortenerConfig) -> Result<Self, ShortenerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl UrlShortener for HttpShortener {
    async fn shorten(&self, long_url: &str) -> Result<String, ShortenerError> {
        debug!("Shortening {}", long_url);

        let response: ShortenResponse = self
            .client
            .get(&self.config.api_url)
            .query(&[("api", self.config.api_key.as_str()), ("url", long_url)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.into_url()
    }
}
