// Fetching the listing catalog from the remote endpoint

use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;

use crate::config::Settings;
use crate::error::FetchError;
use crate::models::Listing;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

// Anything that can produce a full catalog; the HTTP endpoint in production
pub trait ListingSource: Send + Sync {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<Listing>, FetchError>>;
}

// Shared HTTP client honouring timeout and proxy settings
pub fn build_client(settings: &Settings) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(settings.request_timeout_secs));

    if let Some(proxy_url) = settings.proxy_url.as_deref().filter(|p| !p.is_empty()) {
        let proxy = reqwest::Proxy::all(proxy_url)
            .with_context(|| format!("Invalid proxy url '{}'", proxy_url))?;
        builder = builder.proxy(proxy);
        tracing::info!("Using configured proxy for listing fetches.");
    }

    builder.build().context("Failed to build reqwest client")
}

/// Decode the endpoint body: a JSON array of listings.
pub fn decode_listings(body: &[u8]) -> Result<Vec<Listing>, FetchError> {
    Ok(serde_json::from_slice::<Vec<Listing>>(body)?)
}

#[derive(Debug, Clone)]
pub struct HttpListingSource {
    client: Client,
    url: String,
}

impl HttpListingSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        HttpListingSource {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_once(&self) -> Result<Vec<Listing>, FetchError> {
        tracing::debug!(url = %self.url, "Fetching listings");
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        tracing::debug!(status = %status, "Received response status");
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        match decode_listings(&body) {
            Ok(listings) => {
                tracing::debug!(count = listings.len(), bytes = body.len(), "Decoded listings");
                Ok(listings)
            }
            Err(e) => {
                // Full body only at debug level
                tracing::debug!(response_body = %String::from_utf8_lossy(&body), "Undecodable listings body");
                Err(e)
            }
        }
    }
}

impl ListingSource for HttpListingSource {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<Listing>, FetchError>> {
        self.fetch_once().boxed()
    }
}
