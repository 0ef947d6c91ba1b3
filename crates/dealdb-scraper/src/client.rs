use std::time::Duration;

use dealdb_core::{ProductRecord, UpstreamSource};
use reqwest::Client;

use crate::error::ScraperError;

/// HTTP client for the upstream scraper services.
///
/// Each call is a single GET with no retries. The request timeout bounds the
/// whole exchange (connect, headers, body) so one hung upstream cannot stall a
/// refresh past that limit.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
}

impl UpstreamClient {
    /// Creates an `UpstreamClient` with the given timeouts and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        connect_timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Builds a client from the application config's upstream settings.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_app_config(config: &dealdb_core::AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.upstream_timeout_secs,
            config.upstream_connect_timeout_secs,
            &config.upstream_user_agent,
        )
    }

    /// Fetches and decodes one source's product list.
    ///
    /// The body must be a JSON array of product records. Records with a blank
    /// `itemName` are dropped with a warning since they cannot be identified.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidSourceUrl`] — the URL does not parse.
    /// - [`ScraperError::Timeout`] — the request exceeded the client timeout.
    /// - [`ScraperError::Http`] — connection or body-read failure.
    /// - [`ScraperError::UnexpectedStatus`] — any non-2xx status.
    /// - [`ScraperError::Deserialize`] — body is not a JSON array of products.
    pub async fn fetch_products(
        &self,
        source: &UpstreamSource,
    ) -> Result<Vec<ProductRecord>, ScraperError> {
        let url = reqwest::Url::parse(&source.url).map_err(|e| ScraperError::InvalidSourceUrl {
            url: source.url.clone(),
            reason: e.to_string(),
        })?;

        tracing::debug!(source = %source.name, host = %extract_domain(&source.url), "fetching upstream products");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_transport(e, &source.url))?;
        let status = response.status();

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: source.url.clone(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_transport(e, &source.url))?;
        let products = serde_json::from_slice::<Vec<ProductRecord>>(&body).map_err(|e| {
            ScraperError::Deserialize {
                context: format!("product list from {}", source.name),
                source: e,
            }
        })?;

        Ok(drop_unnamed(&source.name, products))
    }
}

fn classify_transport(err: reqwest::Error, url: &str) -> ScraperError {
    if err.is_timeout() {
        ScraperError::Timeout {
            url: url.to_owned(),
        }
    } else {
        ScraperError::Http(err)
    }
}

fn drop_unnamed(source_name: &str, products: Vec<ProductRecord>) -> Vec<ProductRecord> {
    let total = products.len();
    let kept: Vec<ProductRecord> = products
        .into_iter()
        .filter(|p| !p.item_name.trim().is_empty())
        .collect();
    if kept.len() < total {
        tracing::warn!(
            source = %source_name,
            dropped = total - kept.len(),
            "upstream returned products without an itemName; skipping them"
        );
    }
    kept
}

/// Extracts the hostname from a source URL for log fields.
///
/// Falls back to the full URL string if parsing fails.
pub(crate) fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
