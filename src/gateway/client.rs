//! Bazaar REST API client.
//!
//! Owns the transport policy for the market snapshot endpoint: request
//! timeout, bounded retries, payload validation, and orientation
//! normalization. Downstream engines only ever see corrected
//! [`Snapshot`]s.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use tracing::{debug, info, warn};

use super::response::BazaarResponse;
use super::CatalogSink;
use crate::domain::{ItemId, Product, Snapshot};
use crate::error::{Error, Result};

/// Request timeout for one snapshot fetch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Total attempts per fetch, including the first.
const FETCH_ATTEMPTS: u32 = 3;
/// Pause between attempts.
const RETRY_DELAY: Duration = Duration::from_millis(250);

/// Source of full market snapshots.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<Snapshot>;
}

/// HTTP client for the bazaar market API.
pub struct BazaarClient {
    http: HttpClient,
    base_url: String,
    catalog_sink: Option<Arc<dyn CatalogSink>>,
}

impl BazaarClient {
    /// Create a new client for the given API base URL.
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            http: HttpClient::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url,
            catalog_sink: None,
        }
    }

    /// Attach a catalog sink notified with the item-id list after each
    /// successful fetch.
    #[must_use]
    pub fn with_catalog_sink(mut self, sink: Arc<dyn CatalogSink>) -> Self {
        self.catalog_sink = Some(sink);
        self
    }

    async fn fetch_once(&self) -> Result<Snapshot> {
        let url = format!("{}/skyblock/bazaar", self.base_url);
        debug!(url = %url, "Fetching market snapshot");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "market API returned status {status}"
            )));
        }

        let payload: BazaarResponse = response
            .json()
            .await
            .map_err(|e| Error::UpstreamDataInvalid(e.to_string()))?;

        if !payload.success {
            return Err(Error::UpstreamDataInvalid(
                "market API reported success=false".into(),
            ));
        }

        let last_updated = DateTime::<Utc>::from_timestamp_millis(payload.last_updated)
            .unwrap_or_else(Utc::now);

        let products: Vec<Product> = payload
            .products
            .into_iter()
            .map(|(id, raw)| raw.normalize(ItemId::from(id)))
            .collect();

        info!(count = products.len(), "Fetched market snapshot");
        Ok(Snapshot::new(last_updated, products))
    }

    fn notify_catalog(&self, snapshot: &Snapshot) {
        if let Some(sink) = &self.catalog_sink {
            let items: Vec<ItemId> = snapshot.item_ids().cloned().collect();
            sink.publish(&items);
        }
    }
}

#[async_trait]
impl MarketFeed for BazaarClient {
    /// Fetch and normalize a full snapshot, retrying transport failures.
    ///
    /// Invalid payloads (`UpstreamDataInvalid`) are not retried within a
    /// request; the next fetch will see fresh data anyway.
    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let mut last_error = None;
        for attempt in 1..=FETCH_ATTEMPTS {
            match self.fetch_once().await {
                Ok(snapshot) => {
                    self.notify_catalog(&snapshot);
                    return Ok(snapshot);
                }
                Err(e @ Error::UpstreamDataInvalid(_)) => return Err(e),
                Err(e) => {
                    warn!(attempt, error = %e, "Snapshot fetch failed");
                    last_error = Some(e);
                    if attempt < FETCH_ATTEMPTS {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| Error::UpstreamUnavailable("no fetch attempts made".into())))
    }
}
