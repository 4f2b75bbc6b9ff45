//! Vendor price catalog client for the NPC arbitrage engine.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::ItemId;
use crate::error::{Error, Result};

/// An item a fixed-price vendor buys back.
#[derive(Debug, Clone)]
pub struct VendorItem {
    pub item_id: ItemId,
    pub name: String,
    /// Coins the vendor pays per unit.
    pub npc_sell_price: f64,
}

/// Source of vendor buy-back prices.
#[async_trait]
pub trait VendorFeed: Send + Sync {
    async fn fetch_vendor_prices(&self) -> Result<Vec<VendorItem>>;
}

#[derive(Debug, Deserialize)]
struct ItemsResponse {
    success: bool,
    #[serde(default)]
    items: Vec<RawVendorItem>,
}

#[derive(Debug, Deserialize)]
struct RawVendorItem {
    id: String,
    #[serde(default)]
    name: Option<String>,
    npc_sell_price: Option<f64>,
}

/// HTTP client for the item catalog endpoint carrying vendor prices.
pub struct VendorClient {
    http: HttpClient,
    base_url: String,
}

impl VendorClient {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            http: HttpClient::new(),
            base_url,
        }
    }
}

#[async_trait]
impl VendorFeed for VendorClient {
    /// Fetch all items with a positive vendor buy-back price.
    async fn fetch_vendor_prices(&self) -> Result<Vec<VendorItem>> {
        let url = format!("{}/resources/skyblock/items", self.base_url);
        debug!(url = %url, "Fetching vendor prices");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "item catalog returned status {status}"
            )));
        }

        let payload: ItemsResponse = response
            .json()
            .await
            .map_err(|e| Error::UpstreamDataInvalid(e.to_string()))?;
        if !payload.success {
            return Err(Error::UpstreamDataInvalid(
                "item catalog reported success=false".into(),
            ));
        }

        let items: Vec<VendorItem> = payload
            .items
            .into_iter()
            .filter_map(|raw| {
                let price = raw.npc_sell_price?;
                if price <= 0.0 {
                    return None;
                }
                Some(VendorItem {
                    name: raw.name.unwrap_or_else(|| raw.id.clone()),
                    item_id: ItemId::from(raw.id),
                    npc_sell_price: price,
                })
            })
            .collect();

        info!(count = items.len(), "Fetched vendor-priced items");
        Ok(items)
    }
}
