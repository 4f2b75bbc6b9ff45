//! Upstream data boundary: market snapshots and vendor prices.

mod client;
mod response;
mod vendor;

pub use client::{BazaarClient, MarketFeed};
pub use response::{BazaarResponse, RawOrder, RawProduct, RawQuickStatus};
pub use vendor::{VendorClient, VendorFeed, VendorItem};

use crate::domain::ItemId;

/// Receiver for the item-id list published after each successful fetch.
///
/// Implementations back autocomplete/search indexes. Publication is
/// fire-and-forget: implementations must not block or fail the fetch.
pub trait CatalogSink: Send + Sync {
    fn publish(&self, items: &[ItemId]);
}
