//! NPC arbitrage properties: profitability gates and per-read sorting
//! over a shared cache entry.

mod support;

use bazaarlord::domain::{ItemId, Product, QuickStatus};
use bazaarlord::gateway::VendorItem;
use bazaarlord::strategy::{AcquisitionStrategy, NpcConfig, NpcEngine, NpcQuery, NpcSortKey};
use support::{levels, snapshot};

fn bazaar_item(id: &str, bids: &[(f64, u64)], offers: &[(f64, u64)], sell_week: u64) -> Product {
    Product {
        item_id: ItemId::from(id),
        buy_orders: levels(bids),
        sell_orders: levels(offers),
        quick_status: QuickStatus {
            sell_moving_week: sell_week,
            ..QuickStatus::default()
        },
    }
}

fn vendor(id: &str, price: f64) -> VendorItem {
    VendorItem {
        item_id: ItemId::from(id),
        name: id.to_string(),
        npc_sell_price: price,
    }
}

#[test]
fn unprofitable_buy_orders_never_appear() {
    let engine = NpcEngine::new(NpcConfig::default());
    // Best bid 10 >= vendor price 10: no profit possible.
    let snap = snapshot(vec![bazaar_item("X", &[(10.0, 100)], &[(10.5, 100)], 168_000)]);

    let found = engine.scan(&snap, &[vendor("X", 10.0)], 1_000_000, AcquisitionStrategy::BuyOrder);
    assert!(found.is_empty());
}

#[test]
fn instabuy_with_taxed_top_level_above_vendor_yields_nothing() {
    let engine = NpcEngine::new(NpcConfig::default());
    // 10.0 * 1.04 = 10.4 >= 10.2 at the first level already.
    let snap = snapshot(vec![bazaar_item("X", &[], &[(10.0, 100)], 168_000)]);

    let found = engine.scan(&snap, &[vendor("X", 10.2)], 1_000_000, AcquisitionStrategy::InstaBuy);
    assert!(found.is_empty());
}

#[test]
fn instabuy_walks_only_the_profitable_prefix() {
    let engine = NpcEngine::new(NpcConfig::default());
    // Taxed: 10.4, 11.44, 12.48. Vendor pays 12: first two levels only.
    let snap = snapshot(vec![bazaar_item(
        "X",
        &[],
        &[(10.0, 50), (11.0, 50), (12.0, 500)],
        168_000,
    )]);

    let found = engine.scan(&snap, &[vendor("X", 12.0)], 10_000_000, AcquisitionStrategy::InstaBuy);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].max_affordable, 100);
    support::assert_near(
        found[0].acquisition_price,
        (50.0 * 10.4 + 50.0 * 11.44) / 100.0,
        1e-9,
    );
}

#[test]
fn requested_sort_reorders_without_invalidating_the_cache() {
    let engine = NpcEngine::new(NpcConfig::default());
    let snap = snapshot(vec![
        bazaar_item("BULK", &[], &[(1.0, 100_000)], 1_680_000),
        bazaar_item("RARE", &[], &[(100.0, 10)], 16_800),
    ]);
    let vendors = [vendor("BULK", 1.5), vendor("RARE", 150.0)];

    let by_total = engine.find_opportunities(&snap, &vendors, &NpcQuery::default());
    assert!(!by_total.from_cache);
    assert_eq!(by_total.items[0].item_id.as_str(), "BULK");

    let by_item = engine.find_opportunities(
        &snap,
        &vendors,
        &NpcQuery {
            sort: NpcSortKey::ProfitPerItem,
            ..NpcQuery::default()
        },
    );
    assert!(by_item.from_cache);
    assert_eq!(by_item.items[0].item_id.as_str(), "RARE");
}

#[test]
fn budget_and_strategy_key_the_cache() {
    let engine = NpcEngine::new(NpcConfig::default());
    let snap = snapshot(vec![bazaar_item(
        "X",
        &[(9.0, 1_000)],
        &[(10.0, 1_000)],
        168_000,
    )]);
    let vendors = [vendor("X", 15.0)];

    let instabuy = engine.find_opportunities(&snap, &vendors, &NpcQuery::default());
    let buyorder = engine.find_opportunities(
        &snap,
        &vendors,
        &NpcQuery {
            strategy: AcquisitionStrategy::BuyOrder,
            ..NpcQuery::default()
        },
    );

    assert!(!instabuy.from_cache);
    assert!(!buyorder.from_cache);
    // Same item priced differently per strategy.
    assert!(buyorder.items[0].acquisition_price < instabuy.items[0].acquisition_price);
}
