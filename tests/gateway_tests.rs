//! Field-swap normalization: the upstream payload's inverted buy/sell
//! naming must come out corrected, giving a buy <= sell spread for any
//! internally consistent two-sided market.

use bazaarlord::domain::ItemId;
use bazaarlord::gateway::BazaarResponse;

const PAYLOAD: &str = r#"{
    "success": true,
    "lastUpdated": 1700000000000,
    "products": {
        "ENCHANTED_COAL": {
            "sell_summary": [
                {"pricePerUnit": 480.0, "amount": 2000, "orders": 12},
                {"pricePerUnit": 479.5, "amount": 900, "orders": 4}
            ],
            "buy_summary": [
                {"pricePerUnit": 495.2, "amount": 1500, "orders": 9},
                {"pricePerUnit": 496.0, "amount": 700, "orders": 3}
            ],
            "quick_status": {
                "buyPrice": 495.8, "buyVolume": 2200, "buyOrders": 12, "buyMovingWeek": 310000,
                "sellPrice": 479.9, "sellVolume": 2900, "sellOrders": 16, "sellMovingWeek": 270000
            }
        }
    }
}"#;

#[test]
fn normalized_orientation_yields_a_valid_spread() {
    let response: BazaarResponse = serde_json::from_str(PAYLOAD).unwrap();
    assert!(response.success);

    let (id, raw) = response.products.into_iter().next().unwrap();
    let product = raw.normalize(ItemId::from(id));

    // Upstream "sell" list held the bids: best bid 480 below best offer 495.2.
    assert_eq!(product.best_buy_price(), Some(480.0));
    assert_eq!(product.best_sell_price(), Some(495.2));
    assert!(product.has_valid_spread());

    // Bids descend, offers ascend, post-normalization.
    assert!(product.buy_orders[0].price_per_unit >= product.buy_orders[1].price_per_unit);
    assert!(product.sell_orders[0].price_per_unit <= product.sell_orders[1].price_per_unit);
}

#[test]
fn summary_counters_swap_with_the_lists() {
    let response: BazaarResponse = serde_json::from_str(PAYLOAD).unwrap();
    let (id, raw) = response.products.into_iter().next().unwrap();
    let qs = raw.normalize(ItemId::from(id)).quick_status;

    // Everything buy-flavored upstream is sell-flavored internally.
    assert_eq!(qs.buy_price, 479.9);
    assert_eq!(qs.sell_price, 495.8);
    assert_eq!(qs.buy_volume, 2900);
    assert_eq!(qs.sell_volume, 2200);
    assert_eq!(qs.buy_orders, 16);
    assert_eq!(qs.sell_orders, 12);
    assert_eq!(qs.buy_moving_week, 270000);
    assert_eq!(qs.sell_moving_week, 310000);

    // Corrected orientation: the weighted buy price sits below the
    // weighted sell price.
    assert!(qs.buy_price <= qs.sell_price);
}
