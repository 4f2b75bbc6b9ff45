//! Command-line shell over the analyzer.
//!
//! Thin presentation layer: parses arguments, runs one query, renders a
//! table. All scoring lives in the engines.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tabled::{Table, Tabled};

use crate::app::Analyzer;
use crate::config::Config;
use crate::domain::{ItemId, RecipeBook, RiskTier};
use crate::error::Result;
use crate::gateway::{BazaarClient, VendorClient};
use crate::strategy::{
    AcquisitionStrategy, CraftQuery, FlipQuery, FlipSortKey, ManipulationQuery, NpcQuery,
    NpcSortKey, PriceMode, PricingStrategy,
};

#[derive(Parser)]
#[command(name = "bazaarlord", version, about)]
pub struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Rank flip opportunities.
    Flips {
        #[arg(long)]
        budget: Option<u64>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 10)]
        page_size: usize,
        #[arg(long, value_enum, default_value = "instant")]
        mode: PriceMode,
        #[arg(long, value_enum, default_value = "score")]
        sort: FlipSortKey,
        #[arg(long)]
        refresh: bool,
    },
    /// Rank crafting arbitrage across all recipes.
    Crafts {
        #[arg(long, default_value_t = 10_000_000)]
        budget: u64,
        #[arg(long, value_enum, default_value = "order-order")]
        strategy: PricingStrategy,
        #[arg(long)]
        include_high_risk: bool,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 10)]
        page_size: usize,
    },
    /// Rank market-manipulation targets.
    Manip {
        #[arg(long, default_value_t = 10_000_000)]
        budget: u64,
        #[arg(long, default_value_t = 1.5)]
        target_roi: f64,
        #[arg(long, value_enum, default_value = "extreme")]
        max_risk: RiskTier,
        #[arg(long, default_value_t = 0.0)]
        min_demand: f64,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 10)]
        page_size: usize,
        #[arg(long)]
        refresh: bool,
    },
    /// Rank bazaar-to-vendor arbitrage.
    Npc {
        #[arg(long, default_value_t = 10_000_000)]
        budget: u64,
        #[arg(long, value_enum, default_value = "insta-buy")]
        strategy: AcquisitionStrategy,
        #[arg(long, value_enum, default_value = "total-profit")]
        sort: NpcSortKey,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 10)]
        page_size: usize,
        #[arg(long)]
        refresh: bool,
    },
    /// Check one item's current market state.
    Price {
        /// Item id, e.g. ENCHANTED_DIAMOND.
        item: String,
    },
}

#[derive(Tabled)]
struct FlipRow {
    item: String,
    buy: String,
    sell: String,
    #[tabled(rename = "margin")]
    margin: String,
    #[tabled(rename = "profit/hr")]
    profit_per_hour: String,
    score: String,
    #[tabled(rename = "comp")]
    competition: String,
    risk: String,
}

#[derive(Tabled)]
struct CraftRow {
    item: String,
    cost: String,
    #[tabled(rename = "profit/craft")]
    profit: String,
    crafts: u64,
    #[tabled(rename = "total")]
    total_profit: String,
    risk: String,
}

#[derive(Tabled)]
struct ManipRow {
    item: String,
    cost: String,
    items: u64,
    #[tabled(rename = "visible")]
    fully_visible: bool,
    #[tabled(rename = "min sell")]
    min_sell: String,
    score: String,
    demand: String,
    risk: String,
    #[tabled(rename = "hours")]
    hours_to_liquidate: String,
}

#[derive(Tabled)]
struct NpcRow {
    item: String,
    #[tabled(rename = "buy @")]
    acquisition: String,
    #[tabled(rename = "npc @")]
    vendor: String,
    #[tabled(rename = "profit/item")]
    profit: String,
    #[tabled(rename = "qty")]
    max_affordable: u64,
    #[tabled(rename = "total")]
    total_profit: String,
}

fn coins(value: f64) -> String {
    if value.abs() >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value.abs() >= 1_000.0 {
        format!("{:.1}k", value / 1_000.0)
    } else {
        format!("{value:.1}")
    }
}

fn print_table<R: Tabled>(rows: Vec<R>) {
    if rows.is_empty() {
        println!("{}", "no opportunities found".dimmed());
        return;
    }
    println!("{}", Table::new(rows));
}

/// Run one CLI command to completion.
pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::load_or_default(&cli.config)?;
    config.init_logging();

    let feed = Arc::new(BazaarClient::new(config.network.api_url.clone()));
    let vendor_feed = Arc::new(VendorClient::new(config.network.api_url.clone()));
    let recipes = match &config.recipes_path {
        Some(path) => RecipeBook::from_json_file(path)?,
        None => RecipeBook::new(),
    };
    let analyzer = Analyzer::new(&config, feed, vendor_feed, recipes);

    match cli.command {
        Command::Flips {
            budget,
            page,
            page_size,
            mode,
            sort,
            refresh,
        } => {
            let result = analyzer
                .flips(&FlipQuery {
                    budget,
                    page,
                    page_size,
                    price_mode: mode,
                    sort,
                    force_refresh: refresh,
                })
                .await?;
            println!(
                "{} (page {}/{}, {} total)",
                "flip opportunities".bold(),
                result.page,
                result.total_pages,
                result.total_count
            );
            print_table(
                result
                    .items
                    .iter()
                    .map(|f| FlipRow {
                        item: f.item_id.to_string(),
                        buy: coins(f.buy_price),
                        sell: coins(f.sell_price),
                        margin: coins(f.profit_margin),
                        profit_per_hour: coins(f.profit_per_hour),
                        score: format!("{:.2}", f.flip_score),
                        competition: format!("{:.0}", f.competition),
                        risk: f.risk.to_string(),
                    })
                    .collect(),
            );
        }
        Command::Crafts {
            budget,
            strategy,
            include_high_risk,
            page,
            page_size,
        } => {
            let result = analyzer
                .crafts(&CraftQuery {
                    budget,
                    strategy,
                    include_high_risk,
                    page,
                    page_size,
                })
                .await?;
            println!(
                "{} (page {}/{}, {} total)",
                "craft opportunities".bold(),
                result.page,
                result.total_pages,
                result.total_count
            );
            print_table(
                result
                    .items
                    .iter()
                    .map(|c| CraftRow {
                        item: c.result_item.to_string(),
                        cost: coins(c.ingredient_cost),
                        profit: coins(c.profit_per_craft),
                        crafts: c.max_craftable,
                        total_profit: coins(c.total_profit),
                        risk: c.risk.to_string(),
                    })
                    .collect(),
            );
        }
        Command::Manip {
            budget,
            target_roi,
            max_risk,
            min_demand,
            page,
            page_size,
            refresh,
        } => {
            let result = analyzer
                .manipulations(&ManipulationQuery {
                    budget,
                    target_roi,
                    max_risk,
                    min_demand,
                    page,
                    page_size,
                    force_refresh: refresh,
                })
                .await?;
            println!(
                "{} (page {}/{}, {} total)",
                "manipulation targets".bold(),
                result.page,
                result.total_pages,
                result.total_count
            );
            print_table(
                result
                    .items
                    .iter()
                    .map(|m| ManipRow {
                        item: m.item_id.to_string(),
                        cost: coins(m.total_cost),
                        items: m.total_items,
                        fully_visible: m.is_fully_visible,
                        min_sell: coins(m.min_sell_price),
                        score: format!("{:.1}", m.score),
                        demand: format!("{:.0}", m.demand_score),
                        risk: m.risk.to_string(),
                        hours_to_liquidate: format!("{:.1}", m.hours_to_liquidate),
                    })
                    .collect(),
            );
        }
        Command::Npc {
            budget,
            strategy,
            sort,
            page,
            page_size,
            refresh,
        } => {
            let result = analyzer
                .npc_arbitrage(&NpcQuery {
                    budget,
                    strategy,
                    sort,
                    page,
                    page_size,
                    force_refresh: refresh,
                })
                .await?;
            println!(
                "{} (page {}/{}, {} total)",
                "npc arbitrage".bold(),
                result.page,
                result.total_pages,
                result.total_count
            );
            print_table(
                result
                    .items
                    .iter()
                    .map(|n| NpcRow {
                        item: n.item_name.clone(),
                        acquisition: coins(n.acquisition_price),
                        vendor: coins(n.vendor_price),
                        profit: coins(n.profit_per_item),
                        max_affordable: n.max_affordable,
                        total_profit: coins(n.total_profit),
                    })
                    .collect(),
            );
        }
        Command::Price { item } => {
            let check = analyzer.price_check(&ItemId::from(item)).await?;
            println!("{}", check.item_id.to_string().bold());
            let fmt_opt = |v: Option<f64>| v.map_or_else(|| "-".into(), coins);
            println!("  best buy order:  {}", fmt_opt(check.best_buy_price));
            println!("  best sell order: {}", fmt_opt(check.best_sell_price));
            println!("  spread:          {}", fmt_opt(check.spread));
            println!("  weighted buy:    {}", coins(check.weighted_buy_price));
            println!("  weighted sell:   {}", coins(check.weighted_sell_price));
            println!("  weekly buy/sell: {} / {}", check.weekly_buy_movement, check.weekly_sell_movement);
            println!("  liquidity:       {:.0}", check.liquidity);
        }
    }

    Ok(())
}
