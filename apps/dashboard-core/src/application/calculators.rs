//! Offloaded Calculators
//!
//! The three pure functions the dashboard offloads from its hot path: price
//! aggregation, portfolio PnL, and investment affordability sizing. All
//! arithmetic is `Decimal`; division by zero is a defined zero, never an
//! error.
//!
//! These functions hold no state and touch no I/O, so they are testable
//! independent of the worker plumbing in [`super::worker`].

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::domain::account::{AccountBalance, OrderSide};
use crate::domain::market::Symbol;

// =============================================================================
// Price Aggregation
// =============================================================================

/// One best bid/ask observation to aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    /// Trading pair.
    pub symbol: Symbol,
    /// Best bid price.
    pub bid: Decimal,
    /// Best ask price.
    pub ask: Decimal,
    /// Observation time, epoch milliseconds.
    pub timestamp_ms: i64,
}

/// Derived mid/spread for one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedPrice {
    /// Midpoint of bid and ask.
    pub mid: Decimal,
    /// Ask minus bid.
    pub spread: Decimal,
    /// Timestamp of the source quote, epoch milliseconds.
    pub timestamp_ms: i64,
}

/// Reduce a quote list to per-symbol mid and spread.
///
/// A later quote for the same symbol replaces an earlier one.
#[must_use]
pub fn aggregate_prices(quotes: &[PriceQuote]) -> HashMap<Symbol, AggregatedPrice> {
    let mut result = HashMap::with_capacity(quotes.len());
    for quote in quotes {
        result.insert(
            quote.symbol,
            AggregatedPrice {
                mid: (quote.bid + quote.ask) / Decimal::TWO,
                spread: quote.ask - quote.bid,
                timestamp_ms: quote.timestamp_ms,
            },
        );
    }
    result
}

// =============================================================================
// PnL
// =============================================================================

/// Input to the PnL calculation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PnlRequest {
    /// Account balances to value.
    pub balances: Vec<AccountBalance>,
    /// Current price per asset, quote-denominated.
    pub current_prices: HashMap<String, Decimal>,
    /// Reference prices from an earlier observation, if any.
    pub previous_prices: Option<HashMap<String, Decimal>>,
}

/// Valuation and PnL for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPnl {
    /// Asset code.
    pub asset: String,
    /// Total balance (free + locked).
    pub balance: Decimal,
    /// Balance valued at the current price.
    pub current_value: Decimal,
    /// Change versus the previous price; zero without a reference.
    pub pnl: Decimal,
    /// `pnl` as a percentage of the previous value.
    pub pnl_rate: Decimal,
}

/// Aggregate PnL over all nonzero balances.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PnlReport {
    /// Sum of all current values.
    pub total_asset: Decimal,
    /// Sum of all per-asset PnL.
    pub total_pnl: Decimal,
    /// `total_pnl` as a percentage of `total_asset`; zero when the total is
    /// zero.
    pub pnl_rate: Decimal,
    /// Per-asset breakdown, in balance order.
    pub per_asset: Vec<AssetPnl>,
}

/// Value every nonzero balance at current prices and compute PnL against the
/// previous prices where available.
///
/// Assets with no current price are valued at zero. An asset with no previous
/// price carries zero PnL rather than being excluded.
#[must_use]
pub fn calculate_pnl(request: &PnlRequest) -> PnlReport {
    let mut total_asset = Decimal::ZERO;
    let mut total_pnl = Decimal::ZERO;
    let mut per_asset = Vec::new();

    for balance in &request.balances {
        let total = balance.total();
        if total.is_zero() || total.is_sign_negative() {
            continue;
        }

        let current_price = request
            .current_prices
            .get(&balance.asset)
            .copied()
            .unwrap_or_default();
        let current_value = total * current_price;

        let mut pnl = Decimal::ZERO;
        let mut pnl_rate = Decimal::ZERO;
        if let Some(previous_price) = request
            .previous_prices
            .as_ref()
            .and_then(|prices| prices.get(&balance.asset))
        {
            let previous_value = total * previous_price;
            pnl = current_value - previous_value;
            if previous_value > Decimal::ZERO {
                pnl_rate = pnl / previous_value * Decimal::ONE_HUNDRED;
            }
        }

        total_asset += current_value;
        total_pnl += pnl;
        per_asset.push(AssetPnl {
            asset: balance.asset.clone(),
            balance: total,
            current_value,
            pnl,
            pnl_rate,
        });
    }

    let pnl_rate = if total_asset > Decimal::ZERO {
        total_pnl / total_asset * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    PnlReport {
        total_asset,
        total_pnl,
        pnl_rate,
        per_asset,
    }
}

// =============================================================================
// Investment Sizing
// =============================================================================

/// Input to the affordability calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvestmentRequest {
    /// Desired base-asset quantity.
    pub quantity: Decimal,
    /// Reference price per unit.
    pub price: Decimal,
    /// Order direction.
    pub side: OrderSide,
    /// Available quote-asset balance (spent on BUY).
    pub quote_balance: Decimal,
    /// Available base-asset balance (spent on SELL).
    pub base_balance: Decimal,
}

/// Affordability verdict for one prospective order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvestmentReport {
    /// Quote-asset cost of the order at the reference price.
    pub investment: Decimal,
    /// Whether the relevant balance covers the order.
    pub can_afford: bool,
    /// Largest quantity the relevant balance could cover.
    pub max_quantity: Decimal,
}

/// Size a prospective order against the available balances.
///
/// For BUY the constraint is the quote balance at the reference price; for
/// SELL it is the base balance directly. A zero price yields a zero
/// `max_quantity` on the BUY side.
#[must_use]
pub fn calculate_investment(request: &InvestmentRequest) -> InvestmentReport {
    let investment = request.quantity * request.price;

    let (can_afford, max_quantity) = match request.side {
        OrderSide::Buy => {
            let max = if request.price > Decimal::ZERO {
                request.quote_balance / request.price
            } else {
                Decimal::ZERO
            };
            (investment <= request.quote_balance, max)
        }
        OrderSide::Sell => (
            request.quantity <= request.base_balance,
            request.base_balance,
        ),
    };

    InvestmentReport {
        investment,
        can_afford,
        max_quantity,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn balance(asset: &str, free: &str, locked: &str) -> AccountBalance {
        AccountBalance {
            asset: asset.to_string(),
            free: free.to_string(),
            locked: locked.to_string(),
        }
    }

    #[test]
    fn aggregate_computes_mid_and_spread() {
        let quotes = vec![PriceQuote {
            symbol: Symbol::Ethusdt,
            bid: dec("2000"),
            ask: dec("2001"),
            timestamp_ms: 1_700_000_000_000,
        }];
        let result = aggregate_prices(&quotes);

        let eth = &result[&Symbol::Ethusdt];
        assert_eq!(eth.mid, dec("2000.5"));
        assert_eq!(eth.spread, dec("1"));
        assert_eq!(eth.timestamp_ms, 1_700_000_000_000);
    }

    #[test]
    fn aggregate_keeps_the_latest_quote_per_symbol() {
        let quotes = vec![
            PriceQuote {
                symbol: Symbol::Btcusdt,
                bid: dec("100"),
                ask: dec("102"),
                timestamp_ms: 1,
            },
            PriceQuote {
                symbol: Symbol::Btcusdt,
                bid: dec("200"),
                ask: dec("204"),
                timestamp_ms: 2,
            },
        ];
        let result = aggregate_prices(&quotes);
        assert_eq!(result.len(), 1);
        assert_eq!(result[&Symbol::Btcusdt].mid, dec("202"));
        assert_eq!(result[&Symbol::Btcusdt].spread, dec("4"));
    }

    #[test]
    fn pnl_with_previous_prices() {
        let request = PnlRequest {
            balances: vec![balance("BTC", "1", "0")],
            current_prices: HashMap::from([("BTC".to_string(), dec("50000"))]),
            previous_prices: Some(HashMap::from([("BTC".to_string(), dec("40000"))])),
        };
        let report = calculate_pnl(&request);

        assert_eq!(report.total_asset, dec("50000"));
        assert_eq!(report.total_pnl, dec("10000"));
        assert_eq!(report.pnl_rate, dec("20"));

        assert_eq!(report.per_asset.len(), 1);
        let btc = &report.per_asset[0];
        assert_eq!(btc.asset, "BTC");
        assert_eq!(btc.balance, dec("1"));
        assert_eq!(btc.current_value, dec("50000"));
        assert_eq!(btc.pnl, dec("10000"));
        assert_eq!(btc.pnl_rate, dec("25"));
    }

    #[test]
    fn pnl_without_previous_prices_is_zero_change() {
        let request = PnlRequest {
            balances: vec![balance("ETH", "2", "0")],
            current_prices: HashMap::from([("ETH".to_string(), dec("2000"))]),
            previous_prices: None,
        };
        let report = calculate_pnl(&request);

        assert_eq!(report.total_asset, dec("4000"));
        assert_eq!(report.total_pnl, Decimal::ZERO);
        assert_eq!(report.pnl_rate, Decimal::ZERO);
        assert_eq!(report.per_asset[0].pnl, Decimal::ZERO);
    }

    #[test]
    fn pnl_skips_zero_balances() {
        let request = PnlRequest {
            balances: vec![
                balance("BNB", "0", "0"),
                balance("SOL", "10", "0"),
            ],
            current_prices: HashMap::from([("SOL".to_string(), dec("25"))]),
            previous_prices: None,
        };
        let report = calculate_pnl(&request);

        assert_eq!(report.per_asset.len(), 1);
        assert_eq!(report.per_asset[0].asset, "SOL");
        assert_eq!(report.total_asset, dec("250"));
    }

    #[test]
    fn pnl_values_unpriced_assets_at_zero() {
        let request = PnlRequest {
            balances: vec![balance("DOGE", "100", "0")],
            current_prices: HashMap::new(),
            previous_prices: None,
        };
        let report = calculate_pnl(&request);

        assert_eq!(report.total_asset, Decimal::ZERO);
        assert_eq!(report.pnl_rate, Decimal::ZERO);
        assert_eq!(report.per_asset[0].current_value, Decimal::ZERO);
    }

    #[test]
    fn pnl_locked_amounts_count_toward_balance() {
        let request = PnlRequest {
            balances: vec![balance("BTC", "0.5", "0.5")],
            current_prices: HashMap::from([("BTC".to_string(), dec("40000"))]),
            previous_prices: None,
        };
        let report = calculate_pnl(&request);
        assert_eq!(report.per_asset[0].balance, dec("1"));
        assert_eq!(report.total_asset, dec("40000"));
    }

    #[test]
    fn buy_that_exceeds_quote_balance_cannot_afford() {
        let request = InvestmentRequest {
            quantity: dec("1"),
            price: dec("100"),
            side: OrderSide::Buy,
            quote_balance: dec("50"),
            base_balance: Decimal::ZERO,
        };
        let report = calculate_investment(&request);

        assert_eq!(report.investment, dec("100"));
        assert!(!report.can_afford);
        assert_eq!(report.max_quantity, dec("0.5"));
    }

    #[test]
    fn sell_is_bounded_by_base_balance() {
        let request = InvestmentRequest {
            quantity: dec("3"),
            price: dec("25"),
            side: OrderSide::Sell,
            quote_balance: Decimal::ZERO,
            base_balance: dec("5"),
        };
        let report = calculate_investment(&request);

        assert_eq!(report.investment, dec("75"));
        assert!(report.can_afford);
        assert_eq!(report.max_quantity, dec("5"));
    }

    #[test]
    fn buy_at_zero_price_yields_zero_max_quantity() {
        let request = InvestmentRequest {
            quantity: dec("1"),
            price: Decimal::ZERO,
            side: OrderSide::Buy,
            quote_balance: dec("100"),
            base_balance: Decimal::ZERO,
        };
        let report = calculate_investment(&request);
        assert_eq!(report.max_quantity, Decimal::ZERO);
        assert!(report.can_afford);
    }
}
