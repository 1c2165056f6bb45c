use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RiskAnalyticsError;
use crate::types::{Bps, Money};
use crate::RiskAnalyticsResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Consumes the ask side.
    #[default]
    Buy,
    /// Consumes the bid side.
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

/// Depth of book, each side listed best price first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketDepth {
    #[serde(default)]
    pub bids: Vec<BookLevel>,
    #[serde(default)]
    pub asks: Vec<BookLevel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketImpactInput {
    pub order_size: Decimal,
    #[serde(default)]
    pub side: OrderSide,
    pub market_depth: MarketDepth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelFill {
    /// Zero-based level index on the consumed side.
    pub level: usize,
    pub price: Decimal,
    pub quantity: Decimal,
    pub notional: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketImpactOutput {
    pub side: OrderSide,
    pub order_size: Decimal,
    pub fills: Vec<LevelFill>,
    pub levels_consumed: usize,
    pub total_notional: Money,
    /// Volume-weighted average execution price.
    pub vwap: Decimal,
    /// Best price on the consumed side before execution.
    pub reference_price: Decimal,
    /// Execution cost versus the reference price; positive is adverse.
    pub slippage_cost: Money,
    pub impact_bps: Bps,
}

/// Walk an order through the book level by level.
///
/// `impact = (vwap - best) / best` for buys and `(best - vwap) / best` for
/// sells, so a positive impact is always a cost to the order.
pub fn market_impact(input: &MarketImpactInput) -> RiskAnalyticsResult<MarketImpactOutput> {
    let order_size = input.order_size;
    if order_size <= Decimal::ZERO {
        return Err(RiskAnalyticsError::validation(
            "order_size",
            format!("order size {} must be positive", order_size),
        ));
    }

    let (levels, side_name) = match input.side {
        OrderSide::Buy => (&input.market_depth.asks, "asks"),
        OrderSide::Sell => (&input.market_depth.bids, "bids"),
    };
    validate_levels(levels, input.side, side_name)?;

    let available: Decimal = levels.iter().map(|l| l.quantity).sum();
    if order_size > available {
        return Err(RiskAnalyticsError::InsufficientLiquidity {
            requested: order_size,
            available,
        });
    }

    let mut remaining = order_size;
    let mut fills = Vec::new();
    for (i, level) in levels.iter().enumerate() {
        if remaining.is_zero() {
            break;
        }
        if level.quantity.is_zero() {
            continue;
        }
        let take = remaining.min(level.quantity);
        fills.push(LevelFill {
            level: i,
            price: level.price,
            quantity: take,
            notional: take * level.price,
        });
        remaining -= take;
    }

    let total_notional: Money = fills.iter().map(|f| f.notional).sum();
    let vwap = total_notional / order_size;
    // available > 0 here, so some level has quantity
    let reference_price = levels
        .iter()
        .find(|l| !l.quantity.is_zero())
        .map_or(levels[0].price, |l| l.price);

    let adverse_move = match input.side {
        OrderSide::Buy => vwap - reference_price,
        OrderSide::Sell => reference_price - vwap,
    };

    Ok(MarketImpactOutput {
        side: input.side,
        order_size,
        levels_consumed: fills.len(),
        fills,
        total_notional,
        vwap,
        reference_price,
        slippage_cost: adverse_move * order_size,
        impact_bps: adverse_move / reference_price * dec!(10000),
    })
}

fn validate_levels(
    levels: &[BookLevel],
    side: OrderSide,
    side_name: &str,
) -> RiskAnalyticsResult<()> {
    for (i, level) in levels.iter().enumerate() {
        if level.price <= Decimal::ZERO {
            return Err(RiskAnalyticsError::validation(
                format!("market_depth.{}[{}].price", side_name, i),
                format!("price {} must be positive", level.price),
            ));
        }
        if level.quantity < Decimal::ZERO {
            return Err(RiskAnalyticsError::validation(
                format!("market_depth.{}[{}].quantity", side_name, i),
                format!("quantity {} must be non-negative", level.quantity),
            ));
        }
        if i > 0 {
            let prev = levels[i - 1].price;
            let worse_or_equal = match side {
                OrderSide::Buy => level.price >= prev,
                OrderSide::Sell => level.price <= prev,
            };
            if !worse_or_equal {
                return Err(RiskAnalyticsError::validation(
                    format!("market_depth.{}[{}].price", side_name, i),
                    "levels must be ordered best price first",
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(price: Decimal, quantity: Decimal) -> BookLevel {
        BookLevel { price, quantity }
    }

    fn book() -> MarketDepth {
        MarketDepth {
            bids: vec![level(dec!(99), dec!(100)), level(dec!(98), dec!(200))],
            asks: vec![
                level(dec!(100), dec!(100)),
                level(dec!(101), dec!(100)),
                level(dec!(102), dec!(300)),
            ],
        }
    }

    #[test]
    fn test_buy_walks_asks() {
        let out = market_impact(&MarketImpactInput {
            order_size: dec!(250),
            side: OrderSide::Buy,
            market_depth: book(),
        })
        .unwrap();
        // 100*100 + 100*101 + 50*102 = 25200
        assert_eq!(out.total_notional, dec!(25200));
        assert_eq!(out.vwap, dec!(100.8));
        assert_eq!(out.levels_consumed, 3);
        assert_eq!(out.reference_price, dec!(100));
        assert_eq!(out.slippage_cost, dec!(200));
        assert_eq!(out.impact_bps, dec!(80));
    }

    #[test]
    fn test_sell_walks_bids() {
        let out = market_impact(&MarketImpactInput {
            order_size: dec!(200),
            side: OrderSide::Sell,
            market_depth: book(),
        })
        .unwrap();
        // 100*99 + 100*98 = 19700
        assert_eq!(out.vwap, dec!(98.5));
        assert_eq!(out.slippage_cost, dec!(100));
        assert!(out.impact_bps > Decimal::ZERO);
    }

    #[test]
    fn test_single_level_no_impact() {
        let out = market_impact(&MarketImpactInput {
            order_size: dec!(40),
            side: OrderSide::Buy,
            market_depth: book(),
        })
        .unwrap();
        assert_eq!(out.impact_bps, Decimal::ZERO);
        assert_eq!(out.fills.len(), 1);
    }

    #[test]
    fn test_exceeds_depth() {
        match market_impact(&MarketImpactInput {
            order_size: dec!(301),
            side: OrderSide::Sell,
            market_depth: book(),
        })
        .unwrap_err()
        {
            RiskAnalyticsError::InsufficientLiquidity { requested, available } => {
                assert_eq!(requested, dec!(301));
                assert_eq!(available, dec!(300));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_side_is_insufficient() {
        let r = market_impact(&MarketImpactInput {
            order_size: dec!(1),
            side: OrderSide::Buy,
            market_depth: MarketDepth::default(),
        });
        assert!(matches!(r, Err(RiskAnalyticsError::InsufficientLiquidity { .. })));
    }

    #[test]
    fn test_rejects_unordered_book() {
        let mut depth = book();
        depth.asks.swap(0, 2);
        let r = market_impact(&MarketImpactInput {
            order_size: dec!(10),
            side: OrderSide::Buy,
            market_depth: depth,
        });
        assert!(matches!(r, Err(RiskAnalyticsError::Validation { .. })));
    }
}
