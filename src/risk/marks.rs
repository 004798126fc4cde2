//! 估值标记
//!
//! 持仓估值来源链固定：盘口中间价 → OHLCV 收盘 → 最近成交价。
//! 非零持仓三个来源全部缺失时不允许猜价，整小时中止。

use crate::context::HourContext;
use crate::domain::entities::AssetMarketData;
use crate::error::{AppError, AppResult};

/// 解析某资产的估值标记
pub fn resolve_mark(
    asset: &str,
    market: Option<&AssetMarketData>,
    fallback: Option<f64>,
) -> AppResult<f64> {
    if let Some(data) = market {
        if let Some(book) = data.book_top() {
            return Ok(book.midpoint());
        }
        if let Some(close) = data.ohlcv_close {
            return Ok(close);
        }
    }
    fallback.ok_or_else(|| AppError::MarkSourceMissing(asset.to_string()))
}

/// 组合估值结果
#[derive(Debug, Clone, Default)]
pub struct PortfolioValuation {
    pub position_value: f64,
    pub total_value: f64,
    /// 每资产持仓名义（敞口检查复用）
    pub per_asset_value: std::collections::BTreeMap<String, f64>,
}

/// 以上下文的标记来源链对全部持仓估值
pub fn portfolio_valuation(ctx: &HourContext) -> AppResult<PortfolioValuation> {
    let mut valuation = PortfolioValuation::default();
    for asset in ctx.held_assets() {
        let quantity = ctx.held_quantity(&asset);
        let mark = resolve_mark(
            &asset,
            ctx.market.get(&asset),
            ctx.fallback_marks.get(&asset).copied(),
        )?;
        let value = quantity * mark;
        valuation.position_value += value;
        valuation.per_asset_value.insert(asset, value);
    }
    valuation.total_value = ctx.cash_balance + valuation.position_value;
    Ok(valuation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn market_row(bid: Option<f64>, ask: Option<f64>, close: Option<f64>) -> AssetMarketData {
        AssetMarketData {
            hour_ts: 0,
            asset: "BTC-USDT".to_string(),
            cluster_id: "l1".to_string(),
            bid_px: bid,
            bid_sz: bid.map(|_| 1.0),
            ask_px: ask,
            ask_sz: ask.map(|_| 1.0),
            ohlcv_close: close,
            volatility: 0.02,
        }
    }

    #[test]
    fn test_mark_prefers_book_midpoint() {
        let row = market_row(Some(99.0), Some(101.0), Some(95.0));
        let mark = resolve_mark("BTC-USDT", Some(&row), Some(90.0)).unwrap();
        assert_relative_eq!(mark, 100.0);
    }

    #[test]
    fn test_mark_falls_back_to_bar_close() {
        let row = market_row(None, None, Some(95.0));
        let mark = resolve_mark("BTC-USDT", Some(&row), Some(90.0)).unwrap();
        assert_relative_eq!(mark, 95.0);
    }

    #[test]
    fn test_mark_falls_back_to_last_fill() {
        let mark = resolve_mark("BTC-USDT", None, Some(90.0)).unwrap();
        assert_relative_eq!(mark, 90.0);
    }

    #[test]
    fn test_mark_missing_is_abort() {
        let err = resolve_mark("BTC-USDT", None, None).unwrap_err();
        assert!(matches!(err, AppError::MarkSourceMissing(_)));
    }
}
