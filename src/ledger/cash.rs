//! 现金流水构建
//!
//! 一笔成交一条流水，按成交产生顺序串链。链首 prev_hash 来自
//! 上下文（前小时流水尾，或回测链首的 genesis 哨兵），余额连续性
//! 在构建时就是定义而不是事后校验。

use crate::context::HourContext;
use crate::domain::entities::{CashLedgerEntry, OrderFill};
use crate::domain::enums::OrderSide;

/// 成交的现金变动
pub fn fill_delta(fill: &OrderFill) -> f64 {
    match fill.side {
        OrderSide::Buy => -(fill.notional + fill.fee_paid + fill.slippage_cost),
        OrderSide::Sell => fill.notional - fill.fee_paid - fill.slippage_cost,
    }
}

/// 从小时内成交序列构建完整流水链
pub fn build_ledger_entries(ctx: &HourContext, fills: &[OrderFill]) -> Vec<CashLedgerEntry> {
    let mut entries = Vec::with_capacity(fills.len());
    let mut balance = ctx.cash_balance;
    let mut prev_hash = ctx.ledger_head_hash.clone();

    for fill in fills {
        let delta = fill_delta(fill);
        let entry = CashLedgerEntry {
            entry_id: CashLedgerEntry::make_id(&fill.fill_id),
            run_id: ctx.scope.run_id.clone(),
            account_id: ctx.scope.account_id.clone(),
            hour_ts: ctx.scope.hour_ts,
            fill_id: fill.fill_id.clone(),
            side: fill.side,
            delta,
            balance_before: balance,
            balance_after: balance + delta,
            prev_hash: prev_hash.clone(),
            fill_hash: fill.row_hash.clone(),
            row_hash: String::new(),
        }
        .seal();
        balance = entry.balance_after;
        prev_hash = entry.row_hash.clone();
        entries.push(entry);
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enums::PriceSource;
    use approx::assert_relative_eq;

    fn fill(side: OrderSide, notional: f64, fee: f64, slippage: f64) -> OrderFill {
        OrderFill {
            fill_id: "req:a0:f".to_string(),
            request_id: "req:a0".to_string(),
            logical_order_id: "req".to_string(),
            run_id: "r".to_string(),
            account_id: "a".to_string(),
            hour_ts: 0,
            asset: "BTC-USDT".to_string(),
            side,
            price: 100.0,
            quantity: notional / 100.0,
            notional,
            fee_paid: fee,
            slippage_cost: slippage,
            price_source: PriceSource::BookTop,
            fill_ts: 0,
            request_hash: "parent".to_string(),
            row_hash: "fillhash".to_string(),
        }
    }

    #[test]
    fn test_buy_delta_includes_all_costs() {
        // 名义 500、费 2、滑点 1 → 现金变动 -503
        let f = fill(OrderSide::Buy, 500.0, 2.0, 1.0);
        assert_relative_eq!(fill_delta(&f), -503.0);
    }

    #[test]
    fn test_sell_delta_nets_costs() {
        let f = fill(OrderSide::Sell, 500.0, 2.0, 1.0);
        assert_relative_eq!(fill_delta(&f), 497.0);
    }
}
