//! 订单生命周期语义测试（手工上下文 + 模拟盘）

use approx::assert_relative_eq;

use quant_replay::decision::reason;
use quant_replay::domain::enums::{AttemptStatus, SignalAction};
use quant_replay::lifecycle::{
    run_lifecycle, SimulatedExchange, SimulatorConfig, RETRY_OFFSETS_MIN,
};
use quant_replay::test_support::*;

fn adapter_for(ctx: &quant_replay::context::HourContext) -> SimulatedExchange {
    SimulatedExchange::new(ctx.market.clone(), SimulatorConfig::from_profile(&ctx.profile))
}

#[tokio::test]
async fn test_sell_consumes_lots_fifo() -> anyhow::Result<()> {
    // 持有 1.0@100 + 2.0@110，减仓一半（1.5）：第一批吃光，第二批吃 0.5
    let ctx = test_hour_context(
        hour(2),
        1_000.0,
        vec![
            test_open_lot("lot:a", "ETH-USDT", 1.0, 100.0, hour(1) + 1),
            test_open_lot("lot:b", "ETH-USDT", 2.0, 110.0, hour(1) + 2),
        ],
        vec![test_market(hour(2), "ETH-USDT", 120.0)],
        vec![],
    );
    let signal = test_signal(&ctx, "ETH-USDT", SignalAction::DeRisk, 0.5, reason::ADAPTIVE_DERISK);

    let out = run_lifecycle(&ctx, &[signal], &adapter_for(&ctx)).await?;

    assert_eq!(out.fills.len(), 1);
    assert_relative_eq!(out.fills[0].quantity, 1.5);
    assert_eq!(out.allocations.len(), 2);
    assert_eq!(out.allocations[0].lot_id, "lot:a");
    assert_relative_eq!(out.allocations[0].quantity, 1.0);
    assert_relative_eq!(out.allocations[0].cost_basis, 100.0);
    assert_eq!(out.allocations[1].lot_id, "lot:b");
    assert_relative_eq!(out.allocations[1].quantity, 0.5);
    assert_relative_eq!(out.allocations[1].cost_basis, 55.0);

    assert_eq!(out.trades.len(), 1);
    let trade = &out.trades[0];
    let proceeds = 119.88 * 1.5; // 买一价成交
    assert_relative_eq!(trade.proceeds, proceeds, epsilon = 1e-9);
    assert_relative_eq!(trade.cost_basis, 155.0);
    assert_relative_eq!(
        trade.net_pnl,
        proceeds - 155.0 - trade.fee - trade.slippage,
        epsilon = 1e-9
    );
    assert_eq!(trade.opened_ts, hour(1) + 1);

    assert_relative_eq!(out.lot_book.available("ETH-USDT"), 1.5);
    Ok(())
}

#[tokio::test]
async fn test_no_liquidity_exhausts_all_attempts() -> anyhow::Result<()> {
    let mut market = test_market(hour(2), "BTC-USDT", 100.0);
    market.bid_px = None;
    market.bid_sz = None;
    market.ask_px = None;
    market.ask_sz = None;
    market.ohlcv_close = None;
    let ctx = test_hour_context(
        hour(2),
        1_000.0,
        vec![test_open_lot("lot:a", "BTC-USDT", 1.0, 100.0, hour(1))],
        vec![market],
        vec![],
    );
    let signal = test_signal(&ctx, "BTC-USDT", SignalAction::Exit, 1.0, reason::RECOVERY_EXIT);

    let out = run_lifecycle(&ctx, &[signal], &adapter_for(&ctx)).await?;

    assert_eq!(out.orders.len(), RETRY_OFFSETS_MIN.len());
    assert!(out.fills.is_empty());
    assert!(out.trades.is_empty());
    assert_relative_eq!(out.cash_balance, 1_000.0);
    for (i, order) in out.orders.iter().enumerate() {
        assert_eq!(order.attempt_index, i as i32);
        assert_eq!(order.scheduled_offset_min, RETRY_OFFSETS_MIN[i]);
        assert_relative_eq!(order.quantity, 1.0);
    }
    assert!(out.orders[..3]
        .iter()
        .all(|o| o.status == AttemptStatus::RetryScheduled));
    let last = out.orders.last().unwrap();
    assert_eq!(last.status, AttemptStatus::Exhausted);
    assert_eq!(last.reason_code, reason::RETRY_EXHAUSTED);
    // 持仓原样保留
    assert_relative_eq!(out.lot_book.available("BTC-USDT"), 1.0);
    Ok(())
}

#[tokio::test]
async fn test_oversell_rejected_in_full() -> anyhow::Result<()> {
    // 持有 3，卖 5：整单拒绝，一股也不卖
    let ctx = test_hour_context(
        hour(2),
        1_000.0,
        vec![test_open_lot("lot:a", "ETH-USDT", 3.0, 100.0, hour(1))],
        vec![test_market(hour(2), "ETH-USDT", 100.0)],
        vec![],
    );
    let signal = test_signal(&ctx, "ETH-USDT", SignalAction::Exit, 5.0 / 3.0, reason::RECOVERY_EXIT);

    let out = run_lifecycle(&ctx, &[signal], &adapter_for(&ctx)).await?;

    assert_eq!(out.orders.len(), 1);
    let order = &out.orders[0];
    assert_eq!(order.status, AttemptStatus::Exhausted);
    assert_eq!(order.reason_code, reason::NO_SHORTING);
    assert_relative_eq!(order.quantity, 5.0, epsilon = 1e-9);
    assert!(out.fills.is_empty());
    assert!(out.allocations.is_empty());
    assert_relative_eq!(out.lot_book.available("ETH-USDT"), 3.0);
    assert_relative_eq!(out.cash_balance, 1_000.0);
    Ok(())
}

#[tokio::test]
async fn test_buy_sized_from_start_of_hour_cash() -> anyhow::Result<()> {
    // 同小时先平 ETH 再开 BTC：卖出回笼的现金不得放大买入名义
    let ctx = test_hour_context(
        hour(2),
        1_000.0,
        vec![test_open_lot("lot:a", "ETH-USDT", 10.0, 100.0, hour(1))],
        vec![
            test_market(hour(2), "BTC-USDT", 100.0),
            test_market(hour(2), "ETH-USDT", 100.0),
        ],
        vec![],
    );
    let exit = test_signal(&ctx, "ETH-USDT", SignalAction::Exit, 1.0, reason::RECOVERY_EXIT);
    let enter = test_signal(&ctx, "BTC-USDT", SignalAction::Enter, 0.1, reason::ENTRY_SIGNAL);

    let out = run_lifecycle(&ctx, &[exit, enter], &adapter_for(&ctx)).await?;

    assert_eq!(out.fills.len(), 2);
    let buy = out
        .fills
        .iter()
        .find(|f| f.asset == "BTC-USDT")
        .expect("buy fill");
    // 卖出后现金约 1993，但核准名义仍按小时起点的 1000 折算
    assert_relative_eq!(buy.notional, 0.1 * 1_000.0, epsilon = 1e-9);
    assert_relative_eq!(buy.quantity, 100.0 / 100.1, epsilon = 1e-9);
    Ok(())
}

#[tokio::test]
async fn test_buy_capped_by_cash_with_costs() -> anyhow::Result<()> {
    // 全仓买入：名义连同费用与滑点不得超过可用现金
    let ctx = test_hour_context(
        hour(2),
        1_000.0,
        vec![],
        vec![test_market(hour(2), "BTC-USDT", 100.0)],
        vec![],
    );
    let signal = test_signal(&ctx, "BTC-USDT", SignalAction::Enter, 1.0, reason::ENTRY_SIGNAL);

    let out = run_lifecycle(&ctx, &[signal], &adapter_for(&ctx)).await?;

    assert_eq!(out.fills.len(), 1);
    assert_relative_eq!(out.fills[0].notional, 1_000.0 / 1.006, epsilon = 1e-9);
    assert!(out.cash_balance >= -1e-9);
    assert_relative_eq!(out.cash_balance, 0.0, epsilon = 1e-9);
    Ok(())
}

#[tokio::test]
async fn test_partial_fills_roll_into_retries() -> anyhow::Result<()> {
    // 卖一档深度 2.0：每次尝试最多成交 2.0，剩量滚入下一次尝试
    let mut market = test_market(hour(2), "BTC-USDT", 100.0);
    market.ask_sz = Some(2.0);
    let ctx = test_hour_context(hour(2), 10_000.0, vec![], vec![market], vec![]);
    let signal = test_signal(&ctx, "BTC-USDT", SignalAction::Enter, 0.1, reason::ENTRY_SIGNAL);

    let out = run_lifecycle(&ctx, &[signal], &adapter_for(&ctx)).await?;

    // 目标 ≈ 9.99，4 次尝试 × 2.0 仍未吃完
    assert_eq!(out.orders.len(), RETRY_OFFSETS_MIN.len());
    assert_eq!(out.fills.len(), RETRY_OFFSETS_MIN.len());
    assert_eq!(out.new_lots.len(), RETRY_OFFSETS_MIN.len());
    assert!(out
        .orders
        .iter()
        .all(|o| o.status == AttemptStatus::PartiallyFilled));
    for fill in &out.fills {
        assert_relative_eq!(fill.quantity, 2.0);
    }
    // 每次尝试的请求量 = 逻辑订单剩余量
    let initial = 0.1 * 10_000.0 / 100.1;
    assert_relative_eq!(out.orders[0].quantity, initial, epsilon = 1e-9);
    assert_relative_eq!(out.orders[1].quantity, initial - 2.0, epsilon = 1e-9);
    assert_relative_eq!(out.orders[3].quantity, initial - 6.0, epsilon = 1e-9);
    assert_relative_eq!(out.lot_book.available("BTC-USDT"), 8.0);
    Ok(())
}
