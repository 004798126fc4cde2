//! 小时执行单元的端到端测试（内存存储 + 模拟盘）

use approx::assert_relative_eq;

use quant_replay::context::load_hour_context;
use quant_replay::domain::enums::RunMode;
use quant_replay::domain::HourScope;
use quant_replay::error::AppError;
use quant_replay::executor::execute_hour;
use quant_replay::lifecycle::{SimulatedExchange, SimulatorConfig};
use quant_replay::store::row::RowTable;
use quant_replay::store::{MemoryStore, ReplayRow, RowSink, SnapshotReader};
use quant_replay::test_support::*;

/// 单资产入场剧本：hour(1) 正向预测铺垫持续性，hour(2) 执行
async fn entry_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.seed_run_context(test_run_context("r1", "acct")).await;
    store.seed_profile(test_profile()).await;
    store.seed_assignment(test_assignment("acct")).await;
    store.seed_market(test_market(hour(2), "BTC-USDT", 100.0)).await;
    let mut prior = test_prediction("BTC-USDT", 0.60);
    prior.hour_ts = hour(1);
    store.seed_prediction(prior).await;
    let mut current = test_prediction("BTC-USDT", 0.60);
    current.hour_ts = hour(2);
    store.seed_prediction(current).await;
    store
}

fn sim_for(store_market: quant_replay::domain::entities::AssetMarketData) -> SimulatedExchange {
    let mut map = std::collections::BTreeMap::new();
    map.insert(store_market.asset.clone(), store_market);
    SimulatedExchange::new(map, SimulatorConfig::from_profile(&test_profile()))
}

#[tokio::test]
async fn test_entry_hour_books_everything() -> anyhow::Result<()> {
    let store = entry_store().await;
    let scope = HourScope::new("r1", "acct", hour(2));
    let adapter = sim_for(test_market(hour(2), "BTC-USDT", 100.0));

    let report = execute_hour(&store, &adapter, &scope).await?;

    assert_eq!(report.signal_count, 1);
    assert_eq!(report.order_count, 1);
    assert_eq!(report.fill_count, 1);
    assert_eq!(report.trade_count, 0);
    // 名义 1000（10% 资金），费 4、滑点 2 → 现金 8994
    assert_relative_eq!(report.cash_balance, 8_994.0, epsilon = 1e-6);
    // 信号/订单/成交/批次/流水 + 组合/风控/簇 = 8 行 + 清单
    assert_eq!(report.stats.inserted, 9);
    assert_eq!(report.stats.matched, 0);
    assert_eq!(store.committed_row_count(&scope).await, 8);

    let rows = store.hour_rows("r1", "acct", hour(2)).await?;
    let ledger: Vec<_> = rows
        .iter()
        .filter(|r| r.table() == RowTable::CashLedger)
        .collect();
    assert_eq!(ledger.len(), 1);
    let ReplayRow::Ledger(entry) = ledger[0] else {
        panic!("expected ledger row");
    };
    assert_relative_eq!(entry.balance_before, 10_000.0);
    assert_relative_eq!(entry.balance_after, 8_994.0, epsilon = 1e-6);
    assert_relative_eq!(entry.delta, -1_006.0, epsilon = 1e-6);
    Ok(())
}

#[tokio::test]
async fn test_same_inputs_same_root() -> anyhow::Result<()> {
    let scope = HourScope::new("r1", "acct", hour(2));
    let first = {
        let store = entry_store().await;
        let adapter = sim_for(test_market(hour(2), "BTC-USDT", 100.0));
        execute_hour(&store, &adapter, &scope).await?
    };
    let second = {
        let store = entry_store().await;
        let adapter = sim_for(test_market(hour(2), "BTC-USDT", 100.0));
        execute_hour(&store, &adapter, &scope).await?
    };
    assert_eq!(first.seed_hash, second.seed_hash);
    assert_eq!(first.root_hash, second.root_hash);
    Ok(())
}

#[tokio::test]
async fn test_re_execution_is_idempotent() -> anyhow::Result<()> {
    let store = entry_store().await;
    let scope = HourScope::new("r1", "acct", hour(2));
    let adapter = sim_for(test_market(hour(2), "BTC-USDT", 100.0));

    let first = execute_hour(&store, &adapter, &scope).await?;
    let second = execute_hour(&store, &adapter, &scope).await?;

    assert_eq!(second.root_hash, first.root_hash);
    assert_eq!(second.stats.inserted, 0);
    assert_eq!(second.stats.matched, 9);
    assert_eq!(store.committed_row_count(&scope).await, 8);
    Ok(())
}

#[tokio::test]
async fn test_consecutive_hours_chain_ledger() -> anyhow::Result<()> {
    let store = entry_store().await;
    let scope2 = HourScope::new("r1", "acct", hour(2));
    let adapter2 = sim_for(test_market(hour(2), "BTC-USDT", 100.0));
    execute_hour(&store, &adapter2, &scope2).await?;

    // hour(3)：弱负向预测触发部分减仓，消耗 hour(2) 开的批次
    store.seed_market(test_market(hour(3), "BTC-USDT", 100.0)).await;
    let mut next = test_prediction("BTC-USDT", 0.35);
    next.hour_ts = hour(3);
    store.seed_prediction(next).await;

    let scope3 = HourScope::new("r1", "acct", hour(3));
    let adapter3 = sim_for(test_market(hour(3), "BTC-USDT", 100.0));
    let report = execute_hour(&store, &adapter3, &scope3).await?;
    assert_eq!(report.fill_count, 1);
    assert_eq!(report.trade_count, 1);

    let rows2 = store.hour_rows("r1", "acct", hour(2)).await?;
    let rows3 = store.hour_rows("r1", "acct", hour(3)).await?;

    // 流水跨小时串链：余额与哈希都衔接上一小时的尾部
    let tail2 = rows2
        .iter()
        .find_map(|r| match r {
            ReplayRow::Ledger(e) => Some(e.clone()),
            _ => None,
        })
        .expect("hour 2 ledger entry");
    let entry3 = rows3
        .iter()
        .find_map(|r| match r {
            ReplayRow::Ledger(e) => Some(e.clone()),
            _ => None,
        })
        .expect("hour 3 ledger entry");
    assert_relative_eq!(tail2.balance_after, 8_994.0, epsilon = 1e-6);
    assert_relative_eq!(entry3.balance_before, tail2.balance_after, epsilon = 1e-9);
    assert_eq!(entry3.prev_hash, tail2.row_hash);

    // 减仓分配回指前小时开的批次
    let lot2 = rows2
        .iter()
        .find_map(|r| match r {
            ReplayRow::Lot(l) => Some(l.clone()),
            _ => None,
        })
        .expect("hour 2 lot");
    let alloc3 = rows3
        .iter()
        .find_map(|r| match r {
            ReplayRow::Allocation(a) => Some(a.clone()),
            _ => None,
        })
        .expect("hour 3 allocation");
    assert_eq!(alloc3.lot_id, lot2.lot_id);

    // 峰值跨小时滚动：hour(2) 决策时组合 10000，hour(3) 不回落
    let risk3 = rows3
        .iter()
        .find_map(|r| match r {
            ReplayRow::Risk(s) => Some(s.clone()),
            _ => None,
        })
        .expect("hour 3 risk state");
    assert_relative_eq!(risk3.peak_value, 10_000.0, epsilon = 1e-6);
    Ok(())
}

#[tokio::test]
async fn test_missing_assignment_aborts() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    store.seed_run_context(test_run_context("r1", "acct")).await;
    store.seed_profile(test_profile()).await;
    let scope = HourScope::new("r1", "acct", hour(2));
    let err = load_hour_context(&store, &scope).await.unwrap_err();
    assert!(matches!(err, AppError::PreconditionAbort(_)));
    Ok(())
}

#[tokio::test]
async fn test_ambiguous_assignments_abort() -> anyhow::Result<()> {
    let store = entry_store().await;
    store.seed_assignment(test_assignment("acct")).await; // 第二条重叠区间
    let scope = HourScope::new("r1", "acct", hour(2));
    let err = load_hour_context(&store, &scope).await.unwrap_err();
    assert!(matches!(err, AppError::PreconditionAbort(_)));
    Ok(())
}

#[tokio::test]
async fn test_paper_without_ledger_aborts() -> anyhow::Result<()> {
    let store = entry_store().await;
    let mut run = test_run_context("r1", "acct");
    run.run_mode = RunMode::Paper;
    run.initial_capital = None;
    store.seed_run_context(run).await;
    let scope = HourScope::new("r1", "acct", hour(2));
    let err = load_hour_context(&store, &scope).await.unwrap_err();
    assert!(matches!(err, AppError::PreconditionAbort(_)));
    Ok(())
}

#[tokio::test]
async fn test_write_guard_blocks_commit() -> anyhow::Result<()> {
    let store = entry_store().await;
    store.set_writes_enabled(false, Some("migration".to_string())).await;
    let scope = HourScope::new("r1", "acct", hour(2));
    let adapter = sim_for(test_market(hour(2), "BTC-USDT", 100.0));
    let err = execute_hour(&store, &adapter, &scope).await.unwrap_err();
    assert!(matches!(err, AppError::WriteGuardRejected(_)));
    assert_eq!(store.committed_row_count(&scope).await, 0);
    Ok(())
}

#[tokio::test]
async fn test_held_asset_without_any_mark_aborts() -> anyhow::Result<()> {
    let store = entry_store().await;
    // hour(1) 留下一个孤儿批次：无市场行、无历史成交可回退
    let prior_scope = HourScope::new("r1", "acct", hour(1));
    store.begin_hour(&prior_scope).await?;
    store
        .insert_row(&ReplayRow::Lot(
            test_open_lot("lot:orphan", "DOGE-USDT", 10.0, 1.0, hour(1)).lot,
        ))
        .await?;
    store.commit_hour().await?;

    let scope = HourScope::new("r1", "acct", hour(2));
    let adapter = sim_for(test_market(hour(2), "BTC-USDT", 100.0));
    let err = execute_hour(&store, &adapter, &scope).await.unwrap_err();
    assert!(matches!(err, AppError::MarkSourceMissing(_)));
    Ok(())
}
