//! 小时执行单元编排
//!
//! 装载 → 决策 → 订单生命周期 → 流水/小时态 → 根哈希 → 事务提交，
//! 一个小时一个原子单元。任何 Err 都意味着本小时零写入。

use tracing::info;

use crate::context::load_hour_context;
use crate::decision::{decide_hour, RiskEvent};
use crate::domain::HourScope;
use crate::error::AppResult;
use crate::ledger::{build_hourly_states, build_ledger_entries, commit_hour_rows, CommitStats};
use crate::lifecycle::{run_lifecycle, ExchangeAdapter};
use crate::replay::build_manifest;
use crate::store::{ReplayRow, RowSink, SnapshotReader};

/// 一次小时执行的结果摘要
#[derive(Debug)]
pub struct HourReport {
    pub scope: HourScope,
    pub seed_hash: String,
    pub root_hash: String,
    pub signal_count: usize,
    pub order_count: usize,
    pub fill_count: usize,
    pub trade_count: usize,
    pub risk_events: Vec<RiskEvent>,
    pub stats: CommitStats,
    pub cash_balance: f64,
    pub total_value: f64,
}

/// 执行一个 (run, account, hour) 单元
pub async fn execute_hour<S, A>(store: &S, adapter: &A, scope: &HourScope) -> AppResult<HourReport>
where
    S: SnapshotReader + RowSink + ?Sized,
    A: ExchangeAdapter + ?Sized,
{
    let ctx = load_hour_context(store, scope).await?;
    let decision = decide_hour(store, &ctx).await?;
    let lifecycle = run_lifecycle(&ctx, &decision.signals, adapter).await?;

    let ledger = build_ledger_entries(&ctx, &lifecycle.fills);
    let last_ledger_hash = ledger
        .last()
        .map(|e| e.row_hash.clone())
        .unwrap_or_default();
    let hourly = build_hourly_states(
        &ctx,
        &decision.drawdown,
        &lifecycle.lot_book,
        lifecycle.cash_balance,
        &last_ledger_hash,
    )?;

    let mut rows: Vec<ReplayRow> = Vec::new();
    rows.extend(decision.signals.iter().cloned().map(ReplayRow::Signal));
    rows.extend(lifecycle.orders.iter().cloned().map(ReplayRow::Order));
    rows.extend(lifecycle.fills.iter().cloned().map(ReplayRow::Fill));
    rows.extend(lifecycle.new_lots.iter().cloned().map(ReplayRow::Lot));
    rows.extend(
        lifecycle
            .allocations
            .iter()
            .cloned()
            .map(ReplayRow::Allocation),
    );
    rows.extend(lifecycle.trades.iter().cloned().map(ReplayRow::Trade));
    rows.extend(ledger.iter().cloned().map(ReplayRow::Ledger));
    rows.push(ReplayRow::Portfolio(hourly.portfolio.clone()));
    rows.push(ReplayRow::Risk(hourly.risk.clone()));
    rows.extend(hourly.clusters.iter().cloned().map(ReplayRow::Cluster));

    let manifest = build_manifest(scope, &ctx.seed_hash, &rows)?;
    let stats = commit_hour_rows(store, scope, &rows, &manifest).await?;

    let report = HourReport {
        scope: scope.clone(),
        seed_hash: ctx.seed_hash.clone(),
        root_hash: manifest.root_hash.clone(),
        signal_count: decision.signals.len(),
        order_count: lifecycle.orders.len(),
        fill_count: lifecycle.fills.len(),
        trade_count: lifecycle.trades.len(),
        risk_events: decision.risk_events,
        stats,
        cash_balance: hourly.portfolio.cash_balance,
        total_value: hourly.portfolio.total_value,
    };
    info!(
        scope = %report.scope,
        signals = report.signal_count,
        fills = report.fill_count,
        total_value = report.total_value,
        root = %report.root_hash,
        "小时执行单元完成"
    );
    Ok(report)
}
