//! 小时态物化
//!
//! 小时结束时的组合、风控、簇敞口三类行。估值复用与决策相同的
//! 标记来源链；风控行固化的是本小时实际生效的回撤档位。

use std::collections::BTreeMap;

use crate::context::HourContext;
use crate::domain::entities::*;
use crate::error::AppResult;
use crate::lifecycle::LotBook;
use crate::risk::drawdown::DrawdownAssessment;
use crate::risk::marks::resolve_mark;
use crate::risk::resolve_exposure_limit;

/// 三类小时态行
#[derive(Debug)]
pub struct HourlyStates {
    pub portfolio: PortfolioHourlyState,
    pub risk: RiskHourlyState,
    pub clusters: Vec<ClusterExposureHourlyState>,
}

/// 由小时末状态构建全部小时态行
pub fn build_hourly_states(
    ctx: &HourContext,
    drawdown: &DrawdownAssessment,
    lot_book: &LotBook,
    cash_balance: f64,
    last_ledger_hash: &str,
) -> AppResult<HourlyStates> {
    // 小时末估值：剩余批次 × 标记
    let mut per_asset_value: BTreeMap<String, f64> = BTreeMap::new();
    for entry in lot_book.open_lots() {
        let asset = entry.lot.asset.clone();
        let mark = resolve_mark(
            &asset,
            ctx.market.get(&asset),
            ctx.fallback_marks.get(&asset).copied(),
        )?;
        *per_asset_value.entry(asset).or_insert(0.0) += entry.remaining * mark;
    }
    let position_value: f64 = per_asset_value.values().sum();
    let total_value = cash_balance + position_value;

    let portfolio = PortfolioHourlyState {
        state_id: PortfolioHourlyState::make_id(
            &ctx.scope.run_id,
            &ctx.scope.account_id,
            ctx.scope.hour_ts,
        ),
        run_id: ctx.scope.run_id.clone(),
        account_id: ctx.scope.account_id.clone(),
        hour_ts: ctx.scope.hour_ts,
        cash_balance,
        position_value,
        total_value,
        open_position_count: lot_book.open_position_count(),
        seed_hash: ctx.seed_hash.clone(),
        last_ledger_hash: last_ledger_hash.to_string(),
        row_hash: String::new(),
    }
    .seal();

    let risk = RiskHourlyState {
        state_id: RiskHourlyState::make_id(
            &ctx.scope.run_id,
            &ctx.scope.account_id,
            ctx.scope.hour_ts,
        ),
        run_id: ctx.scope.run_id.clone(),
        account_id: ctx.scope.account_id.clone(),
        hour_ts: ctx.scope.hour_ts,
        drawdown_state: drawdown.state,
        drawdown_pct: drawdown.drawdown_pct,
        peak_value: drawdown.peak_value,
        kill_switch_active: drawdown.kill_switch_active,
        seed_hash: ctx.seed_hash.clone(),
        row_hash: String::new(),
    }
    .seal();

    // 簇敞口：持仓资产按簇聚合，无市场行的资产归入 unknown 簇
    let mut per_cluster: BTreeMap<String, f64> = BTreeMap::new();
    for (asset, value) in &per_asset_value {
        let cluster_id = ctx
            .market
            .get(asset)
            .map(|m| m.cluster_id.clone())
            .unwrap_or_else(|| "unknown".to_string());
        *per_cluster.entry(cluster_id).or_insert(0.0) += value;
    }
    let cluster_limit = resolve_exposure_limit(
        ctx.profile.exposure_mode,
        ctx.profile.max_cluster_exposure,
        total_value,
    );
    let clusters = per_cluster
        .into_iter()
        .map(|(cluster_id, exposure_value)| {
            ClusterExposureHourlyState {
                state_id: ClusterExposureHourlyState::make_id(
                    &ctx.scope.run_id,
                    &ctx.scope.account_id,
                    ctx.scope.hour_ts,
                    &cluster_id,
                ),
                run_id: ctx.scope.run_id.clone(),
                account_id: ctx.scope.account_id.clone(),
                hour_ts: ctx.scope.hour_ts,
                cluster_id,
                exposure_value,
                exposure_limit: cluster_limit,
                exposure_mode: ctx.profile.exposure_mode,
                seed_hash: ctx.seed_hash.clone(),
                row_hash: String::new(),
            }
            .seal()
        })
        .collect();

    Ok(HourlyStates {
        portfolio,
        risk,
        clusters,
    })
}
