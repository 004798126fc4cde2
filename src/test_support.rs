//! 测试构造器
//!
//! 单元测试与集成测试共用的领域对象工厂，参数取一组便于心算的
//! 基准值，各测试在此基础上微调。

use std::collections::BTreeMap;

use crate::context::{HourContext, OpenLot};
use crate::domain::entities::*;
use crate::domain::enums::*;
use crate::domain::HourScope;
use crate::hashing::GENESIS_HASH;
use crate::time_util::{hour_bucket, HOUR_MS};

/// 基准风控配置
pub fn test_profile() -> RiskProfile {
    RiskProfile {
        profile_id: "default".to_string(),
        version: 1,
        max_concurrent_positions: 3,
        exposure_mode: ExposureMode::PercentOfPv,
        max_total_exposure: 60.0,
        max_cluster_exposure: 40.0,
        drawdown_soft_pct: 0.10,
        drawdown_hard_pct: 0.20,
        base_entry_fraction: 0.10,
        vol_target: 0.02,
        vol_scale_floor: 0.5,
        vol_scale_cap: 1.5,
        severe_loss_pct: 0.15,
        recovery_hold_prob: 0.65,
        recovery_partial_prob: 0.45,
        adaptive_continue_prob: 0.40,
        strong_positive_prob: 0.70,
        positive_prob: 0.55,
        negative_prob: 0.45,
        strong_negative_prob: 0.30,
        persistence_bars: 2,
        dip_rebound_prob: 0.60,
        min_rebound_prob: 0.50,
        max_spread_bps: 50.0,
        min_book_depth: 1.0,
        derisk_fraction: 0.5,
        fee_rate: 0.004,
        slippage_bps: 20.0,
    }
}

/// 开放区间的配置生效记录
pub fn test_assignment(account_id: &str) -> RiskProfileAssignment {
    RiskProfileAssignment {
        account_id: account_id.to_string(),
        profile_id: "default".to_string(),
        profile_version: 1,
        effective_from_ts: 0,
        effective_to_ts: None,
    }
}

/// 回测运行上下文，初始资金 10000
pub fn test_run_context(run_id: &str, account_id: &str) -> RunContext {
    RunContext {
        run_id: run_id.to_string(),
        account_id: account_id.to_string(),
        run_mode: RunMode::Backtest,
        origin_hour_ts: 0,
        initial_capital: Some(10_000.0),
    }
}

/// 盘口完整的市场行，点差 20bps 附近
pub fn test_market(hour_ts: i64, asset: &str, mid: f64) -> AssetMarketData {
    AssetMarketData {
        hour_ts,
        asset: asset.to_string(),
        cluster_id: "l1".to_string(),
        bid_px: Some(mid * 0.999),
        bid_sz: Some(100.0),
        ask_px: Some(mid * 1.001),
        ask_sz: Some(100.0),
        ohlcv_close: Some(mid),
        volatility: 0.02,
    }
}

pub fn test_prediction(asset: &str, direction_prob: f64) -> PredictionRecord {
    PredictionRecord {
        hour_ts: 0,
        asset: asset.to_string(),
        direction_prob,
        expected_move: 0.01,
        rebound_prob: 0.5,
        regime_posterior: 0.5,
    }
}

pub fn hour(n: i64) -> i64 {
    n * HOUR_MS
}

/// 手工构造的跨界批次
pub fn test_open_lot(id: &str, asset: &str, quantity: f64, price: f64, acquired_ts: i64) -> OpenLot {
    OpenLot {
        lot: PositionLot {
            lot_id: id.to_string(),
            run_id: "r1".to_string(),
            account_id: "acct".to_string(),
            asset: asset.to_string(),
            quantity,
            price,
            acquired_ts,
            hour_ts: hour_bucket(acquired_ts),
            fill_hash: GENESIS_HASH.to_string(),
            row_hash: String::new(),
        }
        .seal(),
        remaining: quantity,
    }
}

/// 装载器旁路：直接拼一个小时上下文（生命周期/决策层测试用）
pub fn test_hour_context(
    hour_ts: i64,
    cash_balance: f64,
    open_lots: Vec<OpenLot>,
    market: Vec<AssetMarketData>,
    predictions: Vec<PredictionRecord>,
) -> HourContext {
    HourContext {
        scope: HourScope::new("r1", "acct", hour_ts),
        run: test_run_context("r1", "acct"),
        profile: test_profile(),
        open_lots,
        cash_balance,
        ledger_head_hash: GENESIS_HASH.to_string(),
        prior_risk: None,
        market: market.into_iter().map(|m| (m.asset.clone(), m)).collect(),
        predictions: predictions
            .into_iter()
            .map(|p| (p.asset.clone(), p))
            .collect(),
        fallback_marks: BTreeMap::new(),
        seed_hash: "seed-for-tests".to_string(),
    }
}

/// 手工信号（生命周期层测试直接喂给订单引擎）
pub fn test_signal(
    ctx: &HourContext,
    asset: &str,
    action: SignalAction,
    size_fraction: f64,
    reason_code: &str,
) -> TradeSignal {
    TradeSignal {
        signal_id: TradeSignal::make_id(&ctx.scope.run_id, ctx.scope.hour_ts, asset, action),
        run_id: ctx.scope.run_id.clone(),
        account_id: ctx.scope.account_id.clone(),
        hour_ts: ctx.scope.hour_ts,
        asset: asset.to_string(),
        action,
        signal_class: SignalClass::Neutral,
        size_fraction,
        reason_code: reason_code.to_string(),
        drawdown_state: DrawdownState::Normal,
        profile_id: "default".to_string(),
        profile_version: 1,
        seed_hash: ctx.seed_hash.clone(),
        row_hash: String::new(),
    }
    .seal()
}
