//! MySQL 行模型
//!
//! 每张表一个 FromRow 结构体，to_domain 负责枚举列的字符串解析。
//! 列名与规范化帧的字段名保持一致，排查哈希问题时可以直接对照。

use sqlx::FromRow;

use crate::domain::entities::*;
use crate::domain::enums::*;
use crate::error::{AppError, AppResult};

fn parse_enum<T>(parsed: Option<T>, column: &str, raw: &str) -> AppResult<T> {
    parsed.ok_or_else(|| AppError::Other(format!("invalid {} value: {}", column, raw)))
}

#[derive(Debug, FromRow)]
pub struct RunContextModel {
    pub run_id: String,
    pub account_id: String,
    pub run_mode: String,
    pub origin_hour_ts: i64,
    pub initial_capital: Option<f64>,
}

impl RunContextModel {
    pub fn to_domain(&self) -> AppResult<RunContext> {
        Ok(RunContext {
            run_id: self.run_id.clone(),
            account_id: self.account_id.clone(),
            run_mode: parse_enum(RunMode::from_str(&self.run_mode), "run_mode", &self.run_mode)?,
            origin_hour_ts: self.origin_hour_ts,
            initial_capital: self.initial_capital,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct RiskProfileModel {
    pub profile_id: String,
    pub version: i32,
    pub max_concurrent_positions: i32,
    pub exposure_mode: String,
    pub max_total_exposure: f64,
    pub max_cluster_exposure: f64,
    pub drawdown_soft_pct: f64,
    pub drawdown_hard_pct: f64,
    pub base_entry_fraction: f64,
    pub vol_target: f64,
    pub vol_scale_floor: f64,
    pub vol_scale_cap: f64,
    pub severe_loss_pct: f64,
    pub recovery_hold_prob: f64,
    pub recovery_partial_prob: f64,
    pub adaptive_continue_prob: f64,
    pub strong_positive_prob: f64,
    pub positive_prob: f64,
    pub negative_prob: f64,
    pub strong_negative_prob: f64,
    pub persistence_bars: i32,
    pub dip_rebound_prob: f64,
    pub min_rebound_prob: f64,
    pub max_spread_bps: f64,
    pub min_book_depth: f64,
    pub derisk_fraction: f64,
    pub fee_rate: f64,
    pub slippage_bps: f64,
}

impl RiskProfileModel {
    pub fn to_domain(&self) -> AppResult<RiskProfile> {
        Ok(RiskProfile {
            profile_id: self.profile_id.clone(),
            version: self.version,
            max_concurrent_positions: self.max_concurrent_positions,
            exposure_mode: parse_enum(
                ExposureMode::from_str(&self.exposure_mode),
                "exposure_mode",
                &self.exposure_mode,
            )?,
            max_total_exposure: self.max_total_exposure,
            max_cluster_exposure: self.max_cluster_exposure,
            drawdown_soft_pct: self.drawdown_soft_pct,
            drawdown_hard_pct: self.drawdown_hard_pct,
            base_entry_fraction: self.base_entry_fraction,
            vol_target: self.vol_target,
            vol_scale_floor: self.vol_scale_floor,
            vol_scale_cap: self.vol_scale_cap,
            severe_loss_pct: self.severe_loss_pct,
            recovery_hold_prob: self.recovery_hold_prob,
            recovery_partial_prob: self.recovery_partial_prob,
            adaptive_continue_prob: self.adaptive_continue_prob,
            strong_positive_prob: self.strong_positive_prob,
            positive_prob: self.positive_prob,
            negative_prob: self.negative_prob,
            strong_negative_prob: self.strong_negative_prob,
            persistence_bars: self.persistence_bars,
            dip_rebound_prob: self.dip_rebound_prob,
            min_rebound_prob: self.min_rebound_prob,
            max_spread_bps: self.max_spread_bps,
            min_book_depth: self.min_book_depth,
            derisk_fraction: self.derisk_fraction,
            fee_rate: self.fee_rate,
            slippage_bps: self.slippage_bps,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct AssignmentModel {
    pub account_id: String,
    pub profile_id: String,
    pub profile_version: i32,
    pub effective_from_ts: i64,
    pub effective_to_ts: Option<i64>,
}

impl AssignmentModel {
    pub fn to_domain(&self) -> RiskProfileAssignment {
        RiskProfileAssignment {
            account_id: self.account_id.clone(),
            profile_id: self.profile_id.clone(),
            profile_version: self.profile_version,
            effective_from_ts: self.effective_from_ts,
            effective_to_ts: self.effective_to_ts,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct MarketModel {
    pub hour_ts: i64,
    pub asset: String,
    pub cluster_id: String,
    pub bid_px: Option<f64>,
    pub bid_sz: Option<f64>,
    pub ask_px: Option<f64>,
    pub ask_sz: Option<f64>,
    pub ohlcv_close: Option<f64>,
    pub volatility: f64,
}

impl MarketModel {
    pub fn to_domain(&self) -> AssetMarketData {
        AssetMarketData {
            hour_ts: self.hour_ts,
            asset: self.asset.clone(),
            cluster_id: self.cluster_id.clone(),
            bid_px: self.bid_px,
            bid_sz: self.bid_sz,
            ask_px: self.ask_px,
            ask_sz: self.ask_sz,
            ohlcv_close: self.ohlcv_close,
            volatility: self.volatility,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PredictionModel {
    pub hour_ts: i64,
    pub asset: String,
    pub direction_prob: f64,
    pub expected_move: f64,
    pub rebound_prob: f64,
    pub regime_posterior: f64,
}

impl PredictionModel {
    pub fn to_domain(&self) -> PredictionRecord {
        PredictionRecord {
            hour_ts: self.hour_ts,
            asset: self.asset.clone(),
            direction_prob: self.direction_prob,
            expected_move: self.expected_move,
            rebound_prob: self.rebound_prob,
            regime_posterior: self.regime_posterior,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct ControlModel {
    pub scope: String,
    pub writes_enabled: bool,
    pub holder: Option<String>,
}

#[derive(Debug, FromRow)]
pub struct SignalModel {
    pub signal_id: String,
    pub run_id: String,
    pub account_id: String,
    pub hour_ts: i64,
    pub asset: String,
    pub action: String,
    pub signal_class: String,
    pub size_fraction: f64,
    pub reason_code: String,
    pub drawdown_state: String,
    pub profile_id: String,
    pub profile_version: i32,
    pub seed_hash: String,
    pub row_hash: String,
}

impl SignalModel {
    pub fn to_domain(&self) -> AppResult<TradeSignal> {
        Ok(TradeSignal {
            signal_id: self.signal_id.clone(),
            run_id: self.run_id.clone(),
            account_id: self.account_id.clone(),
            hour_ts: self.hour_ts,
            asset: self.asset.clone(),
            action: parse_enum(SignalAction::from_str(&self.action), "action", &self.action)?,
            signal_class: parse_enum(
                SignalClass::from_str(&self.signal_class),
                "signal_class",
                &self.signal_class,
            )?,
            size_fraction: self.size_fraction,
            reason_code: self.reason_code.clone(),
            drawdown_state: parse_enum(
                DrawdownState::from_str(&self.drawdown_state),
                "drawdown_state",
                &self.drawdown_state,
            )?,
            profile_id: self.profile_id.clone(),
            profile_version: self.profile_version,
            seed_hash: self.seed_hash.clone(),
            row_hash: self.row_hash.clone(),
        })
    }
}

#[derive(Debug, FromRow)]
pub struct OrderModel {
    pub request_id: String,
    pub logical_order_id: String,
    pub attempt_index: i32,
    pub scheduled_offset_min: i64,
    pub run_id: String,
    pub account_id: String,
    pub hour_ts: i64,
    pub asset: String,
    pub side: String,
    pub quantity: f64,
    pub status: String,
    pub reason_code: String,
    pub signal_hash: String,
    pub row_hash: String,
}

impl OrderModel {
    pub fn to_domain(&self) -> AppResult<OrderRequest> {
        Ok(OrderRequest {
            request_id: self.request_id.clone(),
            logical_order_id: self.logical_order_id.clone(),
            attempt_index: self.attempt_index,
            scheduled_offset_min: self.scheduled_offset_min,
            run_id: self.run_id.clone(),
            account_id: self.account_id.clone(),
            hour_ts: self.hour_ts,
            asset: self.asset.clone(),
            side: parse_enum(OrderSide::from_str(&self.side), "side", &self.side)?,
            quantity: self.quantity,
            status: parse_enum(AttemptStatus::from_str(&self.status), "status", &self.status)?,
            reason_code: self.reason_code.clone(),
            signal_hash: self.signal_hash.clone(),
            row_hash: self.row_hash.clone(),
        })
    }
}

#[derive(Debug, FromRow)]
pub struct FillModel {
    pub fill_id: String,
    pub request_id: String,
    pub logical_order_id: String,
    pub run_id: String,
    pub account_id: String,
    pub hour_ts: i64,
    pub asset: String,
    pub side: String,
    pub price: f64,
    pub quantity: f64,
    pub notional: f64,
    pub fee_paid: f64,
    pub slippage_cost: f64,
    pub price_source: String,
    pub fill_ts: i64,
    pub request_hash: String,
    pub row_hash: String,
}

impl FillModel {
    pub fn to_domain(&self) -> AppResult<OrderFill> {
        Ok(OrderFill {
            fill_id: self.fill_id.clone(),
            request_id: self.request_id.clone(),
            logical_order_id: self.logical_order_id.clone(),
            run_id: self.run_id.clone(),
            account_id: self.account_id.clone(),
            hour_ts: self.hour_ts,
            asset: self.asset.clone(),
            side: parse_enum(OrderSide::from_str(&self.side), "side", &self.side)?,
            price: self.price,
            quantity: self.quantity,
            notional: self.notional,
            fee_paid: self.fee_paid,
            slippage_cost: self.slippage_cost,
            price_source: parse_enum(
                PriceSource::from_str(&self.price_source),
                "price_source",
                &self.price_source,
            )?,
            fill_ts: self.fill_ts,
            request_hash: self.request_hash.clone(),
            row_hash: self.row_hash.clone(),
        })
    }
}

#[derive(Debug, FromRow)]
pub struct LotModel {
    pub lot_id: String,
    pub run_id: String,
    pub account_id: String,
    pub asset: String,
    pub quantity: f64,
    pub price: f64,
    pub acquired_ts: i64,
    pub hour_ts: i64,
    pub fill_hash: String,
    pub row_hash: String,
}

impl LotModel {
    pub fn to_domain(&self) -> PositionLot {
        PositionLot {
            lot_id: self.lot_id.clone(),
            run_id: self.run_id.clone(),
            account_id: self.account_id.clone(),
            asset: self.asset.clone(),
            quantity: self.quantity,
            price: self.price,
            acquired_ts: self.acquired_ts,
            hour_ts: self.hour_ts,
            fill_hash: self.fill_hash.clone(),
            row_hash: self.row_hash.clone(),
        }
    }
}

#[derive(Debug, FromRow)]
pub struct AllocationModel {
    pub allocation_id: String,
    pub run_id: String,
    pub account_id: String,
    pub lot_id: String,
    pub fill_id: String,
    pub asset: String,
    pub quantity: f64,
    pub cost_basis: f64,
    pub hour_ts: i64,
    pub lot_hash: String,
    pub fill_hash: String,
    pub row_hash: String,
}

impl AllocationModel {
    pub fn to_domain(&self) -> LotAllocation {
        LotAllocation {
            allocation_id: self.allocation_id.clone(),
            run_id: self.run_id.clone(),
            account_id: self.account_id.clone(),
            lot_id: self.lot_id.clone(),
            fill_id: self.fill_id.clone(),
            asset: self.asset.clone(),
            quantity: self.quantity,
            cost_basis: self.cost_basis,
            hour_ts: self.hour_ts,
            lot_hash: self.lot_hash.clone(),
            fill_hash: self.fill_hash.clone(),
            row_hash: self.row_hash.clone(),
        }
    }
}

#[derive(Debug, FromRow)]
pub struct TradeModel {
    pub trade_id: String,
    pub run_id: String,
    pub account_id: String,
    pub fill_id: String,
    pub asset: String,
    pub quantity: f64,
    pub proceeds: f64,
    pub cost_basis: f64,
    pub fee: f64,
    pub slippage: f64,
    pub net_pnl: f64,
    pub opened_ts: i64,
    pub closed_ts: i64,
    pub hour_ts: i64,
    pub fill_hash: String,
    pub row_hash: String,
}

impl TradeModel {
    pub fn to_domain(&self) -> ExecutedTrade {
        ExecutedTrade {
            trade_id: self.trade_id.clone(),
            run_id: self.run_id.clone(),
            account_id: self.account_id.clone(),
            fill_id: self.fill_id.clone(),
            asset: self.asset.clone(),
            quantity: self.quantity,
            proceeds: self.proceeds,
            cost_basis: self.cost_basis,
            fee: self.fee,
            slippage: self.slippage,
            net_pnl: self.net_pnl,
            opened_ts: self.opened_ts,
            closed_ts: self.closed_ts,
            hour_ts: self.hour_ts,
            fill_hash: self.fill_hash.clone(),
            row_hash: self.row_hash.clone(),
        }
    }
}

#[derive(Debug, FromRow)]
pub struct LedgerModel {
    pub entry_id: String,
    pub run_id: String,
    pub account_id: String,
    pub hour_ts: i64,
    pub fill_id: String,
    pub side: String,
    pub delta: f64,
    pub balance_before: f64,
    pub balance_after: f64,
    pub prev_hash: String,
    pub fill_hash: String,
    pub row_hash: String,
}

impl LedgerModel {
    pub fn to_domain(&self) -> AppResult<CashLedgerEntry> {
        Ok(CashLedgerEntry {
            entry_id: self.entry_id.clone(),
            run_id: self.run_id.clone(),
            account_id: self.account_id.clone(),
            hour_ts: self.hour_ts,
            fill_id: self.fill_id.clone(),
            side: parse_enum(OrderSide::from_str(&self.side), "side", &self.side)?,
            delta: self.delta,
            balance_before: self.balance_before,
            balance_after: self.balance_after,
            prev_hash: self.prev_hash.clone(),
            fill_hash: self.fill_hash.clone(),
            row_hash: self.row_hash.clone(),
        })
    }
}

#[derive(Debug, FromRow)]
pub struct PortfolioModel {
    pub state_id: String,
    pub run_id: String,
    pub account_id: String,
    pub hour_ts: i64,
    pub cash_balance: f64,
    pub position_value: f64,
    pub total_value: f64,
    pub open_position_count: i32,
    pub seed_hash: String,
    pub last_ledger_hash: String,
    pub row_hash: String,
}

impl PortfolioModel {
    pub fn to_domain(&self) -> PortfolioHourlyState {
        PortfolioHourlyState {
            state_id: self.state_id.clone(),
            run_id: self.run_id.clone(),
            account_id: self.account_id.clone(),
            hour_ts: self.hour_ts,
            cash_balance: self.cash_balance,
            position_value: self.position_value,
            total_value: self.total_value,
            open_position_count: self.open_position_count,
            seed_hash: self.seed_hash.clone(),
            last_ledger_hash: self.last_ledger_hash.clone(),
            row_hash: self.row_hash.clone(),
        }
    }
}

#[derive(Debug, FromRow)]
pub struct RiskStateModel {
    pub state_id: String,
    pub run_id: String,
    pub account_id: String,
    pub hour_ts: i64,
    pub drawdown_state: String,
    pub drawdown_pct: f64,
    pub peak_value: f64,
    pub kill_switch_active: bool,
    pub seed_hash: String,
    pub row_hash: String,
}

impl RiskStateModel {
    pub fn to_domain(&self) -> AppResult<RiskHourlyState> {
        Ok(RiskHourlyState {
            state_id: self.state_id.clone(),
            run_id: self.run_id.clone(),
            account_id: self.account_id.clone(),
            hour_ts: self.hour_ts,
            drawdown_state: parse_enum(
                DrawdownState::from_str(&self.drawdown_state),
                "drawdown_state",
                &self.drawdown_state,
            )?,
            drawdown_pct: self.drawdown_pct,
            peak_value: self.peak_value,
            kill_switch_active: self.kill_switch_active,
            seed_hash: self.seed_hash.clone(),
            row_hash: self.row_hash.clone(),
        })
    }
}

#[derive(Debug, FromRow)]
pub struct ClusterStateModel {
    pub state_id: String,
    pub run_id: String,
    pub account_id: String,
    pub hour_ts: i64,
    pub cluster_id: String,
    pub exposure_value: f64,
    pub exposure_limit: f64,
    pub exposure_mode: String,
    pub seed_hash: String,
    pub row_hash: String,
}

impl ClusterStateModel {
    pub fn to_domain(&self) -> AppResult<ClusterExposureHourlyState> {
        Ok(ClusterExposureHourlyState {
            state_id: self.state_id.clone(),
            run_id: self.run_id.clone(),
            account_id: self.account_id.clone(),
            hour_ts: self.hour_ts,
            cluster_id: self.cluster_id.clone(),
            exposure_value: self.exposure_value,
            exposure_limit: self.exposure_limit,
            exposure_mode: parse_enum(
                ExposureMode::from_str(&self.exposure_mode),
                "exposure_mode",
                &self.exposure_mode,
            )?,
            seed_hash: self.seed_hash.clone(),
            row_hash: self.row_hash.clone(),
        })
    }
}

#[derive(Debug, FromRow)]
pub struct ManifestModel {
    pub manifest_id: String,
    pub run_id: String,
    pub account_id: String,
    pub hour_ts: i64,
    pub seed_hash: String,
    pub root_hash: String,
    pub row_counts_json: String,
    pub row_total: i64,
}

impl ManifestModel {
    pub fn to_domain(&self) -> ReplayManifest {
        ReplayManifest {
            manifest_id: self.manifest_id.clone(),
            run_id: self.run_id.clone(),
            account_id: self.account_id.clone(),
            hour_ts: self.hour_ts,
            seed_hash: self.seed_hash.clone(),
            root_hash: self.root_hash.clone(),
            row_counts_json: self.row_counts_json.clone(),
            row_total: self.row_total,
        }
    }
}
