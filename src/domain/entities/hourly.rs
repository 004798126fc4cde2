//! 小时态物化实体
//!
//! 每 (run, account, hour) 一行：估值、风控档位、簇敞口。
//! 持仓估值来源链：盘口中间价 → OHLCV 收盘 → 最近成交价 →
//! 非零持仓仍无来源则整小时中止。

use serde::{Deserialize, Serialize};

use crate::domain::enums::{DrawdownState, ExposureMode};
use crate::hashing::{row_hash, CanonicalFrame};

/// 组合小时态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioHourlyState {
    pub state_id: String,
    pub run_id: String,
    pub account_id: String,
    pub hour_ts: i64,
    pub cash_balance: f64,
    pub position_value: f64,
    pub total_value: f64,
    pub open_position_count: i32,
    /// 父哈希：小时上下文 seed
    pub seed_hash: String,
    /// 父哈希：小时内最后一条流水（无成交时为空串）
    pub last_ledger_hash: String,
    pub row_hash: String,
}

impl PortfolioHourlyState {
    pub fn make_id(run_id: &str, account_id: &str, hour_ts: i64) -> String {
        format!("pfh:{}:{}:{}", run_id, account_id, hour_ts)
    }

    pub fn canonical(&self) -> String {
        CanonicalFrame::new("portfolio_hourly_state")
            .field("state_id", &self.state_id)
            .field("run_id", &self.run_id)
            .field("account_id", &self.account_id)
            .i64("hour_ts", self.hour_ts)
            .f64("cash_balance", self.cash_balance)
            .f64("position_value", self.position_value)
            .f64("total_value", self.total_value)
            .i32("open_position_count", self.open_position_count)
            .finish()
    }

    pub fn seal(mut self) -> Self {
        let canonical = self.canonical();
        self.row_hash = row_hash(&canonical, &[&self.seed_hash, &self.last_ledger_hash]);
        self
    }
}

/// 风控小时态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskHourlyState {
    pub state_id: String,
    pub run_id: String,
    pub account_id: String,
    pub hour_ts: i64,
    pub drawdown_state: DrawdownState,
    pub drawdown_pct: f64,
    /// 历史峰值（回撤基准），逐小时前滚
    pub peak_value: f64,
    pub kill_switch_active: bool,
    pub seed_hash: String,
    pub row_hash: String,
}

impl RiskHourlyState {
    pub fn make_id(run_id: &str, account_id: &str, hour_ts: i64) -> String {
        format!("rkh:{}:{}:{}", run_id, account_id, hour_ts)
    }

    pub fn canonical(&self) -> String {
        CanonicalFrame::new("risk_hourly_state")
            .field("state_id", &self.state_id)
            .field("run_id", &self.run_id)
            .field("account_id", &self.account_id)
            .i64("hour_ts", self.hour_ts)
            .field("drawdown_state", self.drawdown_state.as_str())
            .f64("drawdown_pct", self.drawdown_pct)
            .f64("peak_value", self.peak_value)
            .bool("kill_switch_active", self.kill_switch_active)
            .finish()
    }

    pub fn seal(mut self) -> Self {
        self.row_hash = row_hash(&self.canonical(), &[&self.seed_hash]);
        self
    }
}

/// 簇敞口小时态（每簇一行）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterExposureHourlyState {
    pub state_id: String,
    pub run_id: String,
    pub account_id: String,
    pub hour_ts: i64,
    pub cluster_id: String,
    /// 持仓名义敞口
    pub exposure_value: f64,
    /// 当前小时解析后的名义限额
    pub exposure_limit: f64,
    pub exposure_mode: ExposureMode,
    pub seed_hash: String,
    pub row_hash: String,
}

impl ClusterExposureHourlyState {
    pub fn make_id(run_id: &str, account_id: &str, hour_ts: i64, cluster_id: &str) -> String {
        format!("clh:{}:{}:{}:{}", run_id, account_id, hour_ts, cluster_id)
    }

    pub fn canonical(&self) -> String {
        CanonicalFrame::new("cluster_exposure_hourly_state")
            .field("state_id", &self.state_id)
            .field("run_id", &self.run_id)
            .field("account_id", &self.account_id)
            .i64("hour_ts", self.hour_ts)
            .field("cluster_id", &self.cluster_id)
            .f64("exposure_value", self.exposure_value)
            .f64("exposure_limit", self.exposure_limit)
            .field("exposure_mode", self.exposure_mode.as_str())
            .finish()
    }

    pub fn seal(mut self) -> Self {
        self.row_hash = row_hash(&self.canonical(), &[&self.seed_hash]);
        self
    }
}
