//! 交易信号实体

use serde::{Deserialize, Serialize};

use crate::domain::enums::{DrawdownState, SignalAction, SignalClass};
use crate::hashing::{row_hash, CanonicalFrame};

/// 决策引擎输出
///
/// 绑定产生它时的精确风控状态标识（回撤状态 + 配置版本），
/// 同一 run-hour 内按 (asset, action, reason_code) 去重。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSignal {
    pub signal_id: String,
    pub run_id: String,
    pub account_id: String,
    pub hour_ts: i64,
    pub asset: String,
    pub action: SignalAction,
    pub signal_class: SignalClass,
    /// 入场时为可用资金比例，减仓时为持仓比例
    pub size_fraction: f64,
    pub reason_code: String,
    pub drawdown_state: DrawdownState,
    pub profile_id: String,
    pub profile_version: i32,
    /// 父哈希：小时上下文 seed
    pub seed_hash: String,
    pub row_hash: String,
}

impl TradeSignal {
    pub fn make_id(run_id: &str, hour_ts: i64, asset: &str, action: SignalAction) -> String {
        format!("sig:{}:{}:{}:{}", run_id, hour_ts, asset, action.as_str())
    }

    pub fn canonical(&self) -> String {
        CanonicalFrame::new("trade_signals")
            .field("signal_id", &self.signal_id)
            .field("run_id", &self.run_id)
            .field("account_id", &self.account_id)
            .i64("hour_ts", self.hour_ts)
            .field("asset", &self.asset)
            .field("action", self.action.as_str())
            .field("signal_class", self.signal_class.as_str())
            .f64("size_fraction", self.size_fraction)
            .field("reason_code", &self.reason_code)
            .field("drawdown_state", self.drawdown_state.as_str())
            .field("profile_id", &self.profile_id)
            .i32("profile_version", self.profile_version)
            .finish()
    }

    /// 计算并填入行哈希
    pub fn seal(mut self) -> Self {
        self.row_hash = row_hash(&self.canonical(), &[&self.seed_hash]);
        self
    }
}
