//! 运行上下文实体

use serde::{Deserialize, Serialize};

use crate::domain::enums::RunMode;
use crate::hashing::{fmt_opt_f64, CanonicalFrame};

/// 执行单元标识：(run_id, account_id, run_mode, origin_hour)
///
/// 不拥有任何下游实体，但被所有下游实体引用。每个执行单元只创建一次。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunContext {
    pub run_id: String,
    pub account_id: String,
    pub run_mode: RunMode,
    pub origin_hour_ts: i64,
    /// 回测模式的初始资金（PAPER/LIVE 从已有流水引导）
    pub initial_capital: Option<f64>,
}

impl RunContext {
    pub fn canonical(&self) -> String {
        let cap = fmt_opt_f64(self.initial_capital);
        CanonicalFrame::new("run_contexts")
            .field("run_id", &self.run_id)
            .field("account_id", &self.account_id)
            .field("run_mode", self.run_mode.as_str())
            .i64("origin_hour_ts", self.origin_hour_ts)
            .field("initial_capital", &cap)
            .finish()
    }
}
