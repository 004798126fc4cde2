//! 现金流水实体

use serde::{Deserialize, Serialize};

use crate::domain::enums::OrderSide;
use crate::hashing::{row_hash, CanonicalFrame};

/// 现金流水：一笔成交一行，prev_hash 链 + 余额连续性双重约束
///
/// 不变量：同一账户 balance_before[n] == balance_after[n-1]。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashLedgerEntry {
    pub entry_id: String,
    pub run_id: String,
    pub account_id: String,
    pub hour_ts: i64,
    pub fill_id: String,
    pub side: OrderSide,
    /// BUY: -(notional+fee+slippage)  SELL: +(notional-fee-slippage)
    pub delta: f64,
    pub balance_before: f64,
    pub balance_after: f64,
    /// 前一条流水的行哈希，链首为 genesis 哨兵
    pub prev_hash: String,
    /// 父哈希：对应成交
    pub fill_hash: String,
    pub row_hash: String,
}

impl CashLedgerEntry {
    pub fn make_id(fill_id: &str) -> String {
        format!("led:{}", fill_id)
    }

    pub fn canonical(&self) -> String {
        CanonicalFrame::new("cash_ledger")
            .field("entry_id", &self.entry_id)
            .field("run_id", &self.run_id)
            .field("account_id", &self.account_id)
            .i64("hour_ts", self.hour_ts)
            .field("fill_id", &self.fill_id)
            .field("side", self.side.as_str())
            .f64("delta", self.delta)
            .f64("balance_before", self.balance_before)
            .f64("balance_after", self.balance_after)
            .finish()
    }

    pub fn seal(mut self) -> Self {
        let canonical = self.canonical();
        self.row_hash = row_hash(&canonical, &[&self.prev_hash, &self.fill_hash]);
        self
    }
}
