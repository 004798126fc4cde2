//! 仓位批次与批次消耗实体

use serde::{Deserialize, Serialize};

use crate::hashing::{row_hash, CanonicalFrame};

/// 仓位批次：BUY 成交无条件开新批次
///
/// 批次行本身永不变更。"标记耗尽"通过追加 LotAllocation 行表达：
/// 当某批次的分配量合计达到其数量即视为耗尽。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionLot {
    pub lot_id: String,
    pub run_id: String,
    pub account_id: String,
    pub asset: String,
    pub quantity: f64,
    /// 取得价
    pub price: f64,
    pub acquired_ts: i64,
    pub hour_ts: i64,
    /// 父哈希：开仓成交
    pub fill_hash: String,
    pub row_hash: String,
}

impl PositionLot {
    pub fn make_id(fill_id: &str) -> String {
        format!("lot:{}", fill_id)
    }

    pub fn canonical(&self) -> String {
        CanonicalFrame::new("position_lots")
            .field("lot_id", &self.lot_id)
            .field("run_id", &self.run_id)
            .field("account_id", &self.account_id)
            .field("asset", &self.asset)
            .f64("quantity", self.quantity)
            .f64("price", self.price)
            .i64("acquired_ts", self.acquired_ts)
            .i64("hour_ts", self.hour_ts)
            .finish()
    }

    pub fn seal(mut self) -> Self {
        self.row_hash = row_hash(&self.canonical(), &[&self.fill_hash]);
        self
    }
}

/// 批次消耗：SELL 成交对最老未耗尽批次的 FIFO 分配
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotAllocation {
    pub allocation_id: String,
    pub run_id: String,
    pub account_id: String,
    pub lot_id: String,
    pub fill_id: String,
    pub asset: String,
    pub quantity: f64,
    /// 按批次取得价计的成本
    pub cost_basis: f64,
    pub hour_ts: i64,
    /// 父哈希：被消耗的批次
    pub lot_hash: String,
    /// 父哈希：卖出成交
    pub fill_hash: String,
    pub row_hash: String,
}

impl LotAllocation {
    pub fn make_id(fill_id: &str, lot_id: &str) -> String {
        format!("alloc:{}:{}", fill_id, lot_id)
    }

    pub fn canonical(&self) -> String {
        CanonicalFrame::new("lot_allocations")
            .field("allocation_id", &self.allocation_id)
            .field("run_id", &self.run_id)
            .field("account_id", &self.account_id)
            .field("lot_id", &self.lot_id)
            .field("fill_id", &self.fill_id)
            .field("asset", &self.asset)
            .f64("quantity", self.quantity)
            .f64("cost_basis", self.cost_basis)
            .i64("hour_ts", self.hour_ts)
            .finish()
    }

    pub fn seal(mut self) -> Self {
        let canonical = self.canonical();
        self.row_hash = row_hash(&canonical, &[&self.lot_hash, &self.fill_hash]);
        self
    }
}
