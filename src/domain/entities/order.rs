//! 订单尝试与成交实体

use serde::{Deserialize, Serialize};

use crate::domain::enums::{AttemptStatus, OrderSide, PriceSource};
use crate::hashing::{row_hash, CanonicalFrame};

/// 订单尝试：一行一次尝试，而不是一行一个逻辑订单
///
/// 重试是共享 logical_order_id 的额外行，带单调 attempt_index
/// 与固定的调度偏移（0 / +1m / +2m / +4m）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub request_id: String,
    pub logical_order_id: String,
    pub attempt_index: i32,
    pub scheduled_offset_min: i64,
    pub run_id: String,
    pub account_id: String,
    pub hour_ts: i64,
    pub asset: String,
    pub side: OrderSide,
    /// 本次尝试的目标数量（即逻辑订单剩余未成交量）
    pub quantity: f64,
    pub status: AttemptStatus,
    pub reason_code: String,
    /// 父哈希：驱动该订单的信号
    pub signal_hash: String,
    pub row_hash: String,
}

impl OrderRequest {
    pub fn make_logical_id(run_id: &str, hour_ts: i64, asset: &str, side: OrderSide) -> String {
        format!("ord:{}:{}:{}:{}", run_id, hour_ts, asset, side.as_str())
    }

    pub fn make_request_id(logical_order_id: &str, attempt_index: i32) -> String {
        format!("{}:a{}", logical_order_id, attempt_index)
    }

    pub fn canonical(&self) -> String {
        CanonicalFrame::new("order_requests")
            .field("request_id", &self.request_id)
            .field("logical_order_id", &self.logical_order_id)
            .i32("attempt_index", self.attempt_index)
            .i64("scheduled_offset_min", self.scheduled_offset_min)
            .field("run_id", &self.run_id)
            .field("account_id", &self.account_id)
            .i64("hour_ts", self.hour_ts)
            .field("asset", &self.asset)
            .field("side", self.side.as_str())
            .f64("quantity", self.quantity)
            .field("status", self.status.as_str())
            .field("reason_code", &self.reason_code)
            .finish()
    }

    pub fn seal(mut self) -> Self {
        self.row_hash = row_hash(&self.canonical(), &[&self.signal_hash]);
        self
    }
}

/// 成交：针对某次订单尝试，部分成交为多行、合计不超过请求量
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFill {
    pub fill_id: String,
    pub request_id: String,
    pub logical_order_id: String,
    pub run_id: String,
    pub account_id: String,
    pub hour_ts: i64,
    pub asset: String,
    pub side: OrderSide,
    pub price: f64,
    pub quantity: f64,
    pub notional: f64,
    pub fee_paid: f64,
    pub slippage_cost: f64,
    pub price_source: PriceSource,
    pub fill_ts: i64,
    /// 父哈希：所属订单尝试
    pub request_hash: String,
    pub row_hash: String,
}

impl OrderFill {
    pub fn make_id(request_id: &str) -> String {
        format!("{}:f", request_id)
    }

    pub fn canonical(&self) -> String {
        CanonicalFrame::new("order_fills")
            .field("fill_id", &self.fill_id)
            .field("request_id", &self.request_id)
            .field("logical_order_id", &self.logical_order_id)
            .field("run_id", &self.run_id)
            .field("account_id", &self.account_id)
            .i64("hour_ts", self.hour_ts)
            .field("asset", &self.asset)
            .field("side", self.side.as_str())
            .f64("price", self.price)
            .f64("quantity", self.quantity)
            .f64("notional", self.notional)
            .f64("fee_paid", self.fee_paid)
            .f64("slippage_cost", self.slippage_cost)
            .field("price_source", self.price_source.as_str())
            .i64("fill_ts", self.fill_ts)
            .finish()
    }

    pub fn seal(mut self) -> Self {
        self.row_hash = row_hash(&self.canonical(), &[&self.request_hash]);
        self
    }
}
