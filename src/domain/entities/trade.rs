//! 已实现交易实体

use serde::{Deserialize, Serialize};

use crate::hashing::{row_hash, CanonicalFrame};

/// 已实现往返交易：SELL 成交消耗一个或多个批次时产生
///
/// net_pnl = proceeds - cost_basis - fee - slippage 是硬约束，
/// 公式不一致属于缺陷而不是可调参数，构造函数直接推导。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutedTrade {
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
    /// 最早被消耗批次的取得时间
    pub opened_ts: i64,
    pub closed_ts: i64,
    pub hour_ts: i64,
    /// 父哈希：卖出成交
    pub fill_hash: String,
    pub row_hash: String,
}

impl ExecutedTrade {
    pub fn make_id(fill_id: &str) -> String {
        format!("trd:{}", fill_id)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn derive(
        run_id: &str,
        account_id: &str,
        fill_id: &str,
        asset: &str,
        quantity: f64,
        proceeds: f64,
        cost_basis: f64,
        fee: f64,
        slippage: f64,
        opened_ts: i64,
        closed_ts: i64,
        hour_ts: i64,
        fill_hash: &str,
    ) -> Self {
        Self {
            trade_id: Self::make_id(fill_id),
            run_id: run_id.to_string(),
            account_id: account_id.to_string(),
            fill_id: fill_id.to_string(),
            asset: asset.to_string(),
            quantity,
            proceeds,
            cost_basis,
            fee,
            slippage,
            net_pnl: proceeds - cost_basis - fee - slippage,
            opened_ts,
            closed_ts,
            hour_ts,
            fill_hash: fill_hash.to_string(),
            row_hash: String::new(),
        }
        .seal()
    }

    pub fn canonical(&self) -> String {
        CanonicalFrame::new("executed_trades")
            .field("trade_id", &self.trade_id)
            .field("run_id", &self.run_id)
            .field("account_id", &self.account_id)
            .field("fill_id", &self.fill_id)
            .field("asset", &self.asset)
            .f64("quantity", self.quantity)
            .f64("proceeds", self.proceeds)
            .f64("cost_basis", self.cost_basis)
            .f64("fee", self.fee)
            .f64("slippage", self.slippage)
            .f64("net_pnl", self.net_pnl)
            .i64("opened_ts", self.opened_ts)
            .i64("closed_ts", self.closed_ts)
            .i64("hour_ts", self.hour_ts)
            .finish()
    }

    pub fn seal(mut self) -> Self {
        debug_assert!(
            (self.net_pnl - (self.proceeds - self.cost_basis - self.fee - self.slippage)).abs()
                < 1e-9
        );
        self.row_hash = row_hash(&self.canonical(), &[&self.fill_hash]);
        self
    }
}
