//! 市场快照与模型输出（外部输入，只读）

use serde::{Deserialize, Serialize};

use crate::hashing::CanonicalFrame;

/// 盘口头档
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BookTop {
    pub bid_px: f64,
    pub bid_sz: f64,
    pub ask_px: f64,
    pub ask_sz: f64,
}

impl BookTop {
    pub fn midpoint(&self) -> f64 {
        (self.bid_px + self.ask_px) / 2.0
    }

    pub fn spread_bps(&self) -> f64 {
        let mid = self.midpoint();
        if mid <= 0.0 {
            return f64::MAX;
        }
        (self.ask_px - self.bid_px) / mid * 10_000.0
    }
}

/// 单资产单小时的市场数据行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetMarketData {
    pub hour_ts: i64,
    pub asset: String,
    /// 关联资产簇（簇敞口独立封顶）
    pub cluster_id: String,
    pub bid_px: Option<f64>,
    pub bid_sz: Option<f64>,
    pub ask_px: Option<f64>,
    pub ask_sz: Option<f64>,
    /// OHLCV 收盘价（盘口缺失时的成交/估值回退）
    pub ohlcv_close: Option<f64>,
    /// 波动率特征（已实现波动率）
    pub volatility: f64,
}

impl AssetMarketData {
    pub fn book_top(&self) -> Option<BookTop> {
        match (self.bid_px, self.bid_sz, self.ask_px, self.ask_sz) {
            (Some(bid_px), Some(bid_sz), Some(ask_px), Some(ask_sz)) => Some(BookTop {
                bid_px,
                bid_sz,
                ask_px,
                ask_sz,
            }),
            _ => None,
        }
    }

    pub fn canonical(&self) -> String {
        CanonicalFrame::new("market_snapshots")
            .i64("hour_ts", self.hour_ts)
            .field("asset", &self.asset)
            .field("cluster_id", &self.cluster_id)
            .opt_f64("bid_px", self.bid_px)
            .opt_f64("bid_sz", self.bid_sz)
            .opt_f64("ask_px", self.ask_px)
            .opt_f64("ask_sz", self.ask_sz)
            .opt_f64("ohlcv_close", self.ohlcv_close)
            .f64("volatility", self.volatility)
            .finish()
    }
}

/// 模型预测记录（不透明消费，核心不计算它）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub hour_ts: i64,
    pub asset: String,
    /// 方向概率（上涨）
    pub direction_prob: f64,
    /// 期望变动幅度
    pub expected_move: f64,
    /// 反弹概率
    pub rebound_prob: f64,
    /// 市场状态后验
    pub regime_posterior: f64,
}

impl PredictionRecord {
    pub fn canonical(&self) -> String {
        CanonicalFrame::new("model_predictions")
            .i64("hour_ts", self.hour_ts)
            .field("asset", &self.asset)
            .f64("direction_prob", self.direction_prob)
            .f64("expected_move", self.expected_move)
            .f64("rebound_prob", self.rebound_prob)
            .f64("regime_posterior", self.regime_posterior)
            .finish()
    }
}

/// 追加写保护控制记录（迁移锁）
///
/// 每次小时写入前以比较交换方式检查，不用隐式全局可变标志。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlRecord {
    pub scope: String,
    pub writes_enabled: bool,
    pub holder: Option<String>,
}

impl Default for ControlRecord {
    fn default() -> Self {
        Self {
            scope: "global".to_string(),
            writes_enabled: true,
            holder: None,
        }
    }
}
