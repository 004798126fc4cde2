//! 风控配置实体
//!
//! 版本化参数集：新版本是新行，绝不是对旧行的变更。
//! 巨亏恢复与自适应持仓的精确数值映射属于配置，不是写死的公式。

use serde::{Deserialize, Serialize};

use crate::domain::enums::ExposureMode;
use crate::hashing::CanonicalFrame;

/// 风控配置（某一版本）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskProfile {
    pub profile_id: String,
    pub version: i32,

    /// 最大并发持仓数
    pub max_concurrent_positions: i32,
    /// 敞口限额单位
    pub exposure_mode: ExposureMode,
    /// 总敞口限额（PERCENT_OF_PV 时为百分数，如 60.0）
    pub max_total_exposure: f64,
    /// 单簇敞口限额
    pub max_cluster_exposure: f64,

    /// 回撤软限阈值（0.10 = 10%）
    pub drawdown_soft_pct: f64,
    /// 回撤硬停阈值
    pub drawdown_hard_pct: f64,

    /// 基础入场资金比例
    pub base_entry_fraction: f64,
    /// 波动率目标（尺寸缩放的分子）
    pub vol_target: f64,
    pub vol_scale_floor: f64,
    pub vol_scale_cap: f64,

    /// 巨亏恢复触发阈值（未实现亏损比例，0.15 = -15%）
    pub severe_loss_pct: f64,
    /// 反弹概率 >= 此值时恢复评估选择 HOLD
    pub recovery_hold_prob: f64,
    /// 反弹概率 >= 此值时选择 PARTIAL_DE_RISK，否则 FULL_EXIT
    pub recovery_partial_prob: f64,

    /// 自适应持仓：方向概率低于此值时不再继续持有
    pub adaptive_continue_prob: f64,

    /// 五级分类阈值（方向概率）
    pub strong_positive_prob: f64,
    pub positive_prob: f64,
    pub negative_prob: f64,
    pub strong_negative_prob: f64,
    /// 入场要求的连续正向根数
    pub persistence_bars: i32,
    /// 回调入场要求的反弹概率
    pub dip_rebound_prob: f64,
    /// 强负向平仓豁免所需的最低反弹概率
    pub min_rebound_prob: f64,

    /// 流动性检查：最大点差（bps）
    pub max_spread_bps: f64,
    /// 流动性检查：盘口头档最小挂量
    pub min_book_depth: f64,

    /// 部分减仓比例
    pub derisk_fraction: f64,

    /// 模拟成交费率（成交名义的比例）
    pub fee_rate: f64,
    /// 模拟成交滑点（bps）
    pub slippage_bps: f64,
}

impl RiskProfile {
    /// 配置参数的规范化帧（进入 seed 哈希）
    pub fn canonical(&self) -> String {
        CanonicalFrame::new("risk_profiles")
            .field("profile_id", &self.profile_id)
            .i32("version", self.version)
            .i32("max_concurrent_positions", self.max_concurrent_positions)
            .field("exposure_mode", self.exposure_mode.as_str())
            .f64("max_total_exposure", self.max_total_exposure)
            .f64("max_cluster_exposure", self.max_cluster_exposure)
            .f64("drawdown_soft_pct", self.drawdown_soft_pct)
            .f64("drawdown_hard_pct", self.drawdown_hard_pct)
            .f64("base_entry_fraction", self.base_entry_fraction)
            .f64("vol_target", self.vol_target)
            .f64("vol_scale_floor", self.vol_scale_floor)
            .f64("vol_scale_cap", self.vol_scale_cap)
            .f64("severe_loss_pct", self.severe_loss_pct)
            .f64("recovery_hold_prob", self.recovery_hold_prob)
            .f64("recovery_partial_prob", self.recovery_partial_prob)
            .f64("adaptive_continue_prob", self.adaptive_continue_prob)
            .f64("strong_positive_prob", self.strong_positive_prob)
            .f64("positive_prob", self.positive_prob)
            .f64("negative_prob", self.negative_prob)
            .f64("strong_negative_prob", self.strong_negative_prob)
            .i32("persistence_bars", self.persistence_bars)
            .f64("dip_rebound_prob", self.dip_rebound_prob)
            .f64("min_rebound_prob", self.min_rebound_prob)
            .f64("max_spread_bps", self.max_spread_bps)
            .f64("min_book_depth", self.min_book_depth)
            .f64("derisk_fraction", self.derisk_fraction)
            .f64("fee_rate", self.fee_rate)
            .f64("slippage_bps", self.slippage_bps)
            .finish()
    }
}

/// 风控配置生效区间
///
/// 某账户在某小时必须恰好命中一条，缺失或多条命中都是致命前置失败。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskProfileAssignment {
    pub account_id: String,
    pub profile_id: String,
    pub profile_version: i32,
    pub effective_from_ts: i64,
    /// None 表示开放区间
    pub effective_to_ts: Option<i64>,
}

impl RiskProfileAssignment {
    /// 该区间是否覆盖给定小时
    pub fn covers(&self, hour_ts: i64) -> bool {
        self.effective_from_ts <= hour_ts
            && self.effective_to_ts.map_or(true, |to| hour_ts < to)
    }
}
