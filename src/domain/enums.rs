//! 领域枚举
//!
//! 所有枚举都有稳定的字符串形式（入库列与规范化序列化共用）。

use serde::{Deserialize, Serialize};

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    Backtest,
    Paper,
    Live,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Backtest => "BACKTEST",
            RunMode::Paper => "PAPER",
            RunMode::Live => "LIVE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "BACKTEST" => Some(RunMode::Backtest),
            "PAPER" => Some(RunMode::Paper),
            "LIVE" => Some(RunMode::Live),
            _ => None,
        }
    }
}

/// 订单方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    /// 买入
    Buy,
    /// 卖出
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(OrderSide::Buy),
            "SELL" => Some(OrderSide::Sell),
            _ => None,
        }
    }
}

/// 信号动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignalAction {
    /// 平仓优先于入场处理
    Exit,
    /// 部分减仓
    DeRisk,
    /// 入场
    Enter,
    /// 持有（仅审计，不驱动订单）
    Hold,
}

impl SignalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalAction::Exit => "EXIT",
            SignalAction::DeRisk => "DE_RISK",
            SignalAction::Enter => "ENTER",
            SignalAction::Hold => "HOLD",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "EXIT" => Some(SignalAction::Exit),
            "DE_RISK" => Some(SignalAction::DeRisk),
            "ENTER" => Some(SignalAction::Enter),
            "HOLD" => Some(SignalAction::Hold),
            _ => None,
        }
    }
}

/// 五级信号分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalClass {
    StrongPositive,
    Positive,
    Neutral,
    Negative,
    StrongNegative,
}

impl SignalClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalClass::StrongPositive => "STRONG_POSITIVE",
            SignalClass::Positive => "POSITIVE",
            SignalClass::Neutral => "NEUTRAL",
            SignalClass::Negative => "NEGATIVE",
            SignalClass::StrongNegative => "STRONG_NEGATIVE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "STRONG_POSITIVE" => Some(SignalClass::StrongPositive),
            "POSITIVE" => Some(SignalClass::Positive),
            "NEUTRAL" => Some(SignalClass::Neutral),
            "NEGATIVE" => Some(SignalClass::Negative),
            "STRONG_NEGATIVE" => Some(SignalClass::StrongNegative),
            _ => None,
        }
    }

    /// 分类强度：StrongPositive=2 .. StrongNegative=-2
    pub fn rank(&self) -> i8 {
        match self {
            SignalClass::StrongPositive => 2,
            SignalClass::Positive => 1,
            SignalClass::Neutral => 0,
            SignalClass::Negative => -1,
            SignalClass::StrongNegative => -2,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.rank() > 0
    }

    pub fn is_negative(&self) -> bool {
        self.rank() < 0
    }
}

/// 订单尝试状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptStatus {
    Filled,
    PartiallyFilled,
    RetryScheduled,
    Exhausted,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Filled => "FILLED",
            AttemptStatus::PartiallyFilled => "PARTIALLY_FILLED",
            AttemptStatus::RetryScheduled => "RETRY_SCHEDULED",
            AttemptStatus::Exhausted => "EXHAUSTED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "FILLED" => Some(AttemptStatus::Filled),
            "PARTIALLY_FILLED" => Some(AttemptStatus::PartiallyFilled),
            "RETRY_SCHEDULED" => Some(AttemptStatus::RetryScheduled),
            "EXHAUSTED" => Some(AttemptStatus::Exhausted),
            _ => None,
        }
    }
}

/// 敞口限额单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExposureMode {
    /// 限额为组合市值的百分比（如 60.0 表示 60%）
    PercentOfPv,
    /// 限额为绝对金额
    AbsoluteAmount,
}

impl ExposureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExposureMode::PercentOfPv => "PERCENT_OF_PV",
            ExposureMode::AbsoluteAmount => "ABSOLUTE_AMOUNT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PERCENT_OF_PV" => Some(ExposureMode::PercentOfPv),
            "ABSOLUTE_AMOUNT" => Some(ExposureMode::AbsoluteAmount),
            _ => None,
        }
    }
}

/// 回撤状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawdownState {
    Normal,
    SoftLimit,
    /// 只阻断新开仓，绝不强平存量仓位
    HardHalt,
}

impl DrawdownState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawdownState::Normal => "NORMAL",
            DrawdownState::SoftLimit => "SOFT_LIMIT",
            DrawdownState::HardHalt => "HARD_HALT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NORMAL" => Some(DrawdownState::Normal),
            "SOFT_LIMIT" => Some(DrawdownState::SoftLimit),
            "HARD_HALT" => Some(DrawdownState::HardHalt),
            _ => None,
        }
    }
}

/// 巨亏恢复评估动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryAction {
    Hold,
    PartialDeRisk,
    FullExit,
}

/// 成交价格来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSource {
    /// 盘口头档
    BookTop,
    /// OHLCV 收盘价回退
    BarClose,
}

impl PriceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSource::BookTop => "BOOK_TOP",
            PriceSource::BarClose => "BAR_CLOSE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "BOOK_TOP" => Some(PriceSource::BookTop),
            "BAR_CLOSE" => Some(PriceSource::BarClose),
            _ => None,
        }
    }
}

/// 重放失配分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MismatchKind {
    MissingManifest,
    SeedMismatch,
    RowCountMismatch,
    RootMismatch,
    UnclassifiedFallback,
}

impl MismatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchKind::MissingManifest => "MISSING_MANIFEST",
            MismatchKind::SeedMismatch => "SEED_MISMATCH",
            MismatchKind::RowCountMismatch => "ROW_COUNT_MISMATCH",
            MismatchKind::RootMismatch => "ROOT_MISMATCH",
            MismatchKind::UnclassifiedFallback => "UNCLASSIFIED_FALLBACK",
        }
    }
}
