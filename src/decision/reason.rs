//! 原因码
//!
//! 信号行、订单行与风控事件共用的稳定字符串，入库后不可重命名。

pub const ENTRY_SIGNAL: &str = "ENTRY_SIGNAL";
pub const DIP_ENTRY: &str = "DIP_ENTRY";
pub const EXIT_STRONG_NEGATIVE: &str = "EXIT_STRONG_NEGATIVE";
pub const ADAPTIVE_DERISK: &str = "ADAPTIVE_DERISK";
pub const RECOVERY_HOLD: &str = "RECOVERY_HOLD";
pub const RECOVERY_PARTIAL: &str = "RECOVERY_PARTIAL";
pub const RECOVERY_EXIT: &str = "RECOVERY_EXIT";

pub const KILL_SWITCH: &str = "KILL_SWITCH";
pub const MAX_POSITIONS: &str = "MAX_POSITIONS";
pub const EXPOSURE_LIMIT: &str = "EXPOSURE_LIMIT";
pub const SPREAD_TOO_WIDE: &str = "SPREAD_TOO_WIDE";
pub const BOOK_DEPTH_LOW: &str = "BOOK_DEPTH_LOW";
pub const LIQUIDITY_UNAVAILABLE: &str = "LIQUIDITY_UNAVAILABLE";

pub const NO_SHORTING: &str = "NO_SHORTING";
pub const RETRY_EXHAUSTED: &str = "RETRY_EXHAUSTED";
pub const RETRY_PENDING: &str = "RETRY_PENDING";
