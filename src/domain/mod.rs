pub mod entities;
pub mod enums;

pub use entities::*;
pub use enums::*;

use serde::{Deserialize, Serialize};

/// 执行/重放作用域：一个 (run, account, hour) 单元
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourScope {
    pub run_id: String,
    pub account_id: String,
    pub hour_ts: i64,
}

impl HourScope {
    pub fn new(run_id: &str, account_id: &str, hour_ts: i64) -> Self {
        Self {
            run_id: run_id.to_string(),
            account_id: account_id.to_string(),
            hour_ts,
        }
    }
}

impl std::fmt::Display for HourScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.run_id, self.account_id, self.hour_ts)
    }
}
