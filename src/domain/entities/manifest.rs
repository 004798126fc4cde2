//! 重放清单实体

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 某 (run, account, hour) 的认证指纹
///
/// 重放机对照它验证重算结果：seed 哈希、根哈希、行数指纹。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayManifest {
    pub manifest_id: String,
    pub run_id: String,
    pub account_id: String,
    pub hour_ts: i64,
    pub seed_hash: String,
    pub root_hash: String,
    /// 每表行数，JSON（键按表名排序）
    pub row_counts_json: String,
    pub row_total: i64,
}

impl ReplayManifest {
    pub fn make_id(run_id: &str, account_id: &str, hour_ts: i64) -> String {
        format!("man:{}:{}:{}", run_id, account_id, hour_ts)
    }

    pub fn row_counts(&self) -> BTreeMap<String, i64> {
        serde_json::from_str(&self.row_counts_json).unwrap_or_default()
    }
}
