//! 根哈希与清单
//!
//! 根哈希 = SHA-256(seed + 固定表序/主键序的 (表, 主键, 行哈希)
//! 序列 + 每表行数)。执行端与重放端共用同一实现，两端各自算根，
//! 清单只负责见证。

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::domain::entities::ReplayManifest;
use crate::domain::HourScope;
use crate::error::AppResult;
use crate::store::row::{ReplayRow, RowTable};

/// 每表行数（键为表名，含零行表不出现）
pub fn table_counts(rows: &[ReplayRow]) -> BTreeMap<String, i64> {
    let mut counts = BTreeMap::new();
    for row in rows {
        *counts
            .entry(row.table().table_name().to_string())
            .or_insert(0) += 1;
    }
    counts
}

/// 对 (表, 主键, 行哈希) 三元组序列求根
///
/// 哈希序列可由存储行直接取，也可由重放重算结果取，调用方决定。
pub fn compute_root(seed_hash: &str, hashed: &[(RowTable, String, String)]) -> String {
    let mut ordered: Vec<&(RowTable, String, String)> = hashed.iter().collect();
    ordered.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

    let mut counts: BTreeMap<&'static str, i64> = BTreeMap::new();
    let mut hasher = Sha256::new();
    hasher.update(format!("seed|{}\n", seed_hash));
    for (table, key, hash) in ordered {
        hasher.update(format!("{}|{}|{}\n", table.table_name(), key, hash));
        *counts.entry(table.table_name()).or_insert(0) += 1;
    }
    for (table, count) in counts {
        hasher.update(format!("count|{}={}\n", table, count));
    }
    hex::encode(hasher.finalize())
}

/// 由存储行序列构建清单
pub fn build_manifest(
    scope: &HourScope,
    seed_hash: &str,
    rows: &[ReplayRow],
) -> AppResult<ReplayManifest> {
    let hashed: Vec<(RowTable, String, String)> = rows
        .iter()
        .map(|r| {
            (
                r.table(),
                r.natural_key().to_string(),
                r.stored_hash().to_string(),
            )
        })
        .collect();
    let counts = table_counts(rows);
    Ok(ReplayManifest {
        manifest_id: ReplayManifest::make_id(&scope.run_id, &scope.account_id, scope.hour_ts),
        run_id: scope.run_id.clone(),
        account_id: scope.account_id.clone(),
        hour_ts: scope.hour_ts,
        seed_hash: seed_hash.to_string(),
        root_hash: compute_root(seed_hash, &hashed),
        row_counts_json: serde_json::to_string(&counts)?,
        row_total: rows.len() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_independent_of_input_order() {
        let a = (RowTable::TradeSignals, "sig:1".to_string(), "h1".to_string());
        let b = (RowTable::OrderRequests, "ord:1".to_string(), "h2".to_string());
        let forward = compute_root("seed", &[a.clone(), b.clone()]);
        let reversed = compute_root("seed", &[b, a]);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_root_sensitive_to_hash_and_seed() {
        let row = (RowTable::TradeSignals, "sig:1".to_string(), "h1".to_string());
        let base = compute_root("seed", std::slice::from_ref(&row));
        let other_hash = compute_root(
            "seed",
            &[(RowTable::TradeSignals, "sig:1".to_string(), "h2".to_string())],
        );
        let other_seed = compute_root("seed2", &[row]);
        assert_ne!(base, other_hash);
        assert_ne!(base, other_seed);
    }
}
