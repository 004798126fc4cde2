//! 行哈希重算
//!
//! 自底向上重走哈希链：父哈希先换成重算值再算子行。跨小时边界的
//! 父引用（seed、前小时流水尾、更早小时的批次）没有本小时内的
//! 重算对象，按见证值采信——它们的完整性由各自小时的清单负责。

use std::collections::BTreeMap;

use crate::hashing::row_hash;
use crate::store::row::{ReplayRow, RowTable};

/// 单行重算结果
#[derive(Debug, Clone)]
pub struct RecomputedRow {
    pub table: RowTable,
    pub natural_key: String,
    pub stored_hash: String,
    pub recomputed_hash: String,
}

impl RecomputedRow {
    pub fn matches(&self) -> bool {
        self.stored_hash == self.recomputed_hash
    }
}

/// 重算一个小时全部行的哈希
///
/// 表序即依赖序（信号 → 订单 → 成交 → 批次 → 分配 → …），同表内
/// 按主键序，保证父行先于子行得到重算值。
pub fn recompute_row_hashes(rows: &[ReplayRow]) -> Vec<RecomputedRow> {
    let mut ordered: Vec<&ReplayRow> = rows.iter().collect();
    ordered.sort_by(|a, b| (a.table(), a.natural_key()).cmp(&(b.table(), b.natural_key())));

    // 存储哈希 → 重算哈希
    let mut resolved: BTreeMap<String, String> = BTreeMap::new();
    let mut result = Vec::with_capacity(ordered.len());

    for row in ordered {
        let parents: Vec<String> = row
            .parent_hashes()
            .into_iter()
            .map(|stored| resolved.get(&stored).cloned().unwrap_or(stored))
            .collect();
        let parent_refs: Vec<&str> = parents.iter().map(String::as_str).collect();
        let recomputed = row_hash(&row.canonical(), &parent_refs);
        resolved.insert(row.stored_hash().to_string(), recomputed.clone());
        result.push(RecomputedRow {
            table: row.table(),
            natural_key: row.natural_key().to_string(),
            stored_hash: row.stored_hash().to_string(),
            recomputed_hash: recomputed,
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{OrderRequest, TradeSignal};
    use crate::domain::enums::*;

    fn signal() -> TradeSignal {
        TradeSignal {
            signal_id: "sig:r:0:BTC-USDT:ENTER".to_string(),
            run_id: "r".to_string(),
            account_id: "a".to_string(),
            hour_ts: 0,
            asset: "BTC-USDT".to_string(),
            action: SignalAction::Enter,
            signal_class: SignalClass::Positive,
            size_fraction: 0.1,
            reason_code: "ENTRY_SIGNAL".to_string(),
            drawdown_state: DrawdownState::Normal,
            profile_id: "default".to_string(),
            profile_version: 1,
            seed_hash: "seed".to_string(),
            row_hash: String::new(),
        }
        .seal()
    }

    fn order(signal_hash: &str) -> OrderRequest {
        OrderRequest {
            request_id: "ord:r:0:BTC-USDT:BUY:a0".to_string(),
            logical_order_id: "ord:r:0:BTC-USDT:BUY".to_string(),
            attempt_index: 0,
            scheduled_offset_min: 0,
            run_id: "r".to_string(),
            account_id: "a".to_string(),
            hour_ts: 0,
            asset: "BTC-USDT".to_string(),
            side: OrderSide::Buy,
            quantity: 1.0,
            status: AttemptStatus::Filled,
            reason_code: "ENTRY_SIGNAL".to_string(),
            signal_hash: signal_hash.to_string(),
            row_hash: String::new(),
        }
        .seal()
    }

    #[test]
    fn test_untouched_rows_recompute_to_stored() {
        let s = signal();
        let o = order(&s.row_hash);
        let recomputed =
            recompute_row_hashes(&[ReplayRow::Signal(s), ReplayRow::Order(o)]);
        assert!(recomputed.iter().all(|r| r.matches()));
    }

    #[test]
    fn test_tampered_field_breaks_hash() {
        let mut s = signal();
        s.size_fraction = 0.2; // seal 之后改字段
        let recomputed = recompute_row_hashes(&[ReplayRow::Signal(s)]);
        assert!(!recomputed[0].matches());
    }

    #[test]
    fn test_parent_mismatch_propagates_to_child() {
        let mut s = signal();
        let o = order(&s.row_hash);
        s.hour_ts = 1; // 篡改父行
        let recomputed =
            recompute_row_hashes(&[ReplayRow::Signal(s), ReplayRow::Order(o)]);
        // 父行失配，子行用父行重算值重算后同样失配
        assert!(recomputed.iter().all(|r| !r.matches()));
    }
}
