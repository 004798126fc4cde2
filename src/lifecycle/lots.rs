//! FIFO 批次簿
//!
//! 小时内的运行时视图：跨小时边界的剩余量来自上下文，本小时新开
//! 批次追加在尾部。消耗只改内存里的剩余量，落库形态是分配行。

use crate::context::OpenLot;
use crate::domain::entities::PositionLot;

const LOT_EPSILON: f64 = 1e-9;

/// 单次 FIFO 消耗的结果
#[derive(Debug, Clone)]
pub struct LotDraw {
    pub lot: PositionLot,
    pub lot_hash: String,
    pub quantity: f64,
}

#[derive(Debug, Default)]
pub struct LotBook {
    lots: Vec<OpenLot>,
}

impl LotBook {
    /// 从上下文的跨界批次构建（已按取得时间升序）
    pub fn from_open_lots(open_lots: &[OpenLot]) -> Self {
        Self {
            lots: open_lots.to_vec(),
        }
    }

    pub fn available(&self, asset: &str) -> f64 {
        self.lots
            .iter()
            .filter(|l| l.lot.asset == asset)
            .map(|l| l.remaining)
            .sum()
    }

    pub fn open_position_count(&self) -> i32 {
        let mut assets: Vec<&str> = self
            .lots
            .iter()
            .filter(|l| l.remaining > LOT_EPSILON)
            .map(|l| l.lot.asset.as_str())
            .collect();
        assets.sort();
        assets.dedup();
        assets.len() as i32
    }

    /// 剩余批次（估值与小时态物化用）
    pub fn open_lots(&self) -> Vec<OpenLot> {
        self.lots
            .iter()
            .filter(|l| l.remaining > LOT_EPSILON)
            .cloned()
            .collect()
    }

    /// 本小时新开批次追加在尾部（acquired_ts 单调不减）
    pub fn push_lot(&mut self, lot: PositionLot) {
        let remaining = lot.quantity;
        self.lots.push(OpenLot { lot, remaining });
    }

    /// 最老未耗尽批次优先的消耗
    ///
    /// 调用方保证 quantity <= available，超出部分静默丢弃属于缺陷，
    /// 所以这里返回实际消耗明细供调用方核对。
    pub fn allocate_fifo(&mut self, asset: &str, quantity: f64) -> Vec<LotDraw> {
        let mut remaining = quantity;
        let mut draws = Vec::new();
        for entry in self.lots.iter_mut() {
            if remaining <= LOT_EPSILON {
                break;
            }
            if entry.lot.asset != asset || entry.remaining <= LOT_EPSILON {
                continue;
            }
            let take = entry.remaining.min(remaining);
            entry.remaining -= take;
            remaining -= take;
            draws.push(LotDraw {
                lot: entry.lot.clone(),
                lot_hash: entry.lot.row_hash.clone(),
                quantity: take,
            });
        }
        draws
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn lot(id: &str, asset: &str, quantity: f64, price: f64, acquired_ts: i64) -> OpenLot {
        OpenLot {
            lot: PositionLot {
                lot_id: id.to_string(),
                run_id: "r".to_string(),
                account_id: "a".to_string(),
                asset: asset.to_string(),
                quantity,
                price,
                acquired_ts,
                hour_ts: 0,
                fill_hash: String::new(),
                row_hash: format!("hash-{}", id),
            },
            remaining: quantity,
        }
    }

    #[test]
    fn test_fifo_spans_lots() {
        // 1.0 + 2.0 持仓，卖 1.5：第一批吃光，第二批吃 0.5
        let mut book = LotBook::from_open_lots(&[
            lot("lot:1", "ETH-USDT", 1.0, 100.0, 1),
            lot("lot:2", "ETH-USDT", 2.0, 110.0, 2),
        ]);
        let draws = book.allocate_fifo("ETH-USDT", 1.5);
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].lot.lot_id, "lot:1");
        assert_relative_eq!(draws[0].quantity, 1.0);
        assert_eq!(draws[1].lot.lot_id, "lot:2");
        assert_relative_eq!(draws[1].quantity, 0.5);
        assert_relative_eq!(book.available("ETH-USDT"), 1.5);
    }

    #[test]
    fn test_exhausted_lot_skipped() {
        let mut book = LotBook::from_open_lots(&[
            lot("lot:1", "ETH-USDT", 1.0, 100.0, 1),
            lot("lot:2", "ETH-USDT", 2.0, 110.0, 2),
        ]);
        book.allocate_fifo("ETH-USDT", 1.0);
        let draws = book.allocate_fifo("ETH-USDT", 0.5);
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].lot.lot_id, "lot:2");
        assert_eq!(book.open_position_count(), 1);
    }

    #[test]
    fn test_other_assets_untouched() {
        let mut book = LotBook::from_open_lots(&[
            lot("lot:1", "ETH-USDT", 1.0, 100.0, 1),
            lot("lot:2", "BTC-USDT", 2.0, 50.0, 2),
        ]);
        book.allocate_fifo("ETH-USDT", 1.0);
        assert_relative_eq!(book.available("BTC-USDT"), 2.0);
    }
}
