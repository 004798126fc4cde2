//! 重放权威行的统一包装
//!
//! 根哈希、冲突策略、重放重算都以 ReplayRow 为单位工作。

use serde::{Deserialize, Serialize};

use crate::domain::entities::*;

/// 重放权威表（顺序固定，根哈希按此排序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RowTable {
    TradeSignals,
    OrderRequests,
    OrderFills,
    PositionLots,
    LotAllocations,
    ExecutedTrades,
    CashLedger,
    PortfolioHourly,
    RiskHourly,
    ClusterExposureHourly,
}

impl RowTable {
    pub const ALL: [RowTable; 10] = [
        RowTable::TradeSignals,
        RowTable::OrderRequests,
        RowTable::OrderFills,
        RowTable::PositionLots,
        RowTable::LotAllocations,
        RowTable::ExecutedTrades,
        RowTable::CashLedger,
        RowTable::PortfolioHourly,
        RowTable::RiskHourly,
        RowTable::ClusterExposureHourly,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            RowTable::TradeSignals => "trade_signals",
            RowTable::OrderRequests => "order_requests",
            RowTable::OrderFills => "order_fills",
            RowTable::PositionLots => "position_lots",
            RowTable::LotAllocations => "lot_allocations",
            RowTable::ExecutedTrades => "executed_trades",
            RowTable::CashLedger => "cash_ledger",
            RowTable::PortfolioHourly => "portfolio_hourly_state",
            RowTable::RiskHourly => "risk_hourly_state",
            RowTable::ClusterExposureHourly => "cluster_exposure_hourly_state",
        }
    }
}

/// 一条重放权威行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReplayRow {
    Signal(TradeSignal),
    Order(OrderRequest),
    Fill(OrderFill),
    Lot(PositionLot),
    Allocation(LotAllocation),
    Trade(ExecutedTrade),
    Ledger(CashLedgerEntry),
    Portfolio(PortfolioHourlyState),
    Risk(RiskHourlyState),
    Cluster(ClusterExposureHourlyState),
}

impl ReplayRow {
    pub fn table(&self) -> RowTable {
        match self {
            ReplayRow::Signal(_) => RowTable::TradeSignals,
            ReplayRow::Order(_) => RowTable::OrderRequests,
            ReplayRow::Fill(_) => RowTable::OrderFills,
            ReplayRow::Lot(_) => RowTable::PositionLots,
            ReplayRow::Allocation(_) => RowTable::LotAllocations,
            ReplayRow::Trade(_) => RowTable::ExecutedTrades,
            ReplayRow::Ledger(_) => RowTable::CashLedger,
            ReplayRow::Portfolio(_) => RowTable::PortfolioHourly,
            ReplayRow::Risk(_) => RowTable::RiskHourly,
            ReplayRow::Cluster(_) => RowTable::ClusterExposureHourly,
        }
    }

    /// 自然主键
    pub fn natural_key(&self) -> &str {
        match self {
            ReplayRow::Signal(r) => &r.signal_id,
            ReplayRow::Order(r) => &r.request_id,
            ReplayRow::Fill(r) => &r.fill_id,
            ReplayRow::Lot(r) => &r.lot_id,
            ReplayRow::Allocation(r) => &r.allocation_id,
            ReplayRow::Trade(r) => &r.trade_id,
            ReplayRow::Ledger(r) => &r.entry_id,
            ReplayRow::Portfolio(r) => &r.state_id,
            ReplayRow::Risk(r) => &r.state_id,
            ReplayRow::Cluster(r) => &r.state_id,
        }
    }

    /// 写入时携带的行哈希
    pub fn stored_hash(&self) -> &str {
        match self {
            ReplayRow::Signal(r) => &r.row_hash,
            ReplayRow::Order(r) => &r.row_hash,
            ReplayRow::Fill(r) => &r.row_hash,
            ReplayRow::Lot(r) => &r.row_hash,
            ReplayRow::Allocation(r) => &r.row_hash,
            ReplayRow::Trade(r) => &r.row_hash,
            ReplayRow::Ledger(r) => &r.row_hash,
            ReplayRow::Portfolio(r) => &r.row_hash,
            ReplayRow::Risk(r) => &r.row_hash,
            ReplayRow::Cluster(r) => &r.row_hash,
        }
    }

    /// 规范化帧（不含行哈希与父哈希）
    pub fn canonical(&self) -> String {
        match self {
            ReplayRow::Signal(r) => r.canonical(),
            ReplayRow::Order(r) => r.canonical(),
            ReplayRow::Fill(r) => r.canonical(),
            ReplayRow::Lot(r) => r.canonical(),
            ReplayRow::Allocation(r) => r.canonical(),
            ReplayRow::Trade(r) => r.canonical(),
            ReplayRow::Ledger(r) => r.canonical(),
            ReplayRow::Portfolio(r) => r.canonical(),
            ReplayRow::Risk(r) => r.canonical(),
            ReplayRow::Cluster(r) => r.canonical(),
        }
    }

    /// 行存储的父哈希引用（顺序与 seal 时一致）
    pub fn parent_hashes(&self) -> Vec<String> {
        match self {
            ReplayRow::Signal(r) => vec![r.seed_hash.clone()],
            ReplayRow::Order(r) => vec![r.signal_hash.clone()],
            ReplayRow::Fill(r) => vec![r.request_hash.clone()],
            ReplayRow::Lot(r) => vec![r.fill_hash.clone()],
            ReplayRow::Allocation(r) => vec![r.lot_hash.clone(), r.fill_hash.clone()],
            ReplayRow::Trade(r) => vec![r.fill_hash.clone()],
            ReplayRow::Ledger(r) => vec![r.prev_hash.clone(), r.fill_hash.clone()],
            ReplayRow::Portfolio(r) => vec![r.seed_hash.clone(), r.last_ledger_hash.clone()],
            ReplayRow::Risk(r) => vec![r.seed_hash.clone()],
            ReplayRow::Cluster(r) => vec![r.seed_hash.clone()],
        }
    }

    /// 行归属的小时
    pub fn hour_ts(&self) -> i64 {
        match self {
            ReplayRow::Signal(r) => r.hour_ts,
            ReplayRow::Order(r) => r.hour_ts,
            ReplayRow::Fill(r) => r.hour_ts,
            ReplayRow::Lot(r) => r.hour_ts,
            ReplayRow::Allocation(r) => r.hour_ts,
            ReplayRow::Trade(r) => r.hour_ts,
            ReplayRow::Ledger(r) => r.hour_ts,
            ReplayRow::Portfolio(r) => r.hour_ts,
            ReplayRow::Risk(r) => r.hour_ts,
            ReplayRow::Cluster(r) => r.hour_ts,
        }
    }
}
