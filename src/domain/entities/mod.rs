pub mod context;
pub mod hourly;
pub mod ledger;
pub mod lot;
pub mod manifest;
pub mod market;
pub mod order;
pub mod profile;
pub mod signal;
pub mod trade;

pub use context::RunContext;
pub use hourly::{ClusterExposureHourlyState, PortfolioHourlyState, RiskHourlyState};
pub use ledger::CashLedgerEntry;
pub use lot::{LotAllocation, PositionLot};
pub use manifest::ReplayManifest;
pub use market::{AssetMarketData, BookTop, ControlRecord, PredictionRecord};
pub use order::{OrderFill, OrderRequest};
pub use profile::{RiskProfile, RiskProfileAssignment};
pub use signal::TradeSignal;
pub use trade::ExecutedTrade;
