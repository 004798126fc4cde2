pub mod adaptive;
pub mod drawdown;
pub mod marks;
pub mod recovery;
pub mod sizing;

pub use adaptive::should_continue_holding;
pub use drawdown::{assess_drawdown, DrawdownAssessment};
pub use marks::{portfolio_valuation, resolve_mark, PortfolioValuation};
pub use recovery::evaluate_recovery;
pub use sizing::{entry_fraction, resolve_exposure_limit, vol_scale};
