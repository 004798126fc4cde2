pub mod classifier;
pub mod engine;
pub mod reason;

pub use classifier::classify;
pub use engine::{decide_hour, DecisionOutcome, RiskEvent};
