pub mod cash;
pub mod hourly;
pub mod writer;

pub use cash::{build_ledger_entries, fill_delta};
pub use hourly::{build_hourly_states, HourlyStates};
pub use writer::{commit_hour_rows, CommitStats};
