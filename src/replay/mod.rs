pub mod compare;
pub mod recompute;
pub mod root;

pub use compare::{replay_hour, replay_sweep, replay_window, ReplayOutcome};
pub use recompute::recompute_row_hashes;
pub use root::{build_manifest, compute_root, table_counts};
