pub mod canonical;
pub mod chain;

pub use canonical::{fmt_f64, fmt_opt_f64, CanonicalFrame};
pub use chain::{row_hash, sha256_hex, GENESIS_HASH};
