pub mod memory;
pub mod mysql;
pub mod row;
pub mod traits;

pub use memory::MemoryStore;
pub use mysql::MysqlStore;
pub use row::{ReplayRow, RowTable};
pub use traits::{ManifestFilter, RowSink, SnapshotReader, WriteOutcome};
