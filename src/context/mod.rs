pub mod loader;

pub use loader::{load_hour_context, HourContext, OpenLot};
