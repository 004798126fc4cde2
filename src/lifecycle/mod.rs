pub mod engine;
pub mod exchange;
pub mod lots;

pub use engine::{run_lifecycle, LifecycleOutput, RETRY_OFFSETS_MIN};
pub use exchange::{
    ExchangeAdapter, FillQuote, LiveVenueAdapter, OrderSubmission, SimulatedExchange,
    SimulatorConfig, SubmitOutcome,
};
pub use lots::LotBook;
