//! Simulated market-data feed
//!
//! Perturbs each configured instrument on a repeating schedule and delivers a
//! formatted snapshot to every subscriber once per tick.

mod driver;
mod format;
mod generator;
mod registry;
mod scheduler;
mod store;
mod types;

pub use driver::{Ticker, MIN_INTERVAL};
pub use format::{format_price, percent_change, round_change};
pub use generator::{
    apply_delta, DeltaSequence, DeltaSource, FixedDelta, FluctuationGenerator, UniformDelta,
    DEFAULT_MAX_FLUCTUATION,
};
pub use registry::{Delivery, SubscriberRegistry, Subscription};
pub use scheduler::{ManualScheduler, Scheduler, Task, TaskHandle, TokioScheduler};
pub use store::{PriceState, PriceStore};
pub use types::{Direction, PriceQuote, Snapshot, TickerError, TickerState};
