//! Core types - pure abstractions shared across the codebase.

mod clock;
mod state;

pub use clock::{Clock, Sleeper, SystemClock, ThreadSleeper};
#[cfg(test)]
pub use clock::{ManualClock, RecordingSleeper};
pub use state::{is_shutdown, setup_shutdown_handler};
