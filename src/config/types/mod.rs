//! Configuration utility types.
//!
//! | Module     | Purpose                                        |
//! |------------|------------------------------------------------|
//! | `error`    | Configuration error types                      |
//! | `handle`   | Cached, reloadable config store (thread-safe)  |
//! | `interval` | Cycle interval parsing (`90s`, `5m`, `6h`)     |

mod error;
pub mod handle;
mod interval;

pub use error::ConfigError;
pub use handle::ConfigStore;
pub use interval::{duration_from_secs, parse_interval};
