//! Configuration section definitions.
//!
//! Each module corresponds to a section of the registry document:
//!
//! | Module          | Section          | Purpose                               |
//! |-----------------|------------------|---------------------------------------|
//! | `runtime`       | `runtime`        | Paths, interval, healing policy       |
//! | `repo`          | `repo`           | Auto-commit and push target           |
//! | `notifications` | `notifications`  | Webhook destinations and filters      |
//! | `generator`     | `generator`      | Variant generation stage              |

mod generator;
mod notifications;
mod repo;
mod runtime;

pub use generator::{GeneratorConfig, VariantSpec};
pub use notifications::{Destination, DestinationKind, NotificationsConfig, WebhookEntry};
pub use repo::RepoConfig;
pub use runtime::{RetryConfig, RuntimeConfig};
