//! Side-effecting steps at the end of a cycle.
//!
//! | Module   | Purpose                                            |
//! |----------|----------------------------------------------------|
//! | `retry`  | Bounded retry with exponential backoff and jitter  |
//! | `commit` | git add / commit / push through a `VcsRunner`      |
//! | `notify` | Webhook payload formatting and delivery            |

pub mod commit;
pub mod notify;
pub mod retry;

use thiserror::Error;

pub use commit::{CommitOutcome, GitCli, VcsRunner, commit_and_push};
pub use notify::{UreqTransport, WebhookTransport, notify};
pub use retry::{Backoff, retry};

/// Failure of a commit or webhook step.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("git {step} failed: {message}")]
    Vcs { step: &'static str, message: String },

    #[error("webhook {host} failed: {message}")]
    Webhook { host: String, message: String },

    #[error("webhook {host} answered HTTP {status}")]
    Status { host: String, status: u16 },
}
