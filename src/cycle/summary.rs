//! Per-cycle outcome record.

use serde::{Serialize, Serializer};
use std::{fmt, time::Duration};

/// Overall cycle outcome, in increasing precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleStatus {
    Ok,
    Issues,
    Healed,
    Error,
}

impl CycleStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Issues => "issues",
            Self::Healed => "healed",
            Self::Error => "error",
        }
    }

    /// Keep whichever of `self` and `other` takes precedence.
    pub fn escalate(&mut self, other: Self) {
        *self = (*self).max(other);
    }
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleSummary {
    /// Assets in the merged map after the scan.
    pub assets: usize,
    /// Repairs performed.
    pub healed: usize,
    pub status: CycleStatus,
    #[serde(serialize_with = "two_decimal_secs")]
    pub duration: Duration,
    pub commit: bool,
    pub notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for CycleSummary {
    fn default() -> Self {
        Self {
            assets: 0,
            healed: 0,
            status: CycleStatus::Ok,
            duration: Duration::ZERO,
            commit: false,
            notified: false,
            error: None,
        }
    }
}

impl CycleSummary {
    /// Record a failure; the first error message is kept.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status.escalate(CycleStatus::Error);
        self.error.get_or_insert_with(|| message.into());
    }

    pub fn duration_secs(&self) -> String {
        format!("{:.2}", self.duration.as_secs_f64())
    }

    /// One-line human summary, used for the log block and notifications.
    ///
    /// Matched by `notify_on`: "healed" only appears with repairs, "pushed"
    /// only after a commit.
    pub fn text(&self) -> String {
        let mut text = format!("DVOS cycle {}: {} assets", self.status, self.assets);
        if self.healed > 0 {
            text.push_str(&format!(", {} healed", self.healed));
        }
        if self.commit {
            text.push_str(", pushed");
        }
        text.push_str(&format!(", {}s", self.duration_secs()));
        if let Some(error) = &self.error {
            text.push_str(&format!(" ({error})"));
        }
        text
    }
}

fn two_decimal_secs<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64((duration.as_secs_f64() * 100.0).round() / 100.0)
}
