//! `repo` section configuration.
//!
//! # Example
//!
//! ```json
//! "repo": {
//!   "auto_commit": true,
//!   "branch": "main",
//!   "remote": "origin",
//!   "commit_message": "Auto-update from DVOS"
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Version-control publishing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Commit and push after every cycle.
    pub auto_commit: bool,

    /// Branch pushed to.
    pub branch: String,

    /// Remote pushed to.
    pub remote: String,

    /// Commit message prefix; the cycle outcome is appended.
    pub commit_message: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            auto_commit: false,
            branch: "main".to_string(),
            remote: "origin".to_string(),
            commit_message: "Auto-update from DVOS".to_string(),
        }
    }
}
