//! `notifications` section configuration.
//!
//! # Example
//!
//! ```json
//! "notifications": {
//!   "webhook_url": [
//!     "https://discord.com/api/webhooks/1/abc",
//!     { "url": "https://ops.example.com/hook", "kind": "slack" }
//!   ],
//!   "notify_on": ["error", "healed"],
//!   "embed_style": "rich",
//!   "username": "DVOS Runtime",
//!   "retry_delay": 2.0
//! }
//! ```
//!
//! `webhook_url` may be a single entry or a list. An entry is either a bare
//! URL or an object with an explicit `kind`; bare URLs get their kind from
//! the host once, when destinations are resolved.

use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

use crate::config::types::duration_from_secs;
use crate::config::util::extract_host;

/// Webhook notification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// One or more webhook destinations.
    #[serde(deserialize_with = "one_or_many")]
    pub webhook_url: Vec<WebhookEntry>,

    /// Keywords; when non-empty, only cycles whose status or summary
    /// contains one of them (case-insensitive) are sent.
    pub notify_on: Vec<String>,

    /// `rich` for embeds/attachments, `plain` to force text payloads.
    pub embed_style: String,

    /// Display name on the receiving side.
    pub username: String,

    /// Fixed delay before the single retry per destination, in seconds.
    pub retry_delay: f64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            webhook_url: Vec::new(),
            notify_on: Vec::new(),
            embed_style: "rich".to_string(),
            username: "DVOS Runtime".to_string(),
            retry_delay: 2.0,
        }
    }
}

impl NotificationsConfig {
    /// Resolve configured entries into destinations, skipping blank URLs.
    pub fn destinations(&self) -> Vec<Destination> {
        self.webhook_url
            .iter()
            .filter_map(WebhookEntry::resolve)
            .collect()
    }

    pub fn retry_delay(&self) -> Duration {
        duration_from_secs(self.retry_delay)
    }

    /// Whether rich payloads are allowed.
    pub fn rich(&self) -> bool {
        !self.embed_style.eq_ignore_ascii_case("plain")
    }
}

/// A configured webhook entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WebhookEntry {
    Url(String),
    Detailed {
        url: String,
        #[serde(default)]
        kind: Option<DestinationKind>,
    },
}

impl WebhookEntry {
    fn resolve(&self) -> Option<Destination> {
        let (url, kind) = match self {
            Self::Url(url) => (url, None),
            Self::Detailed { url, kind } => (url, *kind),
        };
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        Some(Destination {
            url: url.to_string(),
            kind: kind.unwrap_or_else(|| DestinationKind::infer(url)),
        })
    }
}

/// Payload family of a webhook destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    /// Embed payloads (`embeds: [...]`).
    Discord,
    /// Attachment payloads (`attachments: [...]`).
    Slack,
    /// Minimal text payload.
    Plain,
}

impl DestinationKind {
    /// Infer the kind from a URL host. Unknown hosts are `Plain`.
    pub fn infer(url: &str) -> Self {
        match extract_host(url).as_deref() {
            Some(h) if on_domain(h, "discord.com") || on_domain(h, "discordapp.com") => {
                Self::Discord
            }
            Some(h) if on_domain(h, "slack.com") => Self::Slack,
            _ => Self::Plain,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discord => "discord",
            Self::Slack => "slack",
            Self::Plain => "plain",
        }
    }
}

/// `host` is `domain` or one of its subdomains.
fn on_domain(host: &str, domain: &str) -> bool {
    host.strip_suffix(domain)
        .is_some_and(|rest| rest.is_empty() || rest.ends_with('.'))
}

/// A resolved destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub url: String,
    pub kind: DestinationKind,
}

/// Accept a single entry, a list, or `null`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<WebhookEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(WebhookEntry),
        Many(Vec<WebhookEntry>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(entry)) => vec![entry],
        Some(OneOrMany::Many(entries)) => entries,
        None => Vec::new(),
    })
}
