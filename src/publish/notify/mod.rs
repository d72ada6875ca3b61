//! Webhook notifications.
//!
//! Every configured destination gets the cycle summary in its own payload
//! format, with one retry after a fixed delay. Delivery succeeds when at
//! least one destination answers 200 or 204.

mod format;

pub use format::{Notification, PayloadFormatter, formatter_for, status_color};

use anyhow::Result;
use std::time::Duration;

use super::{PublishError, retry::{Backoff, retry}};
use crate::config::{NotificationsConfig, extract_host};
use crate::core::Sleeper;
use crate::cycle::CycleSummary;
use crate::event;
use crate::logger::EventSink;
use crate::utils::date::now_rfc3339;

/// HTTP POST of a JSON body.
pub trait WebhookTransport: Send + Sync {
    /// Returns the response status code. Transport failures and timeouts are
    /// errors.
    fn post(&self, url: &str, body: &str) -> Result<u16>;
}

/// Blocking `ureq` transport with a fixed per-call timeout.
pub struct UreqTransport {
    timeout: Duration,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl WebhookTransport for UreqTransport {
    fn post(&self, url: &str, body: &str) -> Result<u16> {
        let resp = ureq::post(url)
            .config()
            .http_status_as_error(false)
            .timeout_global(Some(self.timeout))
            .build()
            .header("Content-Type", "application/json")
            .send(body)
            .map_err(|e| PublishError::Webhook {
                host: extract_host(url).unwrap_or_else(|| url.to_string()),
                message: e.to_string(),
            })?;
        Ok(resp.status().as_u16())
    }
}

/// Whether `notify_on` lets this cycle through.
///
/// Empty filter sends everything; otherwise any keyword found in the status
/// or the summary text, case-insensitively.
pub fn should_send(notify_on: &[String], status: &str, text: &str) -> bool {
    if notify_on.is_empty() {
        return true;
    }
    let status = status.to_lowercase();
    let text = text.to_lowercase();
    notify_on.iter().any(|keyword| {
        let keyword = keyword.trim().to_lowercase();
        !keyword.is_empty() && (status.contains(&keyword) || text.contains(&keyword))
    })
}

fn build_notification(summary: &CycleSummary, text: &str, username: &str) -> Notification {
    let mut fields = vec![
        ("Assets".to_string(), summary.assets.to_string()),
        ("Healed".to_string(), summary.healed.to_string()),
        (
            "Commit".to_string(),
            if summary.commit { "pushed" } else { "none" }.to_string(),
        ),
        ("Duration".to_string(), format!("{}s", summary.duration_secs())),
    ];
    if let Some(error) = &summary.error {
        fields.push(("Error".to_string(), error.clone()));
    }
    Notification {
        title: format!("DVOS cycle: {}", summary.status),
        text: text.to_string(),
        status: summary.status.as_str().to_string(),
        fields,
        username: username.to_string(),
        timestamp: now_rfc3339(),
    }
}

/// Send `text` and `summary` to every configured destination.
pub fn notify(
    config: &NotificationsConfig,
    text: &str,
    summary: &CycleSummary,
    transport: &dyn WebhookTransport,
    sleeper: &dyn Sleeper,
    sink: &dyn EventSink,
) -> bool {
    let destinations = config.destinations();
    if destinations.is_empty() {
        event!(sink, "notify"; "[SKIP] no webhook configured");
        return false;
    }
    if !should_send(&config.notify_on, summary.status.as_str(), text) {
        event!(sink, "notify"; "[SKIP] status {} filtered by notify_on", summary.status);
        return false;
    }

    let note = build_notification(summary, text, &config.username);
    let backoff = Backoff::fixed(2, config.retry_delay());
    let mut delivered = false;

    for dest in &destinations {
        let host = extract_host(&dest.url).unwrap_or_else(|| "webhook".to_string());
        let body = formatter_for(dest.kind).format(&note, config.rich()).to_string();

        let ok = retry(&format!("notify {host}"), &backoff, sleeper, sink, |_| {
            let status = transport.post(&dest.url, &body)?;
            if matches!(status, 200 | 204) {
                Ok(true)
            } else {
                Err(PublishError::Status {
                    host: host.clone(),
                    status,
                }
                .into())
            }
        });

        if ok {
            event!(sink, "notify"; "delivered to {host} ({})", dest.kind.as_str());
            delivered = true;
        } else {
            event!(sink, "notify"; "[ERROR] delivery to {host} failed");
        }
    }
    delivered
}
