//! Webhook payload formatters, one per destination kind.

use serde_json::{Value, json};

use crate::config::DestinationKind;

/// Content of one notification, independent of the receiving service.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub text: String,
    pub status: String,
    pub fields: Vec<(String, String)>,
    pub username: String,
    pub timestamp: String,
}

/// Renders a [`Notification`] as a service-specific JSON body.
pub trait PayloadFormatter: Send + Sync {
    /// `rich` selects embeds/attachments; otherwise a text-only body the
    /// service still accepts.
    fn format(&self, note: &Notification, rich: bool) -> Value;
}

/// Status colour as `0xRRGGBB`. Unknown statuses are blue.
pub fn status_color(status: &str) -> u32 {
    match status {
        "ok" => 0x2ECC71,
        "issues" => 0xF1C40F,
        "healed" => 0x3498DB,
        "error" => 0xE74C3C,
        _ => 0x3498DB,
    }
}

pub fn formatter_for(kind: DestinationKind) -> &'static dyn PayloadFormatter {
    match kind {
        DestinationKind::Discord => &DiscordFormatter,
        DestinationKind::Slack => &SlackFormatter,
        DestinationKind::Plain => &PlainFormatter,
    }
}

fn plain_text(note: &Notification) -> String {
    format!("{}\n{}", note.title, note.text)
}

pub struct DiscordFormatter;

impl PayloadFormatter for DiscordFormatter {
    fn format(&self, note: &Notification, rich: bool) -> Value {
        if !rich {
            return json!({ "username": note.username, "content": plain_text(note) });
        }
        let fields: Vec<Value> = note
            .fields
            .iter()
            .map(|(name, value)| json!({ "name": name, "value": value, "inline": true }))
            .collect();
        json!({
            "username": note.username,
            "embeds": [{
                "title": note.title,
                "description": note.text,
                "color": status_color(&note.status),
                "fields": fields,
                "timestamp": note.timestamp,
            }]
        })
    }
}

pub struct SlackFormatter;

impl PayloadFormatter for SlackFormatter {
    fn format(&self, note: &Notification, rich: bool) -> Value {
        if !rich {
            return json!({ "username": note.username, "text": plain_text(note) });
        }
        let fields: Vec<Value> = note
            .fields
            .iter()
            .map(|(title, value)| json!({ "title": title, "value": value, "short": true }))
            .collect();
        json!({
            "username": note.username,
            "attachments": [{
                "color": format!("#{:06X}", status_color(&note.status)),
                "title": note.title,
                "text": note.text,
                "fields": fields,
                "footer": note.timestamp,
            }]
        })
    }
}

pub struct PlainFormatter;

impl PayloadFormatter for PlainFormatter {
    fn format(&self, note: &Notification, _rich: bool) -> Value {
        json!({ "text": plain_text(note) })
    }
}
