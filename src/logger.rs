//! Logging utilities with colored output and the append-only event log.
//!
//! This module provides:
//! - `log!` / `debug!` macros for formatted terminal output with colored prefixes
//! - `EventSink`, the capability every component receives for recording events
//! - `EventLog`, the file-backed sink writing `[<timestamp>Z] [module] message` lines
//! - `event!` macro routing a formatted message through any sink
//!
//! # Example
//!
//! ```ignore
//! // Terminal only
//! log!("scan"; "collected {} descriptors", count);
//!
//! // Terminal + event log
//! event!(sink, "heal"; "created descriptor {}", path.display());
//! ```

use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    fs::{self, OpenOptions},
    io::{Write, stdout},
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macros
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Record an event through an [`EventSink`].
///
/// # Usage
/// ```ignore
/// event!(sink, "verify"; "{} missing files", report.missing_files.len());
/// ```
#[macro_export]
macro_rules! event {
    ($sink:expr, $module:expr; $($arg:tt)*) => {
        $crate::logger::EventSink::emit(&*$sink, $module, &format!($($arg)*))
    };
}

// ============================================================================
// Terminal Output
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stdout = stdout().lock();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "cycle" | "scheduler" => prefix.bright_blue().bold().to_string(),
        "heal" | "generate" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        "warning" => prefix.bright_magenta().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Event Sink
// ============================================================================

/// Destination for runtime events.
///
/// Every component appends through this instead of writing a shared log path,
/// so tests can capture events and the binary can route them to one file.
pub trait EventSink: Send + Sync {
    fn emit(&self, module: &str, message: &str);
}

/// Append-only event log file.
///
/// One line per event; the file is opened in append mode for every write, so a
/// crash can lose at most the line being written.
pub struct EventLog {
    path: PathBuf,
    echo: bool,
    lock: Mutex<()>,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            echo: true,
            lock: Mutex::new(()),
        }
    }

    /// Disable terminal echo (events only go to the file).
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let _guard = self.lock.lock();
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

impl EventSink for EventLog {
    fn emit(&self, module: &str, message: &str) {
        let line = format_line(&crate::utils::date::now_iso(), module, message);
        if let Err(e) = self.append(&line) {
            log!("error"; "cannot append to {}: {}", self.path.display(), e);
        }
        if self.echo {
            log(module, message);
        }
    }
}

/// Format one event log line (newline terminated).
///
/// Blank lines in `message` are kept as separate lines under the same stamp.
pub fn format_line(timestamp: &str, module: &str, message: &str) -> String {
    let mut out = String::new();
    for line in message.lines() {
        out.push_str(&format!("[{timestamp}Z] [{}] {line}\n", module.to_ascii_uppercase()));
    }
    if out.is_empty() {
        out.push_str(&format!("[{timestamp}Z] [{}]\n", module.to_ascii_uppercase()));
    }
    out
}

/// In-memory sink recording `(module, message)` pairs.
#[cfg(test)]
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(String, String)> {
        self.events.lock().clone()
    }

    /// True if any recorded message contains `fragment`.
    pub fn contains(&self, fragment: &str) -> bool {
        self.events.lock().iter().any(|(_, m)| m.contains(fragment))
    }

    pub fn count_module(&self, module: &str) -> usize {
        self.events.lock().iter().filter(|(m, _)| m == module).count()
    }
}

#[cfg(test)]
impl EventSink for MemorySink {
    fn emit(&self, module: &str, message: &str) {
        self.events
            .lock()
            .push((module.to_string(), message.to_string()));
    }
}
