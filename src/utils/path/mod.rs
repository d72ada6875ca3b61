//! Path utilities.
//!
//! - [`fs`]: filesystem path normalization (`resolve_path`, `get_mtime`)
//! - [`rel`]: descriptor-relative path handling (`normalize_rel`, `to_rel_string`)

pub mod fs;
pub mod rel;

pub use fs::{get_mtime, resolve_path};
pub use rel::{normalize_rel, to_rel_string};
