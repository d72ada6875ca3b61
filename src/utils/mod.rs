//! Shared helpers: process execution, atomic writes, paths, dates.

pub mod date;
pub mod exec;
pub mod fs;
pub mod path;
pub mod plural;
