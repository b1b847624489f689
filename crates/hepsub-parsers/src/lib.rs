//! Shared parsing utilities for scheduler input and output.
//!
//! This crate provides the small parsers used when validating command line
//! values before they end up in a job script, and when reading back what
//! the scheduler printed.

pub mod command;
pub mod memory;
pub mod time;

pub use command::{CommandError, run_command, run_shell};
pub use memory::{normalize_memory_limit, parse_memory_mb};
pub use time::{format_duration_slurm, normalize_time_limit, parse_duration};

/// Filter helper for optional string arguments.
/// Returns None if the string is empty or a placeholder value.
pub fn non_empty_string(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "-" || trimmed == "N/A" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Last whitespace-separated token of a line, if any.
pub fn last_token(s: &str) -> Option<&str> {
    s.split_whitespace().last()
}
