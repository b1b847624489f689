//! Memory parsing for `#SBATCH --mem` values.

/// Parse SLURM memory string to megabytes (e.g., "4G", "1000M", "4096K", "4096").
///
/// Returns None for empty strings or unknown suffixes.
pub fn parse_memory_mb(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(stripped) = s.strip_suffix('T') {
        stripped.parse::<u64>().ok()?.checked_mul(1024 * 1024)
    } else if let Some(stripped) = s.strip_suffix('G') {
        stripped.parse::<u64>().ok()?.checked_mul(1024)
    } else if let Some(stripped) = s.strip_suffix('M') {
        stripped.parse::<u64>().ok()
    } else if let Some(stripped) = s.strip_suffix('K') {
        stripped.parse::<u64>().ok().map(|v| v / 1024)
    } else {
        // Assume MB if no suffix
        s.parse::<u64>().ok()
    }
}

/// Validate a memory limit, returning it trimmed if SLURM would accept it.
pub fn normalize_memory_limit(s: &str) -> Option<String> {
    parse_memory_mb(s).map(|_| s.trim().to_string())
}
