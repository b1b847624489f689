//! Time limit parsing for `#SBATCH -t` values.

use std::time::Duration;

/// Parse a time limit the way `sbatch --time` reads it.
///
/// Supports:
/// - MM (minutes)
/// - MM:SS
/// - HH:MM:SS
/// - D-HH
/// - D-HH:MM
/// - D-HH:MM:SS
///
/// Returns None for empty strings, "UNLIMITED" or malformed values.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() || s == "UNLIMITED" || s == "INFINITE" {
        return None;
    }

    let parts: Vec<&str> = s.split('-').collect();

    let seconds = match parts.as_slice() {
        [time_part] => {
            let t = colon_fields(time_part)?;
            match t.as_slice() {
                [m] => hms(0, *m, 0)?,
                [m, s] => hms(0, *m, *s)?,
                [h, m, s] => hms(*h, *m, *s)?,
                _ => return None,
            }
        }
        [days, time_part] => {
            let days: u64 = days.parse().ok()?;
            let t = colon_fields(time_part)?;
            let within_day = match t.as_slice() {
                [h] => hms(*h, 0, 0)?,
                [h, m] => hms(*h, *m, 0)?,
                [h, m, s] => hms(*h, *m, *s)?,
                _ => return None,
            };
            days.checked_mul(86400)?.checked_add(within_day)?
        }
        _ => return None,
    };

    Some(Duration::from_secs(seconds))
}

/// Seconds in `h:m:s`, None on overflow.
fn hms(h: u64, m: u64, s: u64) -> Option<u64> {
    h.checked_mul(3600)?
        .checked_add(m.checked_mul(60)?)?
        .checked_add(s)
}

/// Split `a:b:c` into integers, failing on any non-numeric field.
fn colon_fields(part: &str) -> Option<Vec<u64>> {
    part.split(':').map(|p| p.parse::<u64>().ok()).collect()
}

/// Format seconds as SLURM duration format (D-HH:MM:SS).
pub fn format_duration_slurm(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{}-{:02}:{:02}:{:02}", days, hours, mins, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    }
}

/// Validate a user supplied time limit and bring it into canonical form.
///
/// "UNLIMITED" and "INFINITE" pass through unchanged.
pub fn normalize_time_limit(s: &str) -> Option<String> {
    let s = s.trim();
    if s == "UNLIMITED" || s == "INFINITE" {
        return Some(s.to_string());
    }
    parse_duration(s).map(|d| format_duration_slurm(d.as_secs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("10:00:00"), Some(Duration::from_secs(36000)));
        assert_eq!(parse_duration("30:00"), Some(Duration::from_secs(1800)));
        assert_eq!(parse_duration("90"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration("1-00:00:00"), Some(Duration::from_secs(86400)));
        assert_eq!(parse_duration("2-12"), Some(Duration::from_secs(2 * 86400 + 12 * 3600)));
        assert!(parse_duration("UNLIMITED").is_none());
        assert!(parse_duration("ten hours").is_none());
        assert!(parse_duration("1:2:3:4").is_none());
        assert!(parse_duration("").is_none());
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert!(parse_duration("999999999999999-00").is_none());
        assert!(parse_duration("18446744073709551615:00:00").is_none());
        assert!(normalize_time_limit("999999999999999-00").is_none());
    }

    #[test]
    fn test_format_duration_slurm() {
        assert_eq!(format_duration_slurm(3600), "01:00:00");
        assert_eq!(format_duration_slurm(86400 + 5), "1-00:00:05");
    }

    #[test]
    fn test_normalize_time_limit() {
        assert_eq!(normalize_time_limit("10:00:00").as_deref(), Some("10:00:00"));
        assert_eq!(normalize_time_limit("1:0:0").as_deref(), Some("01:00:00"));
        assert_eq!(normalize_time_limit("30").as_deref(), Some("00:30:00"));
        assert_eq!(normalize_time_limit("36:00:00").as_deref(), Some("1-12:00:00"));
        assert_eq!(normalize_time_limit("UNLIMITED").as_deref(), Some("UNLIMITED"));
        assert!(normalize_time_limit("soon").is_none());
    }
}
