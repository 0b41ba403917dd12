//! Time string parsing for clip ranges.
//!
//! Accepts `SS`, `MM:SS` and `HH:MM:SS`. Missing leading components are
//! treated as zero, so `"1:30"` is one minute thirty seconds. Components are
//! not range-checked: `"1:60:99"` is accepted and simply summed.

use thiserror::Error;

/// Maximum number of `:`-separated components (`HH:MM:SS`).
const MAX_COMPONENTS: usize = 3;

/// Time string parsing error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    #[error("Invalid time '{0}'. Use SS, MM:SS or HH:MM:SS")]
    InvalidFormat(String),
}

impl TimeParseError {
    fn invalid(input: &str) -> Self {
        Self::InvalidFormat(input.to_string())
    }
}

/// Parse a time string to whole seconds.
///
/// # Examples
/// ```
/// use gifbot_models::time::parse_time;
/// assert_eq!(parse_time("45").unwrap(), 45);
/// assert_eq!(parse_time("1:30").unwrap(), 90);
/// assert_eq!(parse_time("0:01:30").unwrap(), 90);
/// ```
pub fn parse_time(input: &str) -> Result<u32, TimeParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TimeParseError::invalid(input));
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() > MAX_COMPONENTS {
        return Err(TimeParseError::invalid(input));
    }

    // Rightmost component is seconds, then minutes, then hours.
    let mut total: u32 = 0;
    for (part, multiplier) in parts.iter().rev().zip([1u32, 60, 3600]) {
        let value = parse_component(part).ok_or_else(|| TimeParseError::invalid(input))?;
        total = value
            .checked_mul(multiplier)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| TimeParseError::invalid(input))?;
    }

    Ok(total)
}

/// Parse one component. Only plain ASCII digits are accepted, so signs,
/// decimals and empty components are all rejected.
fn parse_component(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Format whole seconds as `M:SS` or `H:MM:SS` for user-facing messages.
pub fn format_seconds(total_secs: u32) -> String {
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_forms() {
        assert_eq!(parse_time("45").unwrap(), 45);
        assert_eq!(parse_time("1:30").unwrap(), 90);
        assert_eq!(parse_time("0:01:30").unwrap(), 90);
        assert_eq!(parse_time("01:00:00").unwrap(), 3600);
        assert_eq!(parse_time(" 0:05 ").unwrap(), 5);
    }

    #[test]
    fn test_parse_time_does_not_range_check_components() {
        assert_eq!(parse_time("1:60:99").unwrap(), 3600 + 3600 + 99);
        assert_eq!(parse_time("0:75").unwrap(), 75);
    }

    #[test]
    fn test_parse_time_rejects_non_numeric() {
        for bad in ["abc", "", "   ", ":30", "1:", "1::2", "-5", "1.5", "1:2:3:4", "1:a"] {
            assert!(
                matches!(parse_time(bad), Err(TimeParseError::InvalidFormat(_))),
                "expected InvalidFormat for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_parse_time_overflow_is_invalid() {
        assert!(parse_time("99999999999").is_err());
        assert!(parse_time("4294967295:00:00").is_err());
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0), "0:00");
        assert_eq!(format_seconds(90), "1:30");
        assert_eq!(format_seconds(3661), "1:01:01");
    }
}
