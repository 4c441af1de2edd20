//! Time parsing and formatting utilities

use crate::domain::errors::DomainError;

/// Format milliseconds as seconds with exactly three decimals (`5000` -> `"5.000"`)
pub fn format_seconds_ms(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}

/// Format milliseconds as `mm:ss`, or `hh:mm:ss` when `long` is set
pub fn format_clock(ms: u64, long: bool) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if long {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        // below an hour the minutes field carries everything
        format!("{:02}:{:02}", total_seconds / 60, seconds)
    }
}

/// Parse a user-entered time into milliseconds.
///
/// Accepts seconds (`123.45`), `MM:SS(.mmm)` and `HH:MM:SS(.mmm)`.
pub fn parse_time_ms(time_str: &str) -> Result<u64, DomainError> {
    let trimmed = time_str.trim();
    let invalid = || {
        DomainError::Config(format!(
            "Invalid time '{}'. Supported formats: seconds (e.g. 123.45), MM:SS.ms (e.g. 2:30.5), HH:MM:SS.ms (e.g. 1:02:30.5)",
            trimmed
        ))
    };

    let parts: Vec<&str> = trimmed.split(':').collect();
    let (hours, minutes, seconds_part) = match parts.as_slice() {
        [seconds] => (0u64, 0u64, *seconds),
        [minutes, seconds] => (0, minutes.parse::<u64>().map_err(|_| invalid())?, *seconds),
        [hours, minutes, seconds] => {
            let minutes = minutes.parse::<u64>().map_err(|_| invalid())?;
            if minutes >= 60 {
                return Err(invalid());
            }
            (hours.parse::<u64>().map_err(|_| invalid())?, minutes, *seconds)
        }
        _ => return Err(invalid()),
    };

    let seconds_ms = parse_seconds_ms(seconds_part).ok_or_else(invalid)?;
    if parts.len() > 1 && seconds_ms >= 60_000 {
        return Err(invalid());
    }

    hours
        .checked_mul(3_600_000)
        .and_then(|ms| ms.checked_add(minutes.checked_mul(60_000)?))
        .and_then(|ms| ms.checked_add(seconds_ms))
        .ok_or_else(invalid)
}

/// `"12.5"` -> 12500; digits past the millisecond are truncated
fn parse_seconds_ms(text: &str) -> Option<u64> {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole_ms = if whole.is_empty() {
        0
    } else {
        whole.parse::<u64>().ok()?.checked_mul(1000)?
    };
    let mut millis = 0u64;
    for (i, digit) in fraction.chars().take(3).enumerate() {
        let value = digit.to_digit(10)? as u64;
        millis += value * 10u64.pow(2 - i as u32);
    }
    whole_ms.checked_add(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds_ms() {
        assert_eq!(format_seconds_ms(0), "0.000");
        assert_eq!(format_seconds_ms(5_000), "5.000");
        assert_eq!(format_seconds_ms(15_000), "15.000");
        assert_eq!(format_seconds_ms(1_005), "1.005");
        assert_eq!(format_seconds_ms(3_723_456), "3723.456");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0, false), "00:00");
        assert_eq!(format_clock(65_999, false), "01:05");
        assert_eq!(format_clock(3_723_000, true), "01:02:03");
        assert_eq!(format_clock(61_000, true), "00:01:01");
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_time_ms("90.5").unwrap(), 90_500);
        assert_eq!(parse_time_ms("12").unwrap(), 12_000);
        assert_eq!(parse_time_ms(".25").unwrap(), 250);
        assert_eq!(parse_time_ms("1.23456").unwrap(), 1_234);
    }

    #[test]
    fn test_parse_clock_formats() {
        assert_eq!(parse_time_ms("01:30").unwrap(), 90_000);
        assert_eq!(parse_time_ms("01:30.500").unwrap(), 90_500);
        assert_eq!(parse_time_ms("01:02:03.456").unwrap(), 3_723_456);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_time_ms("invalid").is_err());
        assert!(parse_time_ms("-10").is_err());
        assert!(parse_time_ms("00:60").is_err());
        assert!(parse_time_ms("01:60:00").is_err());
        assert!(parse_time_ms("1:2:3:4").is_err());
        assert!(parse_time_ms("").is_err());
    }

    #[test]
    fn test_parse_out_of_range_is_invalid() {
        assert!(parse_time_ms("5124095576030432:00:00").is_err());
        assert!(parse_time_ms("307445734561826:00").is_err());
        assert!(parse_time_ms("18446744073709551615").is_err());
        assert_eq!(parse_time_ms("5124095:00:00").unwrap(), 5_124_095 * 3_600_000);
    }
}
