use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in media time as produced by the annotation source.
///
/// The model is free to emit timecodes either as bare numbers of seconds or
/// as clock-style strings (`SS`, `MM:SS`, `HH:MM:SS`, fractional seconds
/// allowed on the last component). The original representation is kept so
/// exports can reproduce it verbatim; [`parse_timecode`] canonicalizes it
/// to seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimecodeInput {
    Seconds(f64),
    Text(String),
}

impl TimecodeInput {
    /// Canonical seconds for this timecode.
    pub fn seconds(&self) -> f64 {
        parse_timecode(self)
    }
}

impl From<f64> for TimecodeInput {
    fn from(seconds: f64) -> Self {
        TimecodeInput::Seconds(seconds)
    }
}

impl From<&str> for TimecodeInput {
    fn from(text: &str) -> Self {
        TimecodeInput::Text(text.to_string())
    }
}

impl fmt::Display for TimecodeInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimecodeInput::Seconds(s) if s.fract() == 0.0 => write!(f, "{}", *s as i64),
            TimecodeInput::Seconds(s) => write!(f, "{}", s),
            TimecodeInput::Text(t) => f.write_str(t),
        }
    }
}

/// Convert a timecode to canonical seconds.
///
/// Numeric input passes through unchanged. Malformed text (any non-numeric
/// component, or more than three colon-separated components) yields `0.0`
/// rather than an error: annotation output is model-generated and noisy, and
/// the playback path must keep rendering regardless.
pub fn parse_timecode(input: &TimecodeInput) -> f64 {
    match input {
        TimecodeInput::Seconds(s) => *s,
        TimecodeInput::Text(t) => parse_timecode_str(t),
    }
}

/// Parse a timecode string (`SS`, `MM:SS`, or `HH:MM:SS`) to seconds.
pub fn parse_timecode_str(text: &str) -> f64 {
    if !text.contains(':') {
        return text.trim().parse::<f64>().unwrap_or(0.0);
    }

    let mut components = Vec::new();
    for part in text.split(':') {
        match part.trim().parse::<f64>() {
            Ok(value) => components.push(value),
            Err(_) => return 0.0,
        }
    }

    match components.as_slice() {
        [m, s] => m * 60.0 + s,
        [h, m, s] => h * 3600.0 + m * 60.0 + s,
        // One component can't happen (no colon); four or more is treated
        // like any other malformed timecode.
        _ => 0.0,
    }
}

/// Format seconds as on-screen elapsed/total time (`M:SS`).
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Format seconds as a subtitle timestamp (`HH:MM:SS,mmm`).
pub fn format_subtitle_timestamp(seconds: f64) -> String {
    let clamped = seconds.max(0.0);
    let whole = clamped.floor() as u64;
    let hours = whole / 3600;
    let minutes = (whole % 3600) / 60;
    let secs = whole % 60;
    let millis = ((clamped - clamped.floor()) * 1000.0).floor() as u32;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock_strings() {
        assert_eq!(parse_timecode_str("01:02:03"), 3723.0);
        assert_eq!(parse_timecode_str("02:03"), 123.0);
        assert_eq!(parse_timecode_str("45"), 45.0);
        assert_eq!(parse_timecode_str("0:05"), 5.0);
        assert_eq!(parse_timecode_str("1:02:03.5"), 3723.5);
    }

    #[test]
    fn test_parse_numeric_passthrough() {
        assert_eq!(parse_timecode(&TimecodeInput::Seconds(90.0)), 90.0);
        assert_eq!(parse_timecode(&TimecodeInput::Seconds(0.25)), 0.25);
    }

    #[test]
    fn test_malformed_falls_back_to_zero() {
        assert_eq!(parse_timecode_str("bad"), 0.0);
        assert_eq!(parse_timecode_str("1:bad"), 0.0);
        assert_eq!(parse_timecode_str("bad:30"), 0.0);
        assert_eq!(parse_timecode_str(""), 0.0);
        assert_eq!(parse_timecode_str("5:"), 0.0);
        // Four components are malformed, same fallback.
        assert_eq!(parse_timecode_str("1:2:3:4"), 0.0);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(65.9), "1:05");
        assert_eq!(format_clock(600.0), "10:00");
        assert_eq!(format_clock(-3.0), "0:00");
    }

    #[test]
    fn test_format_subtitle_timestamp() {
        assert_eq!(format_subtitle_timestamp(3723.456), "01:02:03,456");
        assert_eq!(format_subtitle_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_subtitle_timestamp(5.0), "00:00:05,000");
        assert_eq!(format_subtitle_timestamp(-1.0), "00:00:00,000");
    }

    #[test]
    fn test_display_preserves_original_form() {
        assert_eq!(TimecodeInput::Text("0:05".to_string()).to_string(), "0:05");
        assert_eq!(TimecodeInput::Seconds(90.0).to_string(), "90");
        assert_eq!(TimecodeInput::Seconds(1.5).to_string(), "1.5");
    }

    #[test]
    fn test_timecode_deserializes_from_number_or_string() {
        let number: TimecodeInput = serde_json::from_str("12.5").unwrap();
        assert_eq!(number, TimecodeInput::Seconds(12.5));

        let text: TimecodeInput = serde_json::from_str("\"1:02\"").unwrap();
        assert_eq!(text, TimecodeInput::Text("1:02".to_string()));
        assert_eq!(text.seconds(), 62.0);
    }
}
