//! TTL Module
//!
//! Parses human-readable durations (`"10sec"`, `"5min"`, `"2hr"`) and resolves
//! the cache's configured TTL into a concrete `Duration`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Duration string used when the configured TTL text is empty.
pub const DEFAULT_TTL_TEXT: &str = "10sec";

/// Recognized unit suffixes, checked in this order. First match wins.
const UNITS: [&str; 9] = ["s", "sec", "second", "m", "min", "minute", "h", "hr", "hour"];

// == Format ==
/// Converts a duration string into a number of seconds.
///
/// The unit is the first suffix of `s, sec, second, m, min, minute, h, hr, hour`
/// the string ends with, so `"5minutes"` is read as `"5minute"` + `s`.
/// Returns 0 when no suffix matches or the numeric part cannot be parsed.
pub fn format(time: &str) -> f64 {
    let Some((unit, number)) = UNITS
        .iter()
        .find_map(|unit| time.strip_suffix(unit).map(|rest| (*unit, rest)))
    else {
        return 0.0;
    };

    let Some(number) = leading_float(number) else {
        return 0.0;
    };

    match unit {
        "s" | "sec" | "second" => number,
        "m" | "min" | "minute" => number * 60.0,
        "h" | "hr" | "hour" => number * 3600.0,
        _ => 0.0,
    }
}

/// Parses the longest decimal float prefix of `input`, ignoring leading whitespace.
fn leading_float(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut at: usize| {
        while at < bytes.len() && bytes[at].is_ascii_digit() {
            at += 1;
        }
        at
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        digits += frac_end - (end + 1);
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_start = end + 1;
        if matches!(bytes.get(exp_start), Some(b'+' | b'-')) {
            exp_start += 1;
        }
        let exp_end = digits_from(exp_start);
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

// == TTL Spec ==
/// The cache-wide TTL setting.
///
/// Numbers are milliseconds; strings are parsed with [`format`] and read as
/// seconds. Both resolve to a `Duration` before they touch a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TtlSpec {
    /// Raw milliseconds
    Millis(i64),
    /// Duration string such as `"10sec"`
    Text(String),
}

impl TtlSpec {
    // == Resolve ==
    /// Resolves the TTL into a positive duration.
    ///
    /// An empty string falls back to [`DEFAULT_TTL_TEXT`]. Anything that does
    /// not resolve to a finite positive duration is `CacheError::InvalidTtl`.
    pub fn resolve(&self) -> Result<Duration> {
        match self {
            TtlSpec::Millis(ms) if *ms > 0 => Ok(Duration::from_millis(*ms as u64)),
            TtlSpec::Millis(ms) => Err(CacheError::InvalidTtl(format!("{}ms", ms))),
            TtlSpec::Text(text) => {
                let text = if text.is_empty() {
                    DEFAULT_TTL_TEXT
                } else {
                    text.as_str()
                };
                let seconds = format(text);
                if !(seconds.is_finite() && seconds > 0.0) {
                    return Err(CacheError::InvalidTtl(format!(
                        "'{}' resolves to {} seconds",
                        text, seconds
                    )));
                }
                Duration::try_from_secs_f64(seconds)
                    .map_err(|e| CacheError::InvalidTtl(format!("'{}': {}", text, e)))
            }
        }
    }
}

impl fmt::Display for TtlSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TtlSpec::Millis(ms) => write!(f, "{}ms", ms),
            TtlSpec::Text(text) => f.write_str(text),
        }
    }
}

impl FromStr for TtlSpec {
    type Err = std::convert::Infallible;

    /// Integers become milliseconds, everything else a duration string.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.parse::<i64>() {
            Ok(ms) => TtlSpec::Millis(ms),
            Err(_) => TtlSpec::Text(trimmed.to_string()),
        })
    }
}

impl From<i64> for TtlSpec {
    fn from(ms: i64) -> Self {
        TtlSpec::Millis(ms)
    }
}

impl From<&str> for TtlSpec {
    fn from(text: &str) -> Self {
        TtlSpec::Text(text.to_string())
    }
}

impl From<String> for TtlSpec {
    fn from(text: String) -> Self {
        TtlSpec::Text(text)
    }
}
