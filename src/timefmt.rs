//! # Timestamp and Duration Token Parsing
//!
//! Build-tool logs carry two unrelated time formats:
//!
//! - Wall-clock stamps of the form `HH:MM:SS`, printed by the Go stdlib
//!   logger inside `tdfs` (e.g. `2024/05/01 12:00:01 Parsing manifest file`).
//!   These are only meaningful as deltas between two stamps from the same
//!   invocation, so they are normalized to seconds since midnight.
//! - Elapsed durations of the form `M:SS.ss` with an `elapsed` suffix,
//!   printed by `time(1)` (e.g. `1:30.50elapsed`), which directly encode
//!   the total run time.
//!
//! Both parsers return a typed [`ParseError`] on malformed input. The phase
//! extractors recover from these locally; a bad token never aborts a scan.

use chrono::{NaiveTime, Timelike};
use thiserror::Error;

/// Suffix `time(1)` appends to its elapsed-time field
pub const ELAPSED_SUFFIX: &str = "elapsed";

/// Errors produced when a log token does not match the expected time shape
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Token is not a valid `HH:MM:SS` wall-clock stamp
    #[error("invalid wall-clock token {0:?} (expected HH:MM:SS)")]
    InvalidClock(String),

    /// Token is not a valid `M:SS.ss` elapsed duration
    #[error("invalid elapsed token {0:?} (expected M:SS.ss)")]
    InvalidElapsed(String),
}

/// Parse a strict `HH:MM:SS` token into seconds since midnight.
///
/// Invocations are assumed short (well under 24h), so two offsets from the
/// same log can be subtracted directly; midnight rollover is out of scope.
/// Range violations, wrong separators, and trailing characters are all
/// rejected.
pub fn clock_offset(token: &str) -> Result<f64, ParseError> {
    let time = NaiveTime::parse_from_str(token, "%H:%M:%S")
        .map_err(|_| ParseError::InvalidClock(token.to_string()))?;
    Ok(f64::from(time.num_seconds_from_midnight()))
}

/// Parse a `time(1)` elapsed token (`M:SS.ss`, optionally suffixed with
/// `elapsed`) into seconds.
///
/// Mirrors the field layout `time(1)` actually emits: a minutes part, one
/// colon, and a fractional seconds part. Hours-long runs roll into the
/// minutes field, so the minutes part is unbounded.
pub fn parse_elapsed(token: &str) -> Result<f64, ParseError> {
    let body = token.replace(ELAPSED_SUFFIX, "");
    let invalid = || ParseError::InvalidElapsed(token.to_string());

    let mut parts = body.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(minutes), Some(seconds), None) => {
            let minutes: u64 = minutes.parse().map_err(|_| invalid())?;
            let seconds: f64 = seconds.parse().map_err(|_| invalid())?;
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(invalid());
            }
            Ok(minutes as f64 * 60.0 + seconds)
        }
        _ => Err(invalid()),
    }
}

/// Format a duration in the `M:SS.ss` shape accepted by [`parse_elapsed`].
///
/// Used for operator-facing progress output; round-trips with
/// [`parse_elapsed`] within floating-point tolerance.
pub fn format_elapsed(secs: f64) -> String {
    let secs = secs.max(0.0);
    let minutes = (secs / 60.0).floor();
    let remainder = secs - minutes * 60.0;
    format!("{}:{:05.2}", minutes as u64, remainder)
}
