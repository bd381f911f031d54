//! Artificial latency injected before the upstream call.
//!
//! Used to exercise downstream timeout behavior. The pause is scoped to the
//! request being processed; other requests are unaffected.

use std::num::ParseIntError;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DelayParseError {
    #[error("{value:?} is not a non-negative integer: {source}")]
    NotAnInteger {
        value: String,
        source: ParseIntError,
    },

    #[error("{0:?} is negative")]
    Negative(String),

    #[error("{0:?} has a misplaced `_` separator")]
    Separator(String),
}

/// Configured pause, or none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArtificialDelay(Option<Duration>);

impl ArtificialDelay {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn from_millis(millis: u64) -> Self {
        Self(Some(Duration::from_millis(millis)))
    }

    /// Parse a millisecond count.
    ///
    /// Absent or empty values mean no delay. Accepts decimal and `0x`, `0o`,
    /// `0b` prefixed integers. `_` may separate digits, as in `1_000` or
    /// `0x_ff`.
    pub fn parse(raw: Option<&str>) -> Result<Self, DelayParseError> {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return Ok(Self::none());
        };

        let unsigned = match raw.strip_prefix('-') {
            Some(_) => return Err(DelayParseError::Negative(raw.to_string())),
            None => raw.strip_prefix('+').unwrap_or(raw),
        };

        let lower = unsigned.to_ascii_lowercase();
        let (radix, body, prefixed) = if let Some(hex) = lower.strip_prefix("0x") {
            (16, hex, true)
        } else if let Some(oct) = lower.strip_prefix("0o") {
            (8, oct, true)
        } else if let Some(bin) = lower.strip_prefix("0b") {
            (2, bin, true)
        } else {
            (10, lower.as_str(), false)
        };

        // `_` may only sit between digits, or right after a base prefix.
        let misplaced = body.ends_with('_')
            || body.contains("__")
            || (!prefixed && body.starts_with('_'));
        if misplaced {
            return Err(DelayParseError::Separator(raw.to_string()));
        }

        u64::from_str_radix(&body.replace('_', ""), radix)
            .map(Self::from_millis)
            .map_err(|source| DelayParseError::NotAnInteger {
                value: raw.to_string(),
                source,
            })
    }

    pub fn duration(&self) -> Option<Duration> {
        self.0
    }

    /// Suspend the calling request for the configured duration.
    pub async fn pause(&self) {
        if let Some(duration) = self.0.filter(|d| !d.is_zero()) {
            tokio::time::sleep(duration).await;
        }
    }
}
