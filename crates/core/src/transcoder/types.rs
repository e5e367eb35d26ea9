//! Trim ranges.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::TranscodeError;

/// Half-open time window `[start, end)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
}

impl TrimRange {
    /// Creates a range without validating it.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Builds a range from optional request bounds.
    ///
    /// Both bounds absent means no trimming. Supplying only one of them is
    /// rejected, as is any range that fails [`validate`](Self::validate).
    pub fn from_bounds(
        start: Option<f64>,
        end: Option<f64>,
    ) -> Result<Option<Self>, TranscodeError> {
        match (start, end) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => {
                let range = Self::new(start, end);
                range.validate()?;
                Ok(Some(range))
            }
            (Some(_), None) => Err(TranscodeError::invalid_range("endTime is required with startTime")),
            (None, Some(_)) => Err(TranscodeError::invalid_range("startTime is required with endTime")),
        }
    }

    /// Checks the bounds are finite, non-negative and ordered.
    pub fn validate(&self) -> Result<(), TranscodeError> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(TranscodeError::invalid_range("bounds must be finite numbers"));
        }
        if self.start < 0.0 {
            return Err(TranscodeError::invalid_range("start must not be negative"));
        }
        if self.end <= self.start {
            return Err(TranscodeError::invalid_range(format!(
                "end ({}) must be greater than start ({})",
                self.end, self.start
            )));
        }
        Ok(())
    }

    /// Length of the window in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl fmt::Display for TrimRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
