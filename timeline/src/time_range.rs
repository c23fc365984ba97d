//! Time value utilities.
//!
//! A [`TimeRange`] stores its bounds relative to an origin `offset`. The
//! offset is the absolute time of logical zero, so rendering code works with
//! small relative values while still being able to recover absolute times for
//! server queries.

#[cfg(test)]
#[path = "time_range_test.rs"]
mod time_range_test;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-open interval `[start, end)` in origin-relative time units.
///
/// `start <= end` holds after every constructor and mutator, deserialization
/// included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RangeFields")]
pub struct TimeRange {
    start: i64,
    end: i64,
    offset: i64,
}

#[derive(Deserialize)]
struct RangeFields {
    start: i64,
    end: i64,
    #[serde(default)]
    offset: i64,
}

impl From<RangeFields> for TimeRange {
    fn from(fields: RangeFields) -> Self {
        Self::with_offset(fields.start, fields.end, fields.offset)
    }
}

impl TimeRange {
    /// Build a range with no offset, swapping the bounds if needed.
    #[must_use]
    pub fn new(start: i64, end: i64) -> Self {
        Self::with_offset(start, end, 0)
    }

    /// Build a range whose bounds are relative to `offset`.
    #[must_use]
    pub fn with_offset(start: i64, end: i64, offset: i64) -> Self {
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        Self { start, end, offset }
    }

    /// A zero-length range at `t`.
    #[must_use]
    pub fn point(t: i64) -> Self {
        Self::new(t, t)
    }

    /// Build a relative range from absolute bounds.
    #[must_use]
    pub fn from_absolute(start: i64, end: i64, offset: i64) -> Self {
        Self::with_offset(start.saturating_sub(offset), end.saturating_sub(offset), offset)
    }

    #[must_use]
    pub fn start(&self) -> i64 {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> i64 {
        self.end
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Length of the interval.
    #[must_use]
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// Whether the range is a single point.
    #[must_use]
    pub fn is_point(&self) -> bool {
        self.start == self.end
    }

    #[must_use]
    pub fn absolute_start(&self) -> i64 {
        self.start.saturating_add(self.offset)
    }

    #[must_use]
    pub fn absolute_end(&self) -> i64 {
        self.end.saturating_add(self.offset)
    }

    /// Convert an absolute time into this range's coordinates.
    #[must_use]
    pub fn to_relative(&self, absolute: i64) -> i64 {
        absolute.saturating_sub(self.offset)
    }

    /// Convert a relative time into an absolute one.
    #[must_use]
    pub fn to_absolute(&self, relative: i64) -> i64 {
        relative.saturating_add(self.offset)
    }

    /// Replace both bounds, swapping if needed. The offset is kept.
    pub fn set(&mut self, start: i64, end: i64) {
        *self = Self::with_offset(start, end, self.offset);
    }

    /// Move both bounds by `delta`.
    #[must_use]
    pub fn shifted(&self, delta: i64) -> Self {
        Self::with_offset(self.start.saturating_add(delta), self.end.saturating_add(delta), self.offset)
    }

    /// Whether `t` lies inside `[start, end]`. Points contain their own time.
    #[must_use]
    pub fn contains(&self, t: i64) -> bool {
        t >= self.start && t <= self.end
    }

    /// Clamp `t` into `[start, end]`.
    #[must_use]
    pub fn clamp(&self, t: i64) -> i64 {
        t.clamp(self.start, self.end)
    }

    /// Whether the two ranges share any time.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The common part of both ranges, if any. Keeps `self`'s offset.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then(|| Self::with_offset(start, end, self.offset))
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)?;
        if self.offset != 0 {
            write!(f, " +{}", self.offset)?;
        }
        Ok(())
    }
}
