//! Frame ranges and the farm's frame-string syntax.
//!
//! Accepted forms: `5`, `1-100`, `-20--10`, and a step written as
//! `1-100:2`, `1-100x2`, `1-100 step 2`, `1-100 by 2` or `1-100 every 2`.
//! A `FrameSet` also takes comma lists of those, e.g. `1,5,10-20`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{ChunkingError, FrameParseError};

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(-?\d+)(?:\s*-\s*(-?\d+))?(?:\s*(?::|x|step|by|every)\s*(\d+))?\s*$")
        .expect("frame range pattern is valid")
});

/// Inclusive frame range on a step grid. `end` always lies on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FrameRange {
    start: i64,
    end: i64,
    step: i64,
}

impl FrameRange {
    /// Build a range, snapping `end` down onto the step grid.
    pub fn new(start: i64, end: i64, step: i64) -> Result<Self, ChunkingError> {
        if step < 1 || start > end {
            return Err(ChunkingError::InvalidFrameRange { start, end, step });
        }
        let end = start + ((end - start) / step) * step;
        Ok(FrameRange { start, end, step })
    }

    pub fn single(frame: i64) -> Self {
        FrameRange {
            start: frame,
            end: frame,
            step: 1,
        }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    /// Number of frames rendered.
    pub fn frame_count(&self) -> u64 {
        ((self.end - self.start) / self.step) as u64 + 1
    }

    /// The `index`-th frame of the range.
    pub fn frame_at(&self, index: u64) -> i64 {
        self.start + index as i64 * self.step
    }

    pub fn frames(&self) -> impl Iterator<Item = i64> {
        let range = *self;
        (0..range.frame_count()).map(move |i| range.frame_at(i))
    }
}

impl fmt::Display for FrameRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else if self.step == 1 {
            write!(f, "{}-{}", self.start, self.end)
        } else {
            write!(f, "{}-{}:{}", self.start, self.end, self.step)
        }
    }
}

impl FromStr for FrameRange {
    type Err = FrameParseError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = || FrameParseError {
            spec: spec.to_string(),
        };
        let caps = RANGE_RE.captures(spec).ok_or_else(invalid)?;

        let first: i64 = caps[1].parse().map_err(|_| invalid())?;
        let last: i64 = match caps.get(2) {
            Some(m) => m.as_str().parse().map_err(|_| invalid())?,
            None => first,
        };
        let step: i64 = match caps.get(3) {
            Some(m) => m.as_str().parse().map_err(|_| invalid())?,
            None => 1,
        };

        // Reversed bounds are accepted and swapped.
        let (start, end) = if first <= last { (first, last) } else { (last, first) };
        FrameRange::new(start, end, step).map_err(|_| invalid())
    }
}

/// Frames a job renders: one or more ranges in ascending order with no
/// frame in two of them. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FrameSet {
    runs: Vec<FrameRange>,
}

impl FrameSet {
    /// Combine ranges into a set. A single range keeps its step; several
    /// ranges are merged into ascending unit-step runs, overlaps and
    /// duplicates collapsing.
    fn from_ranges(ranges: Vec<FrameRange>) -> Option<Self> {
        if ranges.len() <= 1 {
            return (!ranges.is_empty()).then_some(FrameSet { runs: ranges });
        }

        let mut spans: Vec<(i64, i64)> = Vec::new();
        for range in &ranges {
            if range.step() == 1 {
                spans.push((range.start(), range.end()));
            } else {
                spans.extend(range.frames().map(|f| (f, f)));
            }
        }
        spans.sort_unstable();

        let mut merged: Vec<(i64, i64)> = Vec::with_capacity(spans.len());
        for (start, end) in spans {
            match merged.last_mut() {
                Some(last) if start <= last.1 + 1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }
        let runs = merged
            .into_iter()
            .map(|(start, end)| FrameRange { start, end, step: 1 })
            .collect();
        Some(FrameSet { runs })
    }

    pub fn runs(&self) -> &[FrameRange] {
        &self.runs
    }

    /// First frame rendered.
    pub fn start(&self) -> i64 {
        self.runs.first().map_or(0, FrameRange::start)
    }

    pub fn frame_count(&self) -> u64 {
        self.runs.iter().map(FrameRange::frame_count).sum()
    }
}

impl From<FrameRange> for FrameSet {
    fn from(range: FrameRange) -> Self {
        FrameSet { runs: vec![range] }
    }
}

impl fmt::Display for FrameSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, run) in self.runs.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{run}")?;
        }
        Ok(())
    }
}

impl FromStr for FrameSet {
    type Err = FrameParseError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = || FrameParseError {
            spec: spec.to_string(),
        };
        let ranges = spec
            .split(',')
            .map(str::parse::<FrameRange>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;
        FrameSet::from_ranges(ranges).ok_or_else(invalid)
    }
}
