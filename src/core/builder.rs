//! Per-chromosome interval list builder
//!
//! A builder is owned by exactly one pool unit. Elements may be pushed in
//! any order; `build` sorts them and enforces the list invariants.

use crate::core::error::{IntervalError, IntervalResult};
use crate::core::interval::{IntervalList, ScoredInterval};
use log::debug;

/// How `build` treats overlapping elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Later elements are clipped to start where the previous one stops
    #[default]
    Scored,
    /// Overlapping and touching elements merge; every score becomes 1
    Mask,
}

/// Accumulates intervals for one chromosome
#[derive(Debug, Clone)]
pub struct IntervalListBuilder {
    intervals: Vec<ScoredInterval>,
    sorted: bool,
    mode: BuildMode,
}

impl IntervalListBuilder {
    pub fn new() -> Self {
        Self {
            intervals: Vec::new(),
            sorted: true,
            mode: BuildMode::Scored,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            intervals: Vec::with_capacity(capacity),
            sorted: true,
            mode: BuildMode::Scored,
        }
    }

    /// Builder producing a mask list
    pub fn mask() -> Self {
        Self {
            intervals: Vec::new(),
            sorted: true,
            mode: BuildMode::Mask,
        }
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Add one element; `start` must be lower than `stop`
    pub fn push(&mut self, start: i64, stop: i64, score: f32) -> IntervalResult<()> {
        if start >= stop {
            return Err(IntervalError::InvalidInterval { start, stop });
        }
        self.push_interval(ScoredInterval { start, stop, score });
        Ok(())
    }

    /// Add an element known to be non-empty; empty ones are ignored
    pub fn push_interval(&mut self, interval: ScoredInterval) {
        if interval.is_empty() {
            return;
        }
        if let Some(last) = self.intervals.last() {
            if interval.start < last.start {
                self.sorted = false;
            }
        }
        self.intervals.push(interval);
    }

    /// Sort, resolve overlaps and freeze the list
    pub fn build(mut self) -> IntervalList {
        if !self.sorted {
            // stable: equal starts keep push order
            self.intervals.sort_by_key(|iv| iv.start);
        }

        let resolved = match self.mode {
            BuildMode::Scored => clip_overlaps(self.intervals),
            BuildMode::Mask => merge_mask(self.intervals),
        };
        IntervalList::from_sorted(resolved)
    }
}

impl Default for IntervalListBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn clip_overlaps(intervals: Vec<ScoredInterval>) -> Vec<ScoredInterval> {
    let mut result: Vec<ScoredInterval> = Vec::with_capacity(intervals.len());
    let mut clipped = 0usize;

    for mut interval in intervals {
        if let Some(prev) = result.last() {
            if interval.start < prev.stop {
                interval.start = prev.stop;
                clipped += 1;
                if interval.is_empty() {
                    continue;
                }
            }
        }
        result.push(interval);
    }

    if clipped > 0 {
        debug!("Clipped {} overlapping intervals", clipped);
    }
    result
}

fn merge_mask(intervals: Vec<ScoredInterval>) -> Vec<ScoredInterval> {
    let mut result: Vec<ScoredInterval> = Vec::with_capacity(intervals.len());

    for interval in intervals {
        match result.last_mut() {
            Some(prev) if interval.start <= prev.stop => {
                prev.stop = prev.stop.max(interval.stop);
            }
            _ => result.push(ScoredInterval {
                start: interval.start,
                stop: interval.stop,
                score: 1.0,
            }),
        }
    }
    result
}
