//! Scored intervals and immutable interval lists
//!
//! An [`IntervalList`] is the per-chromosome result of every track
//! operation: sorted by start, `start < stop`, non-overlapping. Lists are
//! shared behind an `Arc` and never mutated once built; operations produce
//! new lists through an [`IntervalListBuilder`](crate::core::IntervalListBuilder).

use crate::core::chromosome::{Chromosome, ChromosomeList};
use crate::core::error::{IntervalError, IntervalResult};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A `[start, stop)` window with a score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredInterval {
    pub start: i64,
    pub stop: i64,
    pub score: f32,
}

impl ScoredInterval {
    pub fn new(start: i64, stop: i64, score: f32) -> Self {
        Self { start, stop, score }
    }

    /// Checked constructor
    pub fn try_new(start: i64, stop: i64, score: f32) -> IntervalResult<Self> {
        if start >= stop {
            return Err(IntervalError::InvalidInterval { start, stop });
        }
        Ok(Self { start, stop, score })
    }

    #[inline]
    pub fn len(&self) -> i64 {
        self.stop - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stop <= self.start
    }

    #[inline]
    pub fn overlaps(&self, start: i64, stop: i64) -> bool {
        self.start < stop && self.stop > start
    }

    /// Copy clipped to `[start, stop)`
    #[inline]
    pub fn clipped(&self, start: i64, stop: i64) -> Self {
        Self {
            start: self.start.max(start),
            stop: self.stop.min(stop),
            score: self.score,
        }
    }
}

impl fmt::Display for ScoredInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.start, self.stop, self.score)
    }
}

/// Immutable, start-sorted, non-overlapping interval list
#[derive(Debug, Clone)]
pub struct IntervalList {
    intervals: Arc<[ScoredInterval]>,
}

impl IntervalList {
    /// Wrap intervals already known to be sorted and non-overlapping
    pub(crate) fn from_sorted(intervals: Vec<ScoredInterval>) -> Self {
        debug_assert!(intervals.windows(2).all(|w| w[0].stop <= w[1].start));
        Self {
            intervals: intervals.into(),
        }
    }

    pub fn empty() -> Self {
        Self::from_sorted(Vec::new())
    }

    pub fn as_slice(&self) -> &[ScoredInterval] {
        &self.intervals
    }

    /// Number of bases covered by the list
    pub fn covered_length(&self) -> i64 {
        self.intervals.iter().map(|iv| iv.len()).sum()
    }

    /// `(first start, last stop)` of the list
    pub fn extent(&self) -> Option<(i64, i64)> {
        match (self.intervals.first(), self.intervals.last()) {
            (Some(first), Some(last)) => Some((first.start, last.stop)),
            _ => None,
        }
    }

    /// True when both lists share the same backing storage
    pub fn shares_storage(&self, other: &IntervalList) -> bool {
        Arc::ptr_eq(&self.intervals, &other.intervals)
    }
}

impl Default for IntervalList {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for IntervalList {
    type Target = [ScoredInterval];

    fn deref(&self) -> &Self::Target {
        &self.intervals
    }
}

impl PartialEq for IntervalList {
    fn eq(&self, other: &Self) -> bool {
        self.intervals[..] == other.intervals[..]
    }
}

/// One interval list per chromosome, indexed like the chromosome list
#[derive(Debug, Clone, PartialEq)]
pub struct GenomeWideList {
    chromosomes: ChromosomeList,
    lists: Vec<IntervalList>,
}

impl GenomeWideList {
    /// Empty list for every chromosome
    pub fn new(chromosomes: ChromosomeList) -> Self {
        let lists = vec![IntervalList::empty(); chromosomes.len()];
        Self { chromosomes, lists }
    }

    /// Pair per-chromosome lists with their chromosome layout
    pub fn from_lists(chromosomes: ChromosomeList, lists: Vec<IntervalList>) -> IntervalResult<Self> {
        if lists.len() != chromosomes.len() {
            return Err(IntervalError::ChromosomeMismatch {
                left: chromosomes.len(),
                right: lists.len(),
            });
        }
        Ok(Self { chromosomes, lists })
    }

    /// Lists already indexed like `chromosomes`
    pub(crate) fn from_indexed(chromosomes: ChromosomeList, lists: Vec<IntervalList>) -> Self {
        debug_assert_eq!(chromosomes.len(), lists.len());
        Self { chromosomes, lists }
    }

    pub fn chromosomes(&self) -> &ChromosomeList {
        &self.chromosomes
    }

    pub fn get(&self, index: usize) -> Option<&IntervalList> {
        self.lists.get(index)
    }

    /// List of a chromosome, trying different naming styles
    pub fn by_name(&self, chrom: &str) -> Option<&IntervalList> {
        self.chromosomes.index_of(chrom).and_then(|i| self.get(i))
    }

    pub fn lists(&self) -> &[IntervalList] {
        &self.lists
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Chromosome, &IntervalList)> {
        self.chromosomes.iter().zip(self.lists.iter())
    }

    pub fn total_intervals(&self) -> usize {
        self.lists.iter().map(|l| l.len()).sum()
    }

    /// Error unless both lists share the same chromosome layout
    pub fn check_layout(&self, other: &GenomeWideList) -> IntervalResult<()> {
        if !self.chromosomes.same_layout(&other.chromosomes) {
            return Err(IntervalError::ChromosomeMismatch {
                left: self.chromosomes.len(),
                right: other.chromosomes.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IntervalListBuilder;

    #[test]
    fn test_try_new_rejects_empty() {
        assert!(ScoredInterval::try_new(10, 10, 1.0).is_err());
        assert!(ScoredInterval::try_new(10, 5, 1.0).is_err());
        assert!(ScoredInterval::try_new(5, 10, 1.0).is_ok());
    }

    #[test]
    fn test_overlaps_and_clip() {
        let iv = ScoredInterval::new(10, 20, 2.0);
        assert!(iv.overlaps(19, 30));
        assert!(!iv.overlaps(20, 30));
        assert!(!iv.overlaps(0, 10));

        let clipped = iv.clipped(15, 100);
        assert_eq!(clipped, ScoredInterval::new(15, 20, 2.0));
        assert_eq!(iv.start, 10);
    }

    #[test]
    fn test_list_extent_and_coverage() {
        let mut builder = IntervalListBuilder::new();
        builder.push(0, 10, 1.0).unwrap();
        builder.push(20, 25, 1.0).unwrap();
        let list = builder.build();

        assert_eq!(list.len(), 2);
        assert_eq!(list.extent(), Some((0, 25)));
        assert_eq!(list.covered_length(), 15);
        assert_eq!(IntervalList::empty().extent(), None);
    }

    #[test]
    fn test_clone_shares_storage() {
        let mut builder = IntervalListBuilder::new();
        builder.push(0, 10, 1.0).unwrap();
        let list = builder.build();
        let copy = list.clone();

        assert!(list.shares_storage(&copy));
        assert_eq!(list, copy);
    }

    #[test]
    fn test_genome_wide_layout() {
        let chroms = ChromosomeList::new(vec![Chromosome::new("chr1", 100), Chromosome::new("chr2", 50)]);
        let track = GenomeWideList::new(chroms.clone());

        assert_eq!(track.lists().len(), 2);
        assert!(track.by_name("2").is_some());
        assert!(GenomeWideList::from_lists(chroms, vec![IntervalList::empty()]).is_err());
    }
}
