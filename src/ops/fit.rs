//! Display fit: merge intervals closer than one pixel
//!
//! At `pixels_per_base` the gap between two neighbours renders as
//! `gap * pixels_per_base` pixels. Neighbours closer than one pixel merge,
//! transitively, into one interval whose score is the length-weighted mean
//! of its members. Above one pixel per base every interval already renders
//! as at least one pixel and the list is returned as is.

use crate::core::{
    CoordinateError, GenomeWideList, IntervalError, IntervalList, IntervalListBuilder,
    IntervalResult, OperationContext, OperationPool, Result, ScoredInterval,
};
use crate::ops::{map_chromosomes, query};
use log::debug;

fn check_resolution(pixels_per_base: f64) -> IntervalResult<()> {
    if !pixels_per_base.is_finite() || pixels_per_base <= 0.0 {
        return Err(IntervalError::InvalidResolution(pixels_per_base));
    }
    Ok(())
}

/// Running merge of consecutive intervals
struct MergeRun {
    interval: ScoredInterval,
    weighted_sum: f64,
    covered: i64,
}

impl MergeRun {
    fn start(interval: ScoredInterval) -> Self {
        Self {
            interval,
            weighted_sum: f64::from(interval.score) * interval.len() as f64,
            covered: interval.len(),
        }
    }

    fn absorb(&mut self, next: &ScoredInterval) {
        self.interval.stop = self.interval.stop.max(next.stop);
        self.weighted_sum += f64::from(next.score) * next.len() as f64;
        self.covered += next.len();
    }

    fn finish(self) -> ScoredInterval {
        ScoredInterval {
            score: (self.weighted_sum / self.covered as f64) as f32,
            ..self.interval
        }
    }
}

fn merge_by_pixel(list: &IntervalList, pixels_per_base: f64) -> IntervalList {
    let mut iter = list.iter();
    let Some(first) = iter.next() else {
        return list.clone();
    };

    let mut builder = IntervalListBuilder::with_capacity(list.len());
    let mut run = MergeRun::start(*first);
    for next in iter {
        let gap = next.start - run.interval.stop;
        if (gap as f64) * pixels_per_base < 1.0 {
            run.absorb(next);
        } else {
            builder.push_interval(run.finish());
            run = MergeRun::start(*next);
        }
    }
    builder.push_interval(run.finish());
    builder.build()
}

/// Fit one chromosome's list to a display resolution.
///
/// # Examples
/// ```
/// use metagenome_sync::core::IntervalListBuilder;
/// use metagenome_sync::ops::fit;
///
/// let mut builder = IntervalListBuilder::new();
/// builder.push(0, 10, 1.0).unwrap();
/// builder.push(12, 20, 1.0).unwrap();
/// let list = builder.build();
///
/// assert_eq!(fit(&list, 0.2).unwrap().len(), 1);
/// assert_eq!(fit(&list, 1.0).unwrap().len(), 2);
/// ```
pub fn fit(list: &IntervalList, pixels_per_base: f64) -> IntervalResult<IntervalList> {
    check_resolution(pixels_per_base)?;
    if pixels_per_base > 1.0 || list.len() < 2 {
        return Ok(list.clone());
    }
    Ok(merge_by_pixel(list, pixels_per_base))
}

/// Fit every chromosome of a track, one pool unit per chromosome
pub fn fit_genome_wide(
    track: &GenomeWideList,
    pixels_per_base: f64,
    pool: &OperationPool,
    ctx: &OperationContext,
) -> Result<GenomeWideList> {
    check_resolution(pixels_per_base)?;
    let fitted = map_chromosomes(track, pool, ctx, |_, list, _| {
        if pixels_per_base > 1.0 || list.len() < 2 {
            Ok(list.clone())
        } else {
            Ok(merge_by_pixel(list, pixels_per_base))
        }
    })?;
    debug!(
        "Fitted {} intervals into {} at {} px/base",
        track.total_intervals(),
        fitted.total_intervals(),
        pixels_per_base
    );
    Ok(fitted)
}

#[derive(Debug, Clone)]
struct CachedFit {
    pixels_per_base: f64,
    chromosome: usize,
    list: IntervalList,
}

/// Remembers the last fitted chromosome so repeated window queries at the
/// same zoom do not refit
#[derive(Debug, Clone)]
pub struct DisplayCache {
    track: GenomeWideList,
    last: Option<CachedFit>,
    hits: usize,
    misses: usize,
}

impl DisplayCache {
    pub fn new(track: GenomeWideList) -> Self {
        Self {
            track,
            last: None,
            hits: 0,
            misses: 0,
        }
    }

    pub fn track(&self) -> &GenomeWideList {
        &self.track
    }

    /// Fitted list of a chromosome at a resolution
    pub fn fitted(&mut self, chrom: &str, pixels_per_base: f64) -> Result<IntervalList> {
        let index = self
            .track
            .chromosomes()
            .index_of(chrom)
            .ok_or_else(|| CoordinateError::UnknownChromosome(chrom.to_string()))?;

        if let Some(cached) = &self.last {
            if cached.chromosome == index && cached.pixels_per_base.to_bits() == pixels_per_base.to_bits() {
                self.hits += 1;
                return Ok(cached.list.clone());
            }
        }

        let source = self.track.lists()[index].clone();
        let list = fit(&source, pixels_per_base)?;
        self.misses += 1;
        self.last = Some(CachedFit {
            pixels_per_base,
            chromosome: index,
            list: list.clone(),
        });
        Ok(list)
    }

    /// Fitted intervals overlapping a window, clipped to it
    pub fn query(
        &mut self,
        chrom: &str,
        pixels_per_base: f64,
        start: i64,
        stop: i64,
    ) -> Result<Vec<ScoredInterval>> {
        let list = self.fitted(chrom, pixels_per_base)?;
        Ok(query(&list, start, stop))
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Chromosome, ChromosomeList, MetaGenomeError};

    fn build(intervals: &[(i64, i64, f32)]) -> IntervalList {
        let mut builder = IntervalListBuilder::new();
        for &(start, stop, score) in intervals {
            builder.push(start, stop, score).unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_sub_pixel_gap_merges() {
        let list = build(&[(0, 10, 1.0), (12, 20, 1.0)]);
        let fitted = fit(&list, 0.2).unwrap();
        assert_eq!(fitted.as_slice(), &[ScoredInterval::new(0, 20, 1.0)]);
    }

    #[test]
    fn test_pixel_gap_stays_separate() {
        let list = build(&[(0, 10, 1.0), (12, 20, 1.0)]);
        let fitted = fit(&list, 1.0).unwrap();
        assert_eq!(fitted, list);
    }

    #[test]
    fn test_zoomed_in_returns_input() {
        let list = build(&[(0, 10, 1.0), (10, 20, 2.0)]);
        let fitted = fit(&list, 4.0).unwrap();
        assert!(fitted.shares_storage(&list));
    }

    #[test]
    fn test_merge_is_transitive() {
        let list = build(&[(0, 10, 1.0), (13, 20, 1.0), (23, 30, 1.0), (100, 110, 1.0)]);
        let fitted = fit(&list, 0.25).unwrap();
        assert_eq!(
            fitted.as_slice(),
            &[ScoredInterval::new(0, 30, 1.0), ScoredInterval::new(100, 110, 1.0)]
        );
    }

    #[test]
    fn test_merged_score_is_length_weighted() {
        let list = build(&[(0, 10, 1.0), (10, 40, 5.0)]);
        let fitted = fit(&list, 0.5).unwrap();
        assert_eq!(fitted.len(), 1);
        assert!((fitted[0].score - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(fit(&IntervalList::empty(), 0.1).unwrap().is_empty());
        let one = build(&[(5, 6, 2.0)]);
        assert_eq!(fit(&one, 0.001).unwrap(), one);
    }

    #[test]
    fn test_invalid_resolution() {
        let list = build(&[(0, 10, 1.0)]);
        for ppb in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(fit(&list, ppb), Err(IntervalError::InvalidResolution(_))));
        }
    }

    fn track() -> GenomeWideList {
        let chroms = ChromosomeList::new(vec![Chromosome::new("chr1", 100), Chromosome::new("chr2", 100)]);
        let lists = vec![build(&[(0, 10, 1.0), (12, 20, 1.0)]), build(&[(50, 60, 3.0)])];
        GenomeWideList::from_lists(chroms, lists).unwrap()
    }

    #[test]
    fn test_fit_genome_wide() {
        let pool = OperationPool::with_workers(2).unwrap();
        let fitted = fit_genome_wide(&track(), 0.2, &pool, &OperationContext::new()).unwrap();
        assert_eq!(fitted.total_intervals(), 2);
        assert_eq!(fitted.by_name("chr1").unwrap()[0], ScoredInterval::new(0, 20, 1.0));

        let err = fit_genome_wide(&track(), 0.0, &pool, &OperationContext::new());
        assert!(matches!(err, Err(MetaGenomeError::Interval(_))));
    }

    #[test]
    fn test_display_cache_reuses_last_fit() {
        let mut cache = DisplayCache::new(track());

        let first = cache.query("chr1", 0.2, 5, 15).unwrap();
        assert_eq!(first, vec![ScoredInterval::new(5, 15, 1.0)]);
        cache.query("chr1", 0.2, 0, 50).unwrap();
        assert_eq!((cache.hits(), cache.misses()), (1, 1));

        cache.query("chr1", 1.0, 0, 50).unwrap();
        cache.query("2", 1.0, 0, 50).unwrap();
        assert_eq!(cache.misses(), 3);

        assert!(matches!(
            cache.fitted("chr9", 1.0),
            Err(MetaGenomeError::Coordinate(CoordinateError::UnknownChromosome(_)))
        ));
    }
}
