//! Score transformations: scaling and threshold filtering

use crate::core::{
    GenomeWideList, IntervalList, IntervalListBuilder, OperationContext, OperationPool,
    OperationResult, ScoredInterval, StopToken,
};
use crate::ops::{map_chromosomes, CHECK_INTERVAL};

/// Multiply every score of a list by `factor`
pub fn scale_list(list: &IntervalList, factor: f32, token: &StopToken) -> OperationResult<IntervalList> {
    let mut builder = IntervalListBuilder::with_capacity(list.len());
    for (i, iv) in list.iter().enumerate() {
        if i % CHECK_INTERVAL == 0 {
            token.check()?;
        }
        builder.push_interval(ScoredInterval {
            score: iv.score * factor,
            ..*iv
        });
    }
    Ok(builder.build())
}

/// Keep the intervals whose score lies within the inclusive bounds
pub fn filter_list(
    list: &IntervalList,
    min: Option<f32>,
    max: Option<f32>,
    token: &StopToken,
) -> OperationResult<IntervalList> {
    let mut builder = IntervalListBuilder::new();
    for (i, iv) in list.iter().enumerate() {
        if i % CHECK_INTERVAL == 0 {
            token.check()?;
        }
        let above = min.map_or(true, |m| iv.score >= m);
        let below = max.map_or(true, |m| iv.score <= m);
        if above && below {
            builder.push_interval(*iv);
        }
    }
    Ok(builder.build())
}

/// Scale every chromosome of a track
pub fn scale(
    track: &GenomeWideList,
    factor: f32,
    pool: &OperationPool,
    ctx: &OperationContext,
) -> OperationResult<GenomeWideList> {
    map_chromosomes(track, pool, ctx, |_, list, token| scale_list(list, factor, token))
}

/// Threshold every chromosome of a track; `None` leaves a side open
pub fn filter_by_score(
    track: &GenomeWideList,
    min: Option<f32>,
    max: Option<f32>,
    pool: &OperationPool,
    ctx: &OperationContext,
) -> OperationResult<GenomeWideList> {
    map_chromosomes(track, pool, ctx, |_, list, token| filter_list(list, min, max, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Chromosome, ChromosomeList, OperationError};

    fn list() -> IntervalList {
        let mut builder = IntervalListBuilder::new();
        builder.push(0, 10, 1.0).unwrap();
        builder.push(10, 20, 5.0).unwrap();
        builder.push(30, 40, 10.0).unwrap();
        builder.build()
    }

    #[test]
    fn test_scale_list() {
        let scaled = scale_list(&list(), 2.0, &StopToken::new()).unwrap();
        let scores: Vec<f32> = scaled.iter().map(|iv| iv.score).collect();
        assert_eq!(scores, vec![2.0, 10.0, 20.0]);
        assert_eq!(scaled[2].start, 30);
    }

    #[test]
    fn test_filter_bounds_inclusive() {
        let token = StopToken::new();
        assert_eq!(filter_list(&list(), Some(5.0), None, &token).unwrap().len(), 2);
        assert_eq!(filter_list(&list(), None, Some(5.0), &token).unwrap().len(), 2);
        assert_eq!(filter_list(&list(), Some(5.0), Some(5.0), &token).unwrap()[0].start, 10);
        assert_eq!(filter_list(&list(), None, None, &token).unwrap(), list());
    }

    #[test]
    fn test_stopped_token() {
        let token = StopToken::new();
        token.stop();
        assert_eq!(scale_list(&list(), 2.0, &token), Err(OperationError::Cancelled));
    }

    #[test]
    fn test_genome_wide() {
        let chroms = ChromosomeList::new(vec![Chromosome::new("chr1", 100), Chromosome::new("chr2", 100)]);
        let track = GenomeWideList::from_lists(chroms, vec![list(), list()]).unwrap();
        let pool = OperationPool::with_workers(2).unwrap();
        let ctx = OperationContext::new();

        let filtered = filter_by_score(&track, Some(2.0), None, &pool, &ctx).unwrap();
        assert_eq!(filtered.total_intervals(), 4);

        let scaled = scale(&filtered, 0.5, &pool, &ctx).unwrap();
        assert_eq!(scaled.by_name("chr2").unwrap()[0].score, 2.5);
        assert_eq!(ctx.progress().completed(), 4);
    }
}
