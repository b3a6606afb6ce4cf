//! Genome-wide interval operations
//!
//! Every operation maps a [`GenomeWideList`] to a new one with one pool unit
//! per chromosome. Input lists are never mutated; each unit owns the builder
//! of its output list.

pub mod arithmetic;
pub mod fit;
pub mod project;
pub mod query;
pub mod stats;
pub mod transform;

pub use arithmetic::{combine, combine_lists, ArithmeticOp};
pub use fit::{fit, fit_genome_wide, DisplayCache};
pub use project::{dead_zone_mask, project_list, project_to_meta};
pub use query::{find_start, find_stop, overlapping, query};
pub use stats::{statistics, TrackStatistics, TrackSummary};
pub use transform::{filter_by_score, filter_list, scale, scale_list};

use crate::core::{
    Chromosome, GenomeWideList, IntervalList, OperationContext, OperationPool, OperationResult,
    StopToken,
};

/// Inner loops poll the stop token once per this many intervals
pub(crate) const CHECK_INTERVAL: usize = 4096;

/// Run `unit` over every chromosome of a track and collect the new lists
pub fn map_chromosomes<F>(
    track: &GenomeWideList,
    pool: &OperationPool,
    ctx: &OperationContext,
    unit: F,
) -> OperationResult<GenomeWideList>
where
    F: Fn(&Chromosome, &IntervalList, &StopToken) -> OperationResult<IntervalList> + Sync,
{
    let chromosomes = track.chromosomes();
    let lists = pool.run(chromosomes.len(), ctx, |index, token| {
        token.check()?;
        unit(&chromosomes.as_slice()[index], &track.lists()[index], token)
    })?;
    Ok(GenomeWideList::from_indexed(chromosomes.clone(), lists))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChromosomeList, IntervalListBuilder};

    #[test]
    fn test_map_chromosomes_keeps_layout() {
        let chroms = ChromosomeList::new(vec![Chromosome::new("chr2", 100), Chromosome::new("chr1", 100)]);
        let track = GenomeWideList::new(chroms);
        let pool = OperationPool::with_workers(2).unwrap();

        let mapped = map_chromosomes(&track, &pool, &OperationContext::new(), |chrom, _, _| {
            let mut builder = IntervalListBuilder::new();
            builder.push(0, i64::from(chrom.length()), 1.0).unwrap();
            Ok(builder.build())
        })
        .unwrap();

        assert_eq!(mapped.chromosomes(), track.chromosomes());
        assert_eq!(mapped.by_name("chr1").unwrap().len(), 1);
        assert_eq!(mapped.total_intervals(), 2);
    }
}
