//! Projection of tracks onto the meta-genome axis
//!
//! A `[start, stop)` interval maps to `[to_meta(start), to_meta(stop - 1) + 1)`:
//! the first and last covered bases keep their meta positions and any
//! inserted space between them is covered too. Inserted space anchored at
//! `start` itself lies before the first base and stays outside.

use crate::core::{
    Chromosome, ChromosomeList, CoordinateError, CoordinateResult, CoordinateSystem,
    GenomeWideList, IntervalList, IntervalListBuilder, OffsetTable, OperationContext,
    OperationError, OperationPool, Result, ScoredInterval, StopToken, SyncResult,
};
use crate::ops::CHECK_INTERVAL;
use log::debug;

fn position_to_meta(table: &OffsetTable, position: i64, from: CoordinateSystem) -> CoordinateResult<i64> {
    match from {
        CoordinateSystem::Reference => table.to_meta(position),
        CoordinateSystem::Genome => table.genome_to_meta(position),
        CoordinateSystem::Meta => table
            .convert(position, CoordinateSystem::Meta, CoordinateSystem::Meta)
            .map(|m| m.unwrap_or(position)),
    }
}

/// Chromosome layout of the meta axis; lengths must still fit in `u32`
fn meta_layout(tables: &[&OffsetTable]) -> CoordinateResult<ChromosomeList> {
    let chromosomes = tables
        .iter()
        .map(|table| {
            let length = u32::try_from(table.meta_length()).map_err(|_| CoordinateError::OutOfRange {
                chrom: table.chromosome().name().to_string(),
                position: table.meta_length(),
                limit: i64::from(u32::MAX),
                system: CoordinateSystem::Meta.as_str(),
            })?;
            Ok(Chromosome::new(table.chromosome().name(), length))
        })
        .collect::<CoordinateResult<Vec<_>>>()?;
    Ok(ChromosomeList::new(chromosomes))
}

/// Project one chromosome's list with the table of the genome it belongs to
pub fn project_list(
    list: &IntervalList,
    table: &OffsetTable,
    from: CoordinateSystem,
    token: &StopToken,
) -> Result<IntervalList> {
    let mut builder = IntervalListBuilder::with_capacity(list.len());
    for (i, iv) in list.iter().enumerate() {
        if i % CHECK_INTERVAL == 0 {
            token.check()?;
        }
        let start = position_to_meta(table, iv.start, from)?;
        let stop = position_to_meta(table, iv.stop - 1, from)? + 1;
        builder.push_interval(ScoredInterval::new(start, stop, iv.score));
    }
    Ok(builder.build())
}

/// Project a whole track onto the meta axis of a synchronization.
///
/// `from` names the coordinates the track is in: the reference, or the
/// native coordinates of `genome_id`. The result is laid out over the meta
/// lengths of the chromosomes.
pub fn project_to_meta(
    track: &GenomeWideList,
    sync: &SyncResult,
    genome_id: &str,
    from: CoordinateSystem,
    pool: &OperationPool,
    ctx: &OperationContext,
) -> Result<GenomeWideList> {
    // resolve every table before any unit runs
    let tables: Vec<&OffsetTable> = track
        .chromosomes()
        .iter()
        .map(|chrom| sync.table(chrom.name(), genome_id))
        .collect::<CoordinateResult<_>>()?;

    let meta_chromosomes = meta_layout(&tables)?;

    let lists = pool.run(tables.len(), ctx, |index, token| {
        project_list(&track.lists()[index], tables[index], from, token)
    })?;

    debug!(
        "Projected {} intervals of genome {} onto the meta axis",
        track.total_intervals(),
        genome_id
    );
    Ok(GenomeWideList::from_lists(meta_chromosomes, lists)?)
}

/// Dead zones of a genome as a mask track over the meta axis.
///
/// Zones of overlapping deletions merge into one element; every score is 1.
pub fn dead_zone_mask(
    sync: &SyncResult,
    genome_id: &str,
    pool: &OperationPool,
    ctx: &OperationContext,
) -> Result<GenomeWideList> {
    let tables: Vec<&OffsetTable> = sync
        .chromosomes()
        .iter()
        .map(|chrom| sync.table(chrom.name(), genome_id))
        .collect::<CoordinateResult<_>>()?;
    let meta_chromosomes = meta_layout(&tables)?;

    let lists = pool.run(tables.len(), ctx, |index, token| {
        token.check()?;
        let mut builder = IntervalListBuilder::mask();
        for zone in tables[index].dead_zones() {
            builder.push_interval(ScoredInterval::new(zone.meta_start, zone.meta_stop, 1.0));
        }
        Ok::<_, OperationError>(builder.build())
    })?;
    Ok(GenomeWideList::from_lists(meta_chromosomes, lists)?)
}
