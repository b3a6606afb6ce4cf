//! Track statistics

use crate::core::{
    Chromosome, GenomeWideList, IntervalList, OperationContext, OperationPool, OperationResult,
};
use std::fmt;

/// Summary of the intervals of one list or of a whole track
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackStatistics {
    pub count: usize,
    pub covered_bases: i64,
    pub min: Option<f32>,
    pub max: Option<f32>,
    weighted_sum: f64,
}

impl TrackStatistics {
    pub fn of(list: &IntervalList) -> Self {
        let mut stats = Self::default();
        for iv in list.iter() {
            stats.count += 1;
            stats.covered_bases += iv.len();
            stats.weighted_sum += f64::from(iv.score) * iv.len() as f64;
            stats.min = Some(stats.min.map_or(iv.score, |m| m.min(iv.score)));
            stats.max = Some(stats.max.map_or(iv.score, |m| m.max(iv.score)));
        }
        stats
    }

    /// Fold another summary into this one
    pub fn merge(&mut self, other: &TrackStatistics) {
        self.count += other.count;
        self.covered_bases += other.covered_bases;
        self.weighted_sum += other.weighted_sum;
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    /// Mean score weighted by interval length
    pub fn mean(&self) -> Option<f64> {
        (self.covered_bases > 0).then(|| self.weighted_sum / self.covered_bases as f64)
    }
}

impl fmt::Display for TrackStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_opt = |v: Option<f64>| v.map_or_else(|| "NA".to_string(), |v| format!("{:.4}", v));
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.count,
            self.covered_bases,
            fmt_opt(self.min.map(f64::from)),
            fmt_opt(self.max.map(f64::from)),
            fmt_opt(self.mean())
        )
    }
}

/// Per-chromosome and genome-wide statistics of a track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSummary {
    pub per_chromosome: Vec<(Chromosome, TrackStatistics)>,
    pub total: TrackStatistics,
}

/// Summarize every chromosome of a track, one pool unit per chromosome
pub fn statistics(
    track: &GenomeWideList,
    pool: &OperationPool,
    ctx: &OperationContext,
) -> OperationResult<TrackSummary> {
    let stats = pool.run(track.lists().len(), ctx, |index, token| {
        token.check()?;
        Ok::<_, crate::core::OperationError>(TrackStatistics::of(&track.lists()[index]))
    })?;

    let mut total = TrackStatistics::default();
    for s in &stats {
        total.merge(s);
    }
    let per_chromosome = track.chromosomes().iter().cloned().zip(stats).collect();
    Ok(TrackSummary { per_chromosome, total })
}
