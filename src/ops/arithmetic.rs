//! Arithmetic between two tracks
//!
//! Both lists are cut at the union of their breakpoints. Each resulting
//! segment covered by at least one side gets `op(a, b)`, where an uncovered
//! side counts as 0. Neighbouring segments with equal values are joined.

use crate::core::{
    GenomeWideList, IntervalList, IntervalListBuilder, OperationContext, OperationPool,
    OperationResult, Result, ScoredInterval, StopToken,
};
use crate::ops::CHECK_INTERVAL;
use std::fmt;

/// Operation applied to the two scores of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Maximum,
    Minimum,
    Average,
}

impl ArithmeticOp {
    /// Parse from string (for CLI argument)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "add" | "+" => Some(ArithmeticOp::Add),
            "subtract" | "sub" | "-" => Some(ArithmeticOp::Subtract),
            "multiply" | "mul" | "*" => Some(ArithmeticOp::Multiply),
            "divide" | "div" | "/" => Some(ArithmeticOp::Divide),
            "maximum" | "max" => Some(ArithmeticOp::Maximum),
            "minimum" | "min" => Some(ArithmeticOp::Minimum),
            "average" | "mean" | "avg" => Some(ArithmeticOp::Average),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Subtract => "subtract",
            ArithmeticOp::Multiply => "multiply",
            ArithmeticOp::Divide => "divide",
            ArithmeticOp::Maximum => "maximum",
            ArithmeticOp::Minimum => "minimum",
            ArithmeticOp::Average => "average",
        }
    }

    /// Combined score; `None` drops the segment (division by zero)
    pub fn apply(&self, a: f32, b: f32) -> Option<f32> {
        match self {
            ArithmeticOp::Add => Some(a + b),
            ArithmeticOp::Subtract => Some(a - b),
            ArithmeticOp::Multiply => Some(a * b),
            ArithmeticOp::Divide => (b != 0.0).then(|| a / b),
            ArithmeticOp::Maximum => Some(a.max(b)),
            ArithmeticOp::Minimum => Some(a.min(b)),
            ArithmeticOp::Average => Some((a + b) / 2.0),
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score of the interval covering `[position, ..)`, advancing `cursor`
#[inline]
fn covering(intervals: &[ScoredInterval], cursor: &mut usize, position: i64) -> Option<f32> {
    while *cursor < intervals.len() && intervals[*cursor].stop <= position {
        *cursor += 1;
    }
    intervals
        .get(*cursor)
        .filter(|iv| iv.start <= position)
        .map(|iv| iv.score)
}

/// Combine two lists of the same chromosome
pub fn combine_lists(
    a: &IntervalList,
    b: &IntervalList,
    op: ArithmeticOp,
    token: &StopToken,
) -> OperationResult<IntervalList> {
    let mut breakpoints: Vec<i64> = a
        .iter()
        .chain(b.iter())
        .flat_map(|iv| [iv.start, iv.stop])
        .collect();
    breakpoints.sort_unstable();
    breakpoints.dedup();

    let mut builder = IntervalListBuilder::with_capacity(breakpoints.len());
    let mut pending: Option<ScoredInterval> = None;
    let (mut ia, mut ib) = (0usize, 0usize);

    for (i, window) in breakpoints.windows(2).enumerate() {
        if i % CHECK_INTERVAL == 0 {
            token.check()?;
        }
        let (start, stop) = (window[0], window[1]);
        let score_a = covering(a, &mut ia, start);
        let score_b = covering(b, &mut ib, start);
        if score_a.is_none() && score_b.is_none() {
            continue;
        }
        let Some(score) = op.apply(score_a.unwrap_or(0.0), score_b.unwrap_or(0.0)) else {
            continue;
        };

        if let Some(prev) = pending.as_mut() {
            if prev.stop == start && prev.score == score {
                prev.stop = stop;
                continue;
            }
        }
        if let Some(prev) = pending.replace(ScoredInterval { start, stop, score }) {
            builder.push_interval(prev);
        }
    }
    if let Some(prev) = pending {
        builder.push_interval(prev);
    }
    Ok(builder.build())
}

/// Combine two tracks sharing the same chromosome layout
pub fn combine(
    a: &GenomeWideList,
    b: &GenomeWideList,
    op: ArithmeticOp,
    pool: &OperationPool,
    ctx: &OperationContext,
) -> Result<GenomeWideList> {
    a.check_layout(b)?;
    let lists = pool.run(a.lists().len(), ctx, |index, token| {
        combine_lists(&a.lists()[index], &b.lists()[index], op, token)
    })?;
    Ok(GenomeWideList::from_lists(a.chromosomes().clone(), lists)?)
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

    fn run(a: &IntervalList, b: &IntervalList, op: ArithmeticOp) -> Vec<(i64, i64, f32)> {
        combine_lists(a, b, op, &StopToken::new())
            .unwrap()
            .iter()
            .map(|iv| (iv.start, iv.stop, iv.score))
            .collect()
    }

    #[test]
    fn test_add_over_union_of_breakpoints() {
        let a = build(&[(0, 10, 1.0)]);
        let b = build(&[(5, 15, 2.0)]);
        assert_eq!(
            run(&a, &b, ArithmeticOp::Add),
            vec![(0, 5, 1.0), (5, 10, 3.0), (10, 15, 2.0)]
        );
    }

    #[test]
    fn test_subtract_missing_side_is_zero() {
        let a = build(&[(0, 10, 4.0)]);
        let b = build(&[(20, 30, 1.0)]);
        assert_eq!(
            run(&a, &b, ArithmeticOp::Subtract),
            vec![(0, 10, 4.0), (20, 30, -1.0)]
        );
    }

    #[test]
    fn test_divide_by_zero_drops_segment() {
        let a = build(&[(0, 10, 4.0)]);
        let b = build(&[(5, 10, 2.0)]);
        assert_eq!(run(&a, &b, ArithmeticOp::Divide), vec![(5, 10, 2.0)]);
    }

    #[test]
    fn test_equal_neighbours_joined() {
        let a = build(&[(0, 10, 2.0), (10, 20, 2.0)]);
        let b = build(&[(5, 15, 2.0)]);
        assert_eq!(run(&a, &b, ArithmeticOp::Maximum), vec![(0, 20, 2.0)]);
        assert_eq!(run(&a, &b, ArithmeticOp::Average), vec![(0, 5, 1.0), (5, 15, 2.0), (15, 20, 1.0)]);
    }

    #[test]
    fn test_empty_inputs() {
        let empty = IntervalList::empty();
        assert!(run(&empty, &empty, ArithmeticOp::Add).is_empty());
        let a = build(&[(0, 10, 3.0)]);
        assert_eq!(run(&a, &empty, ArithmeticOp::Minimum), vec![(0, 10, 0.0)]);
    }

    #[test]
    fn test_op_from_str() {
        assert_eq!(ArithmeticOp::from_str("MAX"), Some(ArithmeticOp::Maximum));
        assert_eq!(ArithmeticOp::from_str("/"), Some(ArithmeticOp::Divide));
        assert_eq!(ArithmeticOp::from_str("pow"), None);
    }

    #[test]
    fn test_combine_requires_same_layout() {
        let pool = OperationPool::with_workers(2).unwrap();
        let ctx = OperationContext::new();
        let one = GenomeWideList::new(ChromosomeList::new(vec![Chromosome::new("chr1", 100)]));
        let two = GenomeWideList::new(ChromosomeList::new(vec![
            Chromosome::new("chr1", 100),
            Chromosome::new("chr2", 100),
        ]));

        assert!(matches!(
            combine(&one, &two, ArithmeticOp::Add, &pool, &ctx),
            Err(MetaGenomeError::Interval(_))
        ));
        assert!(combine(&two, &two, ArithmeticOp::Add, &pool, &ctx).is_ok());
    }
}
