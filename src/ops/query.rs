//! Window queries over sorted interval lists
//!
//! Both bounds are found by binary search, then widened by one element when
//! the neighbouring interval straddles the window edge.

use crate::core::ScoredInterval;

/// Index of the first interval ending after `start`
pub fn find_start(intervals: &[ScoredInterval], start: i64) -> usize {
    let idx = intervals.partition_point(|iv| iv.start < start);
    if idx > 0 && intervals[idx - 1].stop > start {
        idx - 1
    } else {
        idx
    }
}

/// One past the last interval starting before `stop`
pub fn find_stop(intervals: &[ScoredInterval], stop: i64) -> usize {
    let idx = intervals.partition_point(|iv| iv.stop <= stop);
    if idx < intervals.len() && intervals[idx].start < stop {
        idx + 1
    } else {
        idx
    }
}

/// Intervals overlapping `[start, stop)`, unclipped
pub fn overlapping(intervals: &[ScoredInterval], start: i64, stop: i64) -> &[ScoredInterval] {
    if stop <= start {
        return &[];
    }
    let first = find_start(intervals, start);
    let last = find_stop(intervals, stop);
    if first >= last {
        return &[];
    }
    &intervals[first..last]
}

/// Copies of the intervals overlapping `[start, stop)`, clipped to the window
///
/// # Examples
/// ```
/// use metagenome_sync::core::ScoredInterval;
/// use metagenome_sync::ops::query;
///
/// let list = [ScoredInterval::new(0, 10, 1.0), ScoredInterval::new(12, 20, 2.0)];
/// let hits = query(&list, 5, 15);
/// assert_eq!(hits, vec![ScoredInterval::new(5, 10, 1.0), ScoredInterval::new(12, 15, 2.0)]);
/// ```
pub fn query(intervals: &[ScoredInterval], start: i64, stop: i64) -> Vec<ScoredInterval> {
    overlapping(intervals, start, stop)
        .iter()
        .map(|iv| iv.clipped(start, stop))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> Vec<ScoredInterval> {
        vec![
            ScoredInterval::new(0, 10, 1.0),
            ScoredInterval::new(12, 20, 2.0),
            ScoredInterval::new(20, 30, 3.0),
            ScoredInterval::new(50, 60, 4.0),
        ]
    }

    #[test]
    fn test_empty_list() {
        assert!(query(&[], 0, 100).is_empty());
        assert_eq!(find_start(&[], 5), 0);
        assert_eq!(find_stop(&[], 5), 0);
    }

    #[test]
    fn test_boundary_intervals_included() {
        let list = list();
        assert_eq!(overlapping(&list, 5, 15), &list[0..2]);
        assert_eq!(overlapping(&list, 25, 55), &list[2..4]);
    }

    #[test]
    fn test_touching_edges_excluded() {
        let list = list();
        assert!(overlapping(&list, 10, 12).is_empty());
        assert_eq!(overlapping(&list, 30, 50), &[] as &[ScoredInterval]);
        assert_eq!(overlapping(&list, 20, 21), &list[2..3]);
    }

    #[test]
    fn test_window_outside_list() {
        let list = list();
        assert!(overlapping(&list, 100, 200).is_empty());
        assert!(overlapping(&list, -50, 0).is_empty());
        assert!(overlapping(&list, 40, 40).is_empty());
    }

    #[test]
    fn test_query_clips_copies() {
        let list = list();
        let hits = query(&list, 15, 55);
        assert_eq!(
            hits,
            vec![
                ScoredInterval::new(15, 20, 2.0),
                ScoredInterval::new(20, 30, 3.0),
                ScoredInterval::new(50, 55, 4.0),
            ]
        );
        assert_eq!(list[1].start, 12);
    }

    #[test]
    fn test_single_element() {
        let one = [ScoredInterval::new(5, 8, 1.0)];
        assert_eq!(query(&one, 0, 100).len(), 1);
        assert_eq!(query(&one, 6, 7), vec![ScoredInterval::new(6, 7, 1.0)]);
        assert!(query(&one, 8, 9).is_empty());
    }
}
