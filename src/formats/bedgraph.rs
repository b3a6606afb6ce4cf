//! Scored interval tables (bedGraph-like): `chrom<TAB>start<TAB>stop<TAB>score`
//!
//! `track` and `browser` header lines are skipped along with comments.
//! Records may come in any order; each chromosome gets its own builder and
//! overlaps are clipped when the lists are built.

use crate::core::io::{open_text, ByteLineIterator};
use crate::core::{
    ChromosomeList, GenomeWideList, IntervalListBuilder, TableParseError, TableResult,
};
use crate::formats::RecordView;
use log::debug;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Parse scored intervals laid out over `chromosomes`
pub fn parse_scored_intervals<R: BufRead>(
    reader: R,
    chromosomes: &ChromosomeList,
) -> TableResult<GenomeWideList> {
    let mut lines = ByteLineIterator::new(reader);
    let mut builders: Vec<IntervalListBuilder> =
        (0..chromosomes.len()).map(|_| IntervalListBuilder::new()).collect();
    let mut records = 0usize;

    while let Some(record) = lines.next_record() {
        let (line_number, line) = record?;
        if line.starts_with(b"track") || line.starts_with(b"browser") {
            continue;
        }
        let view = RecordView::parse(line, line_number, 4)?;

        let chrom_name = view.field(0).unwrap_or("");
        let index = chromosomes
            .index_of(chrom_name)
            .ok_or_else(|| TableParseError::UnknownChromosome {
                line: line_number,
                chrom: chrom_name.to_string(),
            })?;

        let start: i64 = view.number(1, "start")?;
        let stop: i64 = view.number(2, "stop")?;
        let score: f32 = view.number(3, "score")?;
        if start < 0 {
            return Err(TableParseError::InvalidNumber {
                line: line_number,
                field: "start",
                value: start.to_string(),
            });
        }
        let chrom = &chromosomes.as_slice()[index];
        if stop > chrom.len_i64() {
            return Err(TableParseError::PastChromosomeEnd {
                line: line_number,
                chrom: chrom.name().to_string(),
                stop,
                length: chrom.length(),
            });
        }
        if builders[index].push(start, stop, score).is_err() {
            return Err(TableParseError::InvalidNumber {
                line: line_number,
                field: "stop",
                value: stop.to_string(),
            });
        }
        records += 1;
    }

    let lists = builders.into_iter().map(IntervalListBuilder::build).collect();
    let track = GenomeWideList::from_indexed(chromosomes.clone(), lists);
    debug!(
        "Loaded {} records into {} intervals",
        records,
        track.total_intervals()
    );
    Ok(track)
}

/// Read scored intervals from a plain or compressed file
pub fn read_scored_intervals<P: AsRef<Path>>(
    path: P,
    chromosomes: &ChromosomeList,
) -> TableResult<GenomeWideList> {
    parse_scored_intervals(open_text(path)?, chromosomes)
}

/// Write a track in chromosome order
pub fn write_scored_intervals<W: Write>(track: &GenomeWideList, writer: &mut W) -> io::Result<()> {
    for (chrom, list) in track.iter() {
        for iv in list.iter() {
            writeln!(writer, "{}\t{}", chrom.name(), iv)?;
        }
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Chromosome, ScoredInterval};

    fn chroms() -> ChromosomeList {
        ChromosomeList::new(vec![Chromosome::new("chr1", 1000), Chromosome::new("chr2", 500)])
    }

    #[test]
    fn test_parse_unsorted_input() {
        let data = b"track type=bedGraph\nchr2\t10\t20\t1.5\nchr1\t50\t60\t2\nchr1\t0\t10\t3\n";
        let track = parse_scored_intervals(&data[..], &chroms()).unwrap();

        let chr1 = track.by_name("chr1").unwrap();
        assert_eq!(chr1.as_slice(), &[ScoredInterval::new(0, 10, 3.0), ScoredInterval::new(50, 60, 2.0)]);
        assert_eq!(track.by_name("2").unwrap()[0].score, 1.5);
    }

    #[test]
    fn test_invalid_interval_reports_line() {
        let err = parse_scored_intervals(&b"chr1\t0\t10\t1\nchr1\t20\t20\t1\n"[..], &chroms()).unwrap_err();
        assert!(matches!(err, TableParseError::InvalidNumber { line: 2, field: "stop", .. }));

        let err = parse_scored_intervals(&b"chr1\t0\t10\tx\n"[..], &chroms()).unwrap_err();
        assert!(matches!(err, TableParseError::InvalidNumber { field: "score", .. }));
    }

    #[test]
    fn test_record_past_chromosome_end_rejected() {
        let data = b"chr2\t400\t500\t1\nchr2\t495\t510\t1\n";
        let err = parse_scored_intervals(&data[..], &chroms()).unwrap_err();
        assert!(matches!(
            err,
            TableParseError::PastChromosomeEnd { line: 2, stop: 510, length: 500, .. }
        ));
    }

    #[test]
    fn test_write_round_trip() {
        let data = b"chr1\t0\t10\t3\nchr2\t10\t20\t1.5\n";
        let track = parse_scored_intervals(&data[..], &chroms()).unwrap();

        let mut out = Vec::new();
        write_scored_intervals(&track, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "chr1\t0\t10\t3\nchr2\t10\t20\t1.5\n");
    }
}
