//! Chromosome sizes table: `name<TAB>length`

use crate::core::io::{open_text, ByteLineIterator};
use crate::core::{Chromosome, ChromosomeList, TableResult};
use crate::formats::RecordView;
use log::{debug, warn};
use std::io::BufRead;
use std::path::Path;

/// Parse a sizes table from any reader
pub fn parse_chrom_sizes<R: BufRead>(reader: R) -> TableResult<ChromosomeList> {
    let mut lines = ByteLineIterator::new(reader);
    let mut chromosomes = Vec::new();

    while let Some(record) = lines.next_record() {
        let (line_number, line) = record?;
        let view = RecordView::parse(line, line_number, 2)?;
        let name = view.field(0).unwrap_or("");
        let length: u32 = view.number(1, "length")?;
        if chromosomes.iter().any(|c: &Chromosome| c.name() == name) {
            warn!("Duplicate chromosome {} on line {}, keeping the first", name, view.line_number());
            continue;
        }
        chromosomes.push(Chromosome::new(name, length));
    }

    let list = ChromosomeList::new(chromosomes);
    debug!("Loaded {} chromosomes ({} bases)", list.len(), list.genome_length());
    Ok(list)
}

/// Read a sizes table from a plain or compressed file
pub fn read_chrom_sizes<P: AsRef<Path>>(path: P) -> TableResult<ChromosomeList> {
    parse_chrom_sizes(open_text(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TableParseError;

    #[test]
    fn test_parse_sorted_naturally() {
        let data = b"# sizes\nchr10\t500\nchr2\t300\n\nchrX\t200\nchr1\t1000\n";
        let list = parse_chrom_sizes(&data[..]).unwrap();

        let names: Vec<&str> = list.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["chr1", "chr2", "chr10", "chrX"]);
        assert_eq!(list.find("1").unwrap().length(), 1000);
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let list = parse_chrom_sizes(&b"chr1\t100\nchr1\t200\n"[..]).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).unwrap().length(), 100);
    }

    #[test]
    fn test_bad_length_reports_line() {
        let err = parse_chrom_sizes(&b"chr1\t100\nchr2\t-5\n"[..]).unwrap_err();
        assert!(matches!(err, TableParseError::InvalidNumber { line: 2, .. }));

        let err = parse_chrom_sizes(&b"chr1\n"[..]).unwrap_err();
        assert!(matches!(err, TableParseError::MissingFields { line: 1, .. }));
    }
}
