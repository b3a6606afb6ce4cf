//! Tab-separated input adapters
//!
//! Loaders for chromosome sizes, pre-parsed variant tables and scored
//! intervals (bedGraph-like). Blank lines and `#` comments are skipped;
//! compressed inputs are detected automatically.

pub mod bedgraph;
pub mod chrom_sizes;
pub mod variant_table;

pub use bedgraph::{parse_scored_intervals, read_scored_intervals, write_scored_intervals};
pub use chrom_sizes::{parse_chrom_sizes, read_chrom_sizes};
pub use variant_table::{parse_variant_table, read_variant_table, VariantTable};

use crate::core::io::split_fields;
use crate::core::{TableParseError, TableResult};
use std::str::FromStr;

/// Zero-copy view of one tab-separated record
pub struct RecordView<'a> {
    line: &'a [u8],
    line_number: usize,
    field_bounds: Vec<(usize, usize)>,
}

impl<'a> RecordView<'a> {
    /// Split a line, requiring at least `expected` fields
    pub fn parse(line: &'a [u8], line_number: usize, expected: usize) -> TableResult<Self> {
        let mut field_bounds = Vec::with_capacity(expected + 1);
        split_fields(line, &mut field_bounds);
        if field_bounds.len() < expected {
            return Err(TableParseError::MissingFields {
                line: line_number,
                expected,
                found: field_bounds.len(),
            });
        }
        Ok(Self {
            line,
            line_number,
            field_bounds,
        })
    }

    pub fn field_count(&self) -> usize {
        self.field_bounds.len()
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Field as trimmed text; invalid UTF-8 reads as empty
    pub fn field(&self, index: usize) -> Option<&'a str> {
        self.field_bounds.get(index).map(|&(start, end)| {
            std::str::from_utf8(&self.line[start..end])
                .map(str::trim)
                .unwrap_or("")
        })
    }

    /// Parse a numeric field
    pub fn number<T: FromStr>(&self, index: usize, name: &'static str) -> TableResult<T> {
        let text = self.field(index).unwrap_or("");
        text.parse().map_err(|_| TableParseError::InvalidNumber {
            line: self.line_number,
            field: name,
            value: text.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_view_fields() {
        let view = RecordView::parse(b"chr1\t100\t -5 \tA", 3, 4).unwrap();
        assert_eq!(view.field_count(), 4);
        assert_eq!(view.field(0), Some("chr1"));
        assert_eq!(view.number::<i64>(1, "start").unwrap(), 100);
        assert_eq!(view.number::<i32>(2, "delta").unwrap(), -5);
        assert_eq!(view.field(4), None);
    }

    #[test]
    fn test_record_view_errors_carry_line() {
        match RecordView::parse(b"chr1\t100", 7, 3) {
            Err(TableParseError::MissingFields { line, expected, found }) => {
                assert_eq!((line, expected, found), (7, 3, 2));
            }
            _ => panic!("expected MissingFields"),
        }

        let view = RecordView::parse(b"chr1\tabc", 9, 2).unwrap();
        match view.number::<u32>(1, "length") {
            Err(TableParseError::InvalidNumber { line, field, value }) => {
                assert_eq!((line, field, value.as_str()), (9, "length", "abc"));
            }
            _ => panic!("expected InvalidNumber"),
        }
    }
}
