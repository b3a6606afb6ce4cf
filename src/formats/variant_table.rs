//! Pre-parsed variant table
//!
//! One record per line:
//!
//! ```text
//! chrom  referenceStart  lengthDelta  genome  kind  [allele]
//! ```
//!
//! `kind` is one of `SNP`, `INS`, `DEL`, `SV`, `MIXED`; `allele` is `1`, `2`
//! or `both` (default). Records are stored under the chromosome's name in the
//! sizes table, so `1` and `chr1` land on the same chromosome.

use crate::core::io::{open_text, ByteLineIterator};
use crate::core::{
    Allele, ChromosomeList, TableParseError, TableResult, Variant, VariantKind, VariantStore,
};
use crate::formats::RecordView;
use log::debug;
use std::io::BufRead;
use std::path::Path;

/// Variants loaded from a table
#[derive(Debug, Clone, Default)]
pub struct VariantTable {
    pub store: VariantStore,
    /// Records with a zero delta on a non-SNP kind, kept for validation
    pub suspicious: usize,
}

impl VariantTable {
    pub fn genome_ids(&self) -> Vec<String> {
        self.store.genome_ids()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

fn parse_record(view: &RecordView<'_>) -> TableResult<Variant> {
    let line = view.line_number();
    let start: i64 = view.number(1, "referenceStart")?;
    let delta: i32 = view.number(2, "lengthDelta")?;
    let genome = view.field(3).unwrap_or("");

    let kind_text = view.field(4).unwrap_or("");
    let kind = VariantKind::from_str(kind_text).ok_or_else(|| TableParseError::InvalidKeyword {
        line,
        field: "kind",
        value: kind_text.to_string(),
    })?;

    let allele = match view.field(5).filter(|s| !s.is_empty()) {
        None => Allele::Both,
        Some(text) => Allele::from_str(text).ok_or_else(|| TableParseError::InvalidKeyword {
            line,
            field: "allele",
            value: text.to_string(),
        })?,
    };

    Ok(Variant::new(start, delta, genome, kind).with_allele(allele))
}

/// Parse a variant table from any reader.
///
/// Syntax errors abort the load; semantic checks (delta sign, range) are
/// left to synchronization, which skips and reports bad records.
pub fn parse_variant_table<R: BufRead>(
    reader: R,
    chromosomes: &ChromosomeList,
) -> TableResult<VariantTable> {
    let mut lines = ByteLineIterator::new(reader);
    let mut table = VariantTable::default();

    while let Some(record) = lines.next_record() {
        let (line_number, line) = record?;
        let view = RecordView::parse(line, line_number, 5)?;

        let chrom_name = view.field(0).unwrap_or("");
        let chrom = chromosomes
            .find(chrom_name)
            .ok_or_else(|| TableParseError::UnknownChromosome {
                line: line_number,
                chrom: chrom_name.to_string(),
            })?;

        let variant = parse_record(&view)?;
        if variant.length_delta == 0 && variant.kind != VariantKind::Snp {
            table.suspicious += 1;
        }
        table.store.push(chrom.name(), variant);
    }

    debug!(
        "Loaded {} variants for {} genomes",
        table.len(),
        table.genome_ids().len()
    );
    Ok(table)
}

/// Read a variant table from a plain or compressed file
pub fn read_variant_table<P: AsRef<Path>>(
    path: P,
    chromosomes: &ChromosomeList,
) -> TableResult<VariantTable> {
    parse_variant_table(open_text(path)?, chromosomes)
}
