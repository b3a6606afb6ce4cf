//! Variant records
//!
//! Variants arrive already parsed from an external collaborator. Each one is
//! anchored at a reference position and carries a signed length delta:
//! positive for inserted bases, negative for deleted bases, zero for
//! substitutions.

use crate::core::chromosome::Chromosome;
use crate::core::error::VariantError;
use std::collections::HashMap;
use std::fmt;

/// Kind of variant as called by the upstream caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VariantKind {
    Snp,
    Insertion,
    Deletion,
    Sv,
    Mixed,
}

impl VariantKind {
    /// Parse from string (variant table column)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SNP" | "SNV" => Some(VariantKind::Snp),
            "INS" | "INSERTION" => Some(VariantKind::Insertion),
            "DEL" | "DELETION" => Some(VariantKind::Deletion),
            "SV" => Some(VariantKind::Sv),
            "MIXED" | "MIX" => Some(VariantKind::Mixed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VariantKind::Snp => "SNP",
            VariantKind::Insertion => "INS",
            VariantKind::Deletion => "DEL",
            VariantKind::Sv => "SV",
            VariantKind::Mixed => "MIXED",
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which genome copies carry a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Allele {
    First,
    Second,
    /// Homozygous, or phase unknown
    #[default]
    Both,
}

impl Allele {
    /// Parse from string (variant table column)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "first" | "a" => Some(Allele::First),
            "2" | "second" | "b" => Some(Allele::Second),
            "both" | "." | "1/1" | "1|1" => Some(Allele::Both),
            _ => None,
        }
    }

    /// Index of each allele slot this membership contributes to
    pub fn slots(&self) -> &'static [usize] {
        match self {
            Allele::First => &[0],
            Allele::Second => &[1],
            Allele::Both => &[0, 1],
        }
    }
}

/// A single parsed variant call for one genome
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variant {
    pub reference_start: i64,
    pub length_delta: i32,
    pub genome_id: String,
    pub kind: VariantKind,
    pub allele: Allele,
}

impl Variant {
    pub fn new(reference_start: i64, length_delta: i32, genome_id: impl Into<String>, kind: VariantKind) -> Self {
        Self {
            reference_start,
            length_delta,
            genome_id: genome_id.into(),
            kind,
            allele: Allele::Both,
        }
    }

    pub fn insertion(reference_start: i64, length: i32, genome_id: impl Into<String>) -> Self {
        Self::new(reference_start, length, genome_id, VariantKind::Insertion)
    }

    pub fn deletion(reference_start: i64, length: i32, genome_id: impl Into<String>) -> Self {
        Self::new(reference_start, -length, genome_id, VariantKind::Deletion)
    }

    pub fn snp(reference_start: i64, genome_id: impl Into<String>) -> Self {
        Self::new(reference_start, 0, genome_id, VariantKind::Snp)
    }

    pub fn with_allele(mut self, allele: Allele) -> Self {
        self.allele = allele;
        self
    }

    /// Number of inserted bases (0 for non-insertions)
    pub fn inserted_length(&self) -> i64 {
        i64::from(self.length_delta.max(0))
    }

    /// Number of deleted bases (0 for non-deletions)
    pub fn deleted_length(&self) -> i64 {
        -i64::from(self.length_delta.min(0))
    }

    /// Check a variant against its chromosome.
    ///
    /// Insertions need a positive delta, deletions a negative one and SNPs
    /// zero; SV and mixed records accept any sign. The anchor must lie in
    /// `0..=length` and a deletion may not reach below position 0.
    pub fn validate(&self, chromosome: &Chromosome) -> Result<(), VariantError> {
        let invalid = |reason: String| {
            Err(VariantError::new(
                chromosome.name(),
                self.genome_id.as_str(),
                self.reference_start,
                reason,
            ))
        };

        match self.kind {
            VariantKind::Insertion if self.length_delta <= 0 => {
                return invalid(format!("insertion with non-positive length {}", self.length_delta));
            }
            VariantKind::Deletion if self.length_delta >= 0 => {
                return invalid(format!("deletion with non-negative length {}", self.length_delta));
            }
            VariantKind::Snp if self.length_delta != 0 => {
                return invalid(format!("SNP with non-zero length {}", self.length_delta));
            }
            _ => {}
        }

        if self.reference_start < 0 || self.reference_start > chromosome.len_i64() {
            return invalid(format!(
                "position outside chromosome of length {}",
                chromosome.length()
            ));
        }

        if self.reference_start - self.deleted_length() < 0 {
            return invalid(format!(
                "deletion of {} bases reaches before the chromosome start",
                self.deleted_length()
            ));
        }

        Ok(())
    }
}

/// Sort variants deterministically: position, then kind, then input order.
pub fn sort_variants(variants: &mut [Variant]) {
    // stable sort keeps input order for equal keys
    variants.sort_by_key(|v| (v.reference_start, v.kind));
}

/// Source of parsed variants, grouped by chromosome and genome
pub trait VariantSource: Sync {
    /// All variants of one genome on one chromosome, in input order
    fn variants(&self, chromosome: &Chromosome, genome_id: &str) -> &[Variant];
}

/// In-memory variant store
#[derive(Debug, Clone, Default)]
pub struct VariantStore {
    by_chrom: HashMap<String, HashMap<String, Vec<Variant>>>,
    count: usize,
}

impl VariantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variant for a chromosome
    pub fn push(&mut self, chrom: impl Into<String>, variant: Variant) {
        self.by_chrom
            .entry(chrom.into())
            .or_default()
            .entry(variant.genome_id.clone())
            .or_default()
            .push(variant);
        self.count += 1;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Genome ids seen in the store, sorted
    pub fn genome_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .by_chrom
            .values()
            .flat_map(|genomes| genomes.keys().cloned())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

impl VariantSource for VariantStore {
    fn variants(&self, chromosome: &Chromosome, genome_id: &str) -> &[Variant] {
        self.by_chrom
            .get(chromosome.name())
            .and_then(|genomes| genomes.get(genome_id))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}
