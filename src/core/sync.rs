//! Multi-genome synchronizer
//!
//! Builds the meta-genome axis of every chromosome and one offset table per
//! genome on it. The pool runs one unit per chromosome: genomes of the same
//! chromosome share the width decisions of the meta axis, so they are
//! processed together by a single worker.
//!
//! # Algorithm (per chromosome)
//!
//! 1. Collapse each genome's valid variants into carried sites (see
//!    [`collapse_sites`] for the allele policy).
//! 2. Reserve, at every site, the widest insertion carried by any genome.
//! 3. Build the shared offset entries from the reserved sites.
//! 4. For each genome, mark the reserved space it does not carry as absent
//!    and record its deletions as dead zones.

use crate::core::chromosome::{Chromosome, ChromosomeList};
use crate::core::error::{CoordinateError, CoordinateResult, OperationResult, VariantError};
use crate::core::offset::{OffsetEntry, OffsetTable};
use crate::core::pool::{OperationContext, OperationPool, StopToken};
use crate::core::variant::{sort_variants, Variant, VariantSource};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Genome id of the reference genome's own table
pub const REFERENCE_GENOME_ID: &str = "Reference";

/// Stop checks happen once per this many variants
const CHECK_INTERVAL: usize = 1024;

/// What one genome carries at one reference site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarriedSite {
    pub reference_position: i64,
    /// Inserted bases of the longest inserting allele
    pub inserted: i64,
    /// Deleted bases of the longest deleting allele
    pub deleted: i64,
}

#[derive(Debug, Clone, Copy, Default)]
struct SiteAlleles {
    inserted: [i64; 2],
    deleted: [i64; 2],
}

impl SiteAlleles {
    fn carried(&self, reference_position: i64) -> Option<CarriedSite> {
        let inserted = self.inserted[0].max(self.inserted[1]);
        let deleted = self.deleted[0].max(self.deleted[1]);
        (inserted > 0 || deleted > 0).then_some(CarriedSite {
            reference_position,
            inserted,
            deleted,
        })
    }
}

/// Collapse one genome's variants into carried sites.
///
/// Allele policy: per allele, insertions anchored at the same site stack
/// (lengths add up) and so do deletions. The genome carries the longest
/// per-allele insertion and, independently, the longest per-allele
/// deletion. A variant on both alleles counts for each of them.
///
/// Invalid variants are skipped and returned as errors.
pub fn collapse_sites(
    chromosome: &Chromosome,
    variants: &[Variant],
    token: &StopToken,
) -> OperationResult<(Vec<CarriedSite>, Vec<VariantError>)> {
    let mut errors = Vec::new();
    let mut valid: Vec<Variant> = Vec::with_capacity(variants.len());
    for variant in variants {
        match variant.validate(chromosome) {
            Ok(()) => valid.push(variant.clone()),
            Err(e) => errors.push(e),
        }
    }
    sort_variants(&mut valid);

    let mut sites = Vec::new();
    let mut current: Option<(i64, SiteAlleles)> = None;

    for (i, variant) in valid.iter().enumerate() {
        if i % CHECK_INTERVAL == 0 {
            token.check()?;
        }

        if current.map_or(true, |(position, _)| position != variant.reference_start) {
            if let Some((position, alleles)) = current.take() {
                sites.extend(alleles.carried(position));
            }
            current = Some((variant.reference_start, SiteAlleles::default()));
        }

        if let Some((_, alleles)) = current.as_mut() {
            for &slot in variant.allele.slots() {
                alleles.inserted[slot] += variant.inserted_length();
                alleles.deleted[slot] += variant.deleted_length();
            }
        }
    }

    if let Some((position, alleles)) = current {
        sites.extend(alleles.carried(position));
    }

    Ok((sites, errors))
}

/// Synchronized tables of one chromosome
#[derive(Debug, Clone, PartialEq)]
pub struct ChromosomeSync {
    chromosome: Chromosome,
    entries: Arc<[OffsetEntry]>,
    reference: OffsetTable,
    tables: BTreeMap<String, OffsetTable>,
    errors: Vec<VariantError>,
}

impl ChromosomeSync {
    pub fn chromosome(&self) -> &Chromosome {
        &self.chromosome
    }

    /// Offset entries shared by every table of the chromosome
    pub fn entries(&self) -> &[OffsetEntry] {
        &self.entries
    }

    /// The reference genome on the meta axis
    pub fn reference_table(&self) -> &OffsetTable {
        &self.reference
    }

    pub fn table(&self, genome_id: &str) -> Option<&OffsetTable> {
        if genome_id == REFERENCE_GENOME_ID {
            return Some(&self.reference);
        }
        self.tables.get(genome_id)
    }

    /// Genome tables sorted by genome id
    pub fn tables(&self) -> impl Iterator<Item = &OffsetTable> {
        self.tables.values()
    }

    /// Invalid variants skipped on this chromosome
    pub fn errors(&self) -> &[VariantError] {
        &self.errors
    }

    /// True when some records were skipped; collaborators should flag it
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Genomes with at least one skipped record
    pub fn genomes_with_errors(&self) -> BTreeSet<&str> {
        self.errors.iter().map(|e| e.genome.as_str()).collect()
    }

    pub fn meta_length(&self) -> i64 {
        self.reference.meta_length()
    }
}

/// Synchronized tables of every chromosome, indexed like the chromosome list
#[derive(Debug, Clone, PartialEq)]
pub struct SyncResult {
    chromosomes: ChromosomeList,
    genome_ids: Vec<String>,
    per_chromosome: Vec<ChromosomeSync>,
}

impl SyncResult {
    pub fn chromosomes(&self) -> &ChromosomeList {
        &self.chromosomes
    }

    pub fn genome_ids(&self) -> &[String] {
        &self.genome_ids
    }

    pub fn get(&self, index: usize) -> Option<&ChromosomeSync> {
        self.per_chromosome.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChromosomeSync> {
        self.per_chromosome.iter()
    }

    /// Synchronized chromosome, trying different naming styles
    pub fn by_name(&self, chrom: &str) -> CoordinateResult<&ChromosomeSync> {
        self.chromosomes
            .index_of(chrom)
            .and_then(|i| self.get(i))
            .ok_or_else(|| CoordinateError::UnknownChromosome(chrom.to_string()))
    }

    /// Table of a genome (or of [`REFERENCE_GENOME_ID`]) on a chromosome
    pub fn table(&self, chrom: &str, genome_id: &str) -> CoordinateResult<&OffsetTable> {
        self.by_name(chrom)?
            .table(genome_id)
            .ok_or_else(|| CoordinateError::UnknownGenome(genome_id.to_string()))
    }

    pub fn total_errors(&self) -> usize {
        self.per_chromosome.iter().map(|c| c.errors.len()).sum()
    }

    /// Chromosomes with skipped records
    pub fn partial_chromosomes(&self) -> impl Iterator<Item = &ChromosomeSync> {
        self.per_chromosome.iter().filter(|c| c.is_partial())
    }
}

/// Builds offset tables for a fixed set of genomes
#[derive(Debug, Clone)]
pub struct Synchronizer {
    genome_ids: Vec<String>,
}

impl Synchronizer {
    /// Genome ids are deduplicated and sorted
    pub fn new<S: Into<String>>(genome_ids: impl IntoIterator<Item = S>) -> Self {
        let mut genome_ids: Vec<String> = genome_ids.into_iter().map(Into::into).collect();
        genome_ids.sort();
        genome_ids.dedup();
        genome_ids.retain(|g| g != REFERENCE_GENOME_ID);
        Self { genome_ids }
    }

    pub fn genome_ids(&self) -> &[String] {
        &self.genome_ids
    }

    /// Synchronize every chromosome, one pool unit per chromosome
    pub fn synchronize<S: VariantSource>(
        &self,
        chromosomes: &ChromosomeList,
        source: &S,
        pool: &OperationPool,
        ctx: &OperationContext,
    ) -> OperationResult<SyncResult> {
        info!(
            "Synchronizing {} genomes over {} chromosomes",
            self.genome_ids.len(),
            chromosomes.len()
        );

        let per_chromosome = pool.submit(chromosomes.as_slice(), ctx, |_, chromosome, token| {
            self.synchronize_chromosome(chromosome, source, token)
        })?;

        let result = SyncResult {
            chromosomes: chromosomes.clone(),
            genome_ids: self.genome_ids.clone(),
            per_chromosome,
        };
        if result.total_errors() > 0 {
            warn!(
                "{} invalid variants skipped on {} chromosomes",
                result.total_errors(),
                result.partial_chromosomes().count()
            );
        }
        Ok(result)
    }

    /// Synchronize a single chromosome on the calling thread
    pub fn synchronize_chromosome<S: VariantSource>(
        &self,
        chromosome: &Chromosome,
        source: &S,
        token: &StopToken,
    ) -> OperationResult<ChromosomeSync> {
        let mut errors = Vec::new();
        let mut carried: Vec<(&str, Vec<CarriedSite>)> = Vec::with_capacity(self.genome_ids.len());

        for genome_id in &self.genome_ids {
            token.check()?;
            let (sites, skipped) =
                collapse_sites(chromosome, source.variants(chromosome, genome_id), token)?;
            errors.extend(skipped);
            carried.push((genome_id.as_str(), sites));
        }

        let mut reserved: BTreeMap<i64, i64> = BTreeMap::new();
        for (_, sites) in &carried {
            for site in sites.iter().filter(|s| s.inserted > 0) {
                let width = reserved.entry(site.reference_position).or_insert(0);
                *width = (*width).max(site.inserted);
            }
        }

        // (anchor, meta start, width) of every reserved block
        let mut blocks: Vec<(i64, i64, i64)> = Vec::with_capacity(reserved.len());
        let mut entries: Vec<OffsetEntry> = Vec::with_capacity(reserved.len());
        let mut shift = 0i64;
        for (&position, &width) in &reserved {
            blocks.push((position, position + shift, width));
            shift += width;
            entries.push(OffsetEntry {
                reference_position: position,
                cumulative_shift: shift,
            });
        }
        let entries: Arc<[OffsetEntry]> = entries.into();

        let reference = OffsetTable::assemble(
            chromosome.clone(),
            REFERENCE_GENOME_ID.to_string(),
            entries.clone(),
            &[],
            blocks.iter().map(|&(_, start, width)| (start, start + width)).collect(),
        );

        let mut tables = BTreeMap::new();
        for (genome_id, sites) in carried {
            token.check()?;

            let own_insertions: BTreeMap<i64, i64> = sites
                .iter()
                .filter(|s| s.inserted > 0)
                .map(|s| (s.reference_position, s.inserted))
                .collect();
            let gaps: Vec<(i64, i64)> = blocks
                .iter()
                .filter_map(|&(position, start, width)| {
                    let own = own_insertions.get(&position).copied().unwrap_or(0).min(width);
                    (own < width).then_some((start + own, start + width))
                })
                .collect();
            let deletions: Vec<(i64, i64)> = sites
                .iter()
                .filter(|s| s.deleted > 0)
                .map(|s| (s.reference_position, s.deleted))
                .collect();

            let table = OffsetTable::assemble(
                chromosome.clone(),
                genome_id.to_string(),
                entries.clone(),
                &deletions,
                gaps,
            );
            tables.insert(genome_id.to_string(), table);
        }

        debug!(
            "{}: {} reserved sites, {} inserted bases, {} skipped variants",
            chromosome.name(),
            reserved.len(),
            shift,
            errors.len()
        );

        Ok(ChromosomeSync {
            chromosome: chromosome.clone(),
            entries,
            reference,
            tables,
            errors,
        })
    }
}
