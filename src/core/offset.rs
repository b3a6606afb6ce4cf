//! Offset tables and coordinate translation
//!
//! An offset table describes one genome of one chromosome on the meta-genome
//! axis. It holds:
//!
//! - the sorted `(reference position -> cumulative shift)` entries created by
//!   insertions, shared by every genome of the chromosome once synchronized;
//! - the dead zones left by the genome's own deletions;
//! - the absent ranges of the genome (dead zones plus reserved insertion
//!   space the genome does not carry), used for native coordinates.
//!
//! All lookups are binary searches over sorted vectors.
//!
//! # Coordinate layout
//!
//! An insertion of `W` bases anchored at reference position `p` occupies meta
//! positions `[p + S, p + S + W)` where `S` is the shift accumulated before
//! `p`; reference base `p` itself lands at `p + S + W`.

use crate::core::chromosome::Chromosome;
use crate::core::error::{CoordinateError, CoordinateResult, VariantError};
use crate::core::variant::{sort_variants, Variant};
use rust_lapper::{Interval, Lapper};
use std::fmt;
use std::sync::Arc;

/// One breakpoint of the meta-genome axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OffsetEntry {
    pub reference_position: i64,
    /// Shift in effect from `reference_position` onwards
    pub cumulative_shift: i64,
}

impl OffsetEntry {
    /// Meta position of the reference base at this breakpoint
    #[inline]
    pub fn meta_position(&self) -> i64 {
        self.reference_position + self.cumulative_shift
    }
}

/// Meta-axis range not addressable on a genome because of a deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeadZone {
    pub meta_start: i64,
    pub meta_stop: i64,
    /// Reference anchor of the deletion that produced the zone
    pub reference_start: i64,
}

impl DeadZone {
    pub fn len(&self) -> i64 {
        self.meta_stop - self.meta_start
    }

    pub fn is_empty(&self) -> bool {
        self.meta_stop <= self.meta_start
    }
}

/// Merged meta-axis range with no base on the genome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct AbsentRange {
    meta_start: i64,
    meta_stop: i64,
    /// Absent positions strictly before `meta_start`
    absent_before: i64,
}

impl AbsentRange {
    #[inline]
    fn len(&self) -> i64 {
        self.meta_stop - self.meta_start
    }

    /// First native position following this range
    #[inline]
    fn native_boundary(&self) -> i64 {
        self.meta_start - self.absent_before
    }
}

/// Coordinate systems an offset table translates between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordinateSystem {
    /// Reference genome positions
    Reference,
    /// Meta-genome positions
    Meta,
    /// Native positions of the table's genome
    Genome,
}

impl CoordinateSystem {
    /// Parse from string (for CLI argument)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "reference" | "ref" | "r" => Some(CoordinateSystem::Reference),
            "meta" | "m" => Some(CoordinateSystem::Meta),
            "genome" | "native" | "g" => Some(CoordinateSystem::Genome),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinateSystem::Reference => "reference",
            CoordinateSystem::Meta => "meta",
            CoordinateSystem::Genome => "genome",
        }
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shift in effect at a reference position
#[inline]
pub(crate) fn shift_at(entries: &[OffsetEntry], reference_position: i64) -> i64 {
    let idx = entries.partition_point(|e| e.reference_position <= reference_position);
    if idx == 0 {
        0
    } else {
        entries[idx - 1].cumulative_shift
    }
}

/// Dead zones of a deletion removing reference bases `[anchor - length, anchor)`.
///
/// Blocks anchored strictly inside the deleted range sit between two deleted
/// bases on the meta axis. They are inserted space, not deleted space, so the
/// deletion is split around them: one zone per contiguous run of deleted
/// bases, and the zone lengths add up to the deletion length.
fn deleted_runs(entries: &[OffsetEntry], anchor: i64, length: i64) -> Vec<DeadZone> {
    let first = (anchor - length).max(0);
    let last = anchor - 1;
    if last < first {
        return Vec::new();
    }

    let lo = entries.partition_point(|e| e.reference_position <= first);
    let hi = entries.partition_point(|e| e.reference_position <= last);

    let mut zones = Vec::with_capacity(hi - lo + 1);
    let mut run_start = first;
    for entry in &entries[lo..hi] {
        let run_stop = entry.reference_position;
        zones.push(DeadZone {
            meta_start: run_start + shift_at(entries, run_start),
            meta_stop: run_stop - 1 + shift_at(entries, run_stop - 1) + 1,
            reference_start: anchor,
        });
        run_start = run_stop;
    }
    zones.push(DeadZone {
        meta_start: run_start + shift_at(entries, run_start),
        meta_stop: last + shift_at(entries, last) + 1,
        reference_start: anchor,
    });
    zones
}

/// Coordinate translator for one genome of one chromosome
#[derive(Clone)]
pub struct OffsetTable {
    chromosome: Chromosome,
    genome_id: String,
    entries: Arc<[OffsetEntry]>,
    dead_zones: Vec<DeadZone>,
    dead_index: Arc<Lapper<u64, usize>>,
    absent: Vec<AbsentRange>,
}

impl OffsetTable {
    /// Build a table from one genome's variants.
    ///
    /// Single forward pass: every insertion adds its length to the running
    /// shift and records an entry at its anchor; variants sharing an anchor
    /// fold into one entry carrying the summed length. Deletions create no
    /// entry but record a dead zone over `[start + delta, start)`, summed per
    /// anchor as well.
    ///
    /// Invalid records are skipped and returned next to the table.
    pub fn build(
        chromosome: &Chromosome,
        genome_id: &str,
        variants: &[Variant],
    ) -> (Self, Vec<VariantError>) {
        let mut errors = Vec::new();
        let mut valid: Vec<Variant> = Vec::with_capacity(variants.len());
        for variant in variants {
            match variant.validate(chromosome) {
                Ok(()) => valid.push(variant.clone()),
                Err(e) => errors.push(e),
            }
        }

        let sorted = valid
            .windows(2)
            .all(|w| w[0].reference_start <= w[1].reference_start);
        if !sorted {
            sort_variants(&mut valid);
        }

        let mut entries: Vec<OffsetEntry> = Vec::new();
        let mut deletions: Vec<(i64, i64)> = Vec::new();
        let mut shift = 0i64;

        for variant in &valid {
            let inserted = variant.inserted_length();
            if inserted > 0 {
                shift += inserted;
                match entries.last_mut() {
                    Some(last) if last.reference_position == variant.reference_start => {
                        last.cumulative_shift = shift;
                    }
                    _ => entries.push(OffsetEntry {
                        reference_position: variant.reference_start,
                        cumulative_shift: shift,
                    }),
                }
            }

            let deleted = variant.deleted_length();
            if deleted > 0 {
                match deletions.last_mut() {
                    Some(last) if last.0 == variant.reference_start => last.1 += deleted,
                    _ => deletions.push((variant.reference_start, deleted)),
                }
            }
        }

        let table = Self::assemble(
            chromosome.clone(),
            genome_id.to_string(),
            entries.into(),
            &deletions,
            Vec::new(),
        );
        (table, errors)
    }

    /// Identity table: no insertions, no deletions
    pub fn identity(chromosome: &Chromosome, genome_id: &str) -> Self {
        Self::assemble(
            chromosome.clone(),
            genome_id.to_string(),
            Vec::<OffsetEntry>::new().into(),
            &[],
            Vec::new(),
        )
    }

    /// Assemble a table from shared entries, the genome's deletions
    /// `(anchor, length)` and its reserved-but-absent meta ranges.
    ///
    /// A deletion's reference range may reach below 0 only if unvalidated;
    /// such ranges are clipped at 0.
    pub(crate) fn assemble(
        chromosome: Chromosome,
        genome_id: String,
        entries: Arc<[OffsetEntry]>,
        deletions: &[(i64, i64)],
        reserved_gaps: Vec<(i64, i64)>,
    ) -> Self {
        let mut dead_zones: Vec<DeadZone> = deletions
            .iter()
            .filter(|(_, length)| *length > 0)
            .flat_map(|&(anchor, length)| deleted_runs(&entries, anchor, length))
            .filter(|zone| !zone.is_empty())
            .collect();
        dead_zones.sort_by_key(|z| (z.meta_start, z.meta_stop, z.reference_start));

        let dead_index = Lapper::new(
            dead_zones
                .iter()
                .enumerate()
                .map(|(i, z)| Interval {
                    start: z.meta_start as u64,
                    stop: z.meta_stop as u64,
                    val: i,
                })
                .collect(),
        );

        let mut ranges: Vec<(i64, i64)> = reserved_gaps
            .into_iter()
            .filter(|(start, stop)| start < stop)
            .chain(dead_zones.iter().map(|z| (z.meta_start, z.meta_stop)))
            .collect();
        ranges.sort_unstable();

        let mut absent: Vec<AbsentRange> = Vec::with_capacity(ranges.len());
        let mut absent_total = 0i64;
        for (start, stop) in ranges {
            match absent.last_mut() {
                Some(last) if start <= last.meta_stop => {
                    if stop > last.meta_stop {
                        absent_total += stop - last.meta_stop;
                        last.meta_stop = stop;
                    }
                }
                _ => {
                    absent.push(AbsentRange {
                        meta_start: start,
                        meta_stop: stop,
                        absent_before: absent_total,
                    });
                    absent_total += stop - start;
                }
            }
        }

        Self {
            chromosome,
            genome_id,
            entries,
            dead_zones,
            dead_index: Arc::new(dead_index),
            absent,
        }
    }

    pub fn chromosome(&self) -> &Chromosome {
        &self.chromosome
    }

    pub fn genome_id(&self) -> &str {
        &self.genome_id
    }

    /// Sorted breakpoints of the meta axis
    pub fn entries(&self) -> &[OffsetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dead zones sorted by meta start
    pub fn dead_zones(&self) -> &[DeadZone] {
        &self.dead_zones
    }

    /// Total number of inserted positions on the chromosome
    pub fn total_shift(&self) -> i64 {
        self.entries.last().map(|e| e.cumulative_shift).unwrap_or(0)
    }

    pub fn reference_length(&self) -> i64 {
        self.chromosome.len_i64()
    }

    pub fn meta_length(&self) -> i64 {
        self.reference_length() + self.total_shift()
    }

    /// Number of meta positions holding a base of this genome
    pub fn genome_length(&self) -> i64 {
        let absent: i64 = self
            .absent
            .last()
            .map(|a| a.absent_before + a.len())
            .unwrap_or(0);
        self.meta_length() - absent
    }

    fn check(&self, position: i64, limit: i64, system: CoordinateSystem) -> CoordinateResult<()> {
        if position < 0 || position > limit {
            return Err(CoordinateError::OutOfRange {
                chrom: self.chromosome.name().to_string(),
                position,
                limit,
                system: system.as_str(),
            });
        }
        Ok(())
    }

    /// Cumulative shift at or before a reference position
    pub fn shift_at(&self, reference_position: i64) -> CoordinateResult<i64> {
        self.check(reference_position, self.reference_length(), CoordinateSystem::Reference)?;
        Ok(shift_at(&self.entries, reference_position))
    }

    /// Reference position to meta position
    pub fn to_meta(&self, reference_position: i64) -> CoordinateResult<i64> {
        let shift = self.shift_at(reference_position)?;
        Ok(reference_position + shift)
    }

    /// Meta position to reference position.
    ///
    /// Positions inside inserted space map to the reference base the
    /// insertion is anchored to.
    pub fn to_reference(&self, meta_position: i64) -> CoordinateResult<i64> {
        self.check(meta_position, self.meta_length(), CoordinateSystem::Meta)?;

        let idx = self
            .entries
            .partition_point(|e| e.meta_position() <= meta_position);
        let shift = if idx == 0 {
            0
        } else {
            self.entries[idx - 1].cumulative_shift
        };

        let candidate = meta_position - shift;
        match self.entries.get(idx) {
            Some(next) if candidate >= next.reference_position => Ok(next.reference_position),
            _ => Ok(candidate),
        }
    }

    /// True when the meta position lies in reserved insertion space
    pub fn is_inserted(&self, meta_position: i64) -> CoordinateResult<bool> {
        self.check(meta_position, self.meta_length(), CoordinateSystem::Meta)?;
        let idx = self
            .entries
            .partition_point(|e| e.meta_position() <= meta_position);
        let shift = if idx == 0 {
            0
        } else {
            self.entries[idx - 1].cumulative_shift
        };
        Ok(matches!(
            self.entries.get(idx),
            Some(next) if meta_position - shift >= next.reference_position
        ))
    }

    /// True when the meta position lies in a dead zone of this genome
    pub fn is_dead(&self, meta_position: i64) -> bool {
        if meta_position < 0 {
            return false;
        }
        let pos = meta_position as u64;
        self.dead_index.find(pos, pos + 1).next().is_some()
    }

    /// Dead zones overlapping `[meta_start, meta_stop)`, sorted by start
    pub fn dead_zones_in(&self, meta_start: i64, meta_stop: i64) -> Vec<DeadZone> {
        if meta_stop <= meta_start || meta_stop <= 0 {
            return Vec::new();
        }
        let start = meta_start.max(0) as u64;
        let mut found: Vec<DeadZone> = self
            .dead_index
            .find(start, meta_stop as u64)
            .map(|iv| self.dead_zones[iv.val])
            .collect();
        found.sort_by_key(|z| (z.meta_start, z.meta_stop, z.reference_start));
        found
    }

    /// Meta position to the genome's native position.
    ///
    /// Returns `None` when no base of this genome sits at the position.
    pub fn meta_to_genome(&self, meta_position: i64) -> CoordinateResult<Option<i64>> {
        self.check(meta_position, self.meta_length(), CoordinateSystem::Meta)?;

        let idx = self.absent.partition_point(|a| a.meta_start <= meta_position);
        if idx == 0 {
            return Ok(Some(meta_position));
        }
        let range = &self.absent[idx - 1];
        if meta_position < range.meta_stop {
            return Ok(None);
        }
        Ok(Some(meta_position - range.absent_before - range.len()))
    }

    /// Genome native position to meta position
    pub fn genome_to_meta(&self, genome_position: i64) -> CoordinateResult<i64> {
        self.check(genome_position, self.genome_length(), CoordinateSystem::Genome)?;

        let idx = self
            .absent
            .partition_point(|a| a.native_boundary() <= genome_position);
        let before = if idx == 0 {
            0
        } else {
            let range = &self.absent[idx - 1];
            range.absent_before + range.len()
        };
        Ok(genome_position + before)
    }

    /// Reference position to the genome's native position
    pub fn reference_to_genome(&self, reference_position: i64) -> CoordinateResult<Option<i64>> {
        let meta = self.to_meta(reference_position)?;
        self.meta_to_genome(meta)
    }

    /// Genome native position to reference position
    pub fn genome_to_reference(&self, genome_position: i64) -> CoordinateResult<i64> {
        let meta = self.genome_to_meta(genome_position)?;
        self.to_reference(meta)
    }

    /// Translate between any two coordinate systems.
    ///
    /// `None` means the position has no counterpart on this genome.
    pub fn convert(
        &self,
        position: i64,
        from: CoordinateSystem,
        to: CoordinateSystem,
    ) -> CoordinateResult<Option<i64>> {
        let meta = match from {
            CoordinateSystem::Reference => self.to_meta(position)?,
            CoordinateSystem::Meta => {
                self.check(position, self.meta_length(), CoordinateSystem::Meta)?;
                position
            }
            CoordinateSystem::Genome => self.genome_to_meta(position)?,
        };

        match to {
            CoordinateSystem::Reference => self.to_reference(meta).map(Some),
            CoordinateSystem::Meta => Ok(Some(meta)),
            CoordinateSystem::Genome => self.meta_to_genome(meta),
        }
    }
}

impl PartialEq for OffsetTable {
    fn eq(&self, other: &Self) -> bool {
        self.chromosome == other.chromosome
            && self.genome_id == other.genome_id
            && self.entries[..] == other.entries[..]
            && self.dead_zones == other.dead_zones
            && self.absent == other.absent
    }
}

impl Eq for OffsetTable {}

impl fmt::Debug for OffsetTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffsetTable")
            .field("chromosome", &self.chromosome.name())
            .field("genome_id", &self.genome_id)
            .field("entries", &self.entries.len())
            .field("dead_zones", &self.dead_zones.len())
            .field("absent", &self.absent.len())
            .field("total_shift", &self.total_shift())
            .finish()
    }
}
