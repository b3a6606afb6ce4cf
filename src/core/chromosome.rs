//! Chromosomes and the ordered chromosome list
//!
//! The chromosome list is the iteration domain of every genome-wide
//! operation: pool units are indexed by chromosome index, and results are
//! stored in that order.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An immutable chromosome: name and length in bases.
///
/// Cloning is cheap; the name is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chromosome {
    name: Arc<str>,
    length: u32,
}

impl Chromosome {
    pub fn new(name: impl Into<Arc<str>>, length: u32) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    /// Length as a signed coordinate
    pub fn len_i64(&self) -> i64 {
        i64::from(self.length)
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl PartialOrd for Chromosome {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Chromosome {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_chrom_names(&self.name, &other.name)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.length.cmp(&other.length))
    }
}

/// Normalize chromosome name for lookup (handles chr1/1/CHR1 variants)
///
/// # Examples
/// ```
/// use metagenome_sync::core::normalize_chrom;
///
/// assert_eq!(normalize_chrom("chr1"), normalize_chrom("1"));
/// assert_eq!(normalize_chrom("CHRX"), "X");
/// assert_eq!(normalize_chrom("chrM"), normalize_chrom("MT"));
/// ```
pub fn normalize_chrom(chrom: &str) -> String {
    let without_prefix = strip_chr_prefix(chrom);
    let upper = without_prefix.to_uppercase();

    if upper == "M" {
        "MT".to_string()
    } else {
        upper
    }
}

fn strip_chr_prefix(chrom: &str) -> &str {
    match chrom.get(..3) {
        Some(prefix) if chrom.len() > 3 && prefix.eq_ignore_ascii_case("chr") => &chrom[3..],
        _ => chrom,
    }
}

/// Rank used by the natural comparator: autosomes by number, then X, Y, M,
/// then everything else.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum ChromRank<'a> {
    Numbered(u64, &'a str),
    X,
    Y,
    Mito,
    Other(&'a str),
}

fn chrom_rank(name: &str) -> ChromRank<'_> {
    let stripped = strip_chr_prefix(name);
    let digits_end = stripped
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(stripped.len());

    if digits_end > 0 {
        if let Ok(number) = stripped[..digits_end].parse::<u64>() {
            return ChromRank::Numbered(number, &stripped[digits_end..]);
        }
    }

    if stripped.eq_ignore_ascii_case("x") {
        ChromRank::X
    } else if stripped.eq_ignore_ascii_case("y") {
        ChromRank::Y
    } else if stripped.eq_ignore_ascii_case("m") || stripped.eq_ignore_ascii_case("mt") {
        ChromRank::Mito
    } else {
        ChromRank::Other(stripped)
    }
}

/// Natural chromosome order: 1, 2, ..., 10, ..., X, Y, M, then lexical.
///
/// # Examples
/// ```
/// use metagenome_sync::core::compare_chrom_names;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare_chrom_names("chr2", "chr10"), Ordering::Less);
/// assert_eq!(compare_chrom_names("chrX", "chr22"), Ordering::Greater);
/// assert_eq!(compare_chrom_names("chrY", "chrM"), Ordering::Less);
/// ```
pub fn compare_chrom_names(a: &str, b: &str) -> Ordering {
    chrom_rank(a).cmp(&chrom_rank(b))
}

/// Ordered, immutable list of chromosomes
///
/// Indices into this list are the keys of every per-chromosome result.
#[derive(Debug, Clone)]
pub struct ChromosomeList {
    chromosomes: Arc<[Chromosome]>,
    by_name: Arc<HashMap<String, usize>>,
    aliases: Arc<HashMap<String, usize>>,
}

impl ChromosomeList {
    /// Build a list sorted by the natural comparator.
    ///
    /// Duplicate names keep the first occurrence.
    pub fn new(chromosomes: impl IntoIterator<Item = Chromosome>) -> Self {
        let mut sorted: Vec<Chromosome> = Vec::new();
        for chrom in chromosomes {
            if !sorted.iter().any(|c| c.name() == chrom.name()) {
                sorted.push(chrom);
            }
        }
        sorted.sort();

        let mut by_name = HashMap::with_capacity(sorted.len());
        let mut aliases = HashMap::with_capacity(sorted.len());
        for (index, chrom) in sorted.iter().enumerate() {
            by_name.insert(chrom.name().to_string(), index);
            aliases.entry(normalize_chrom(chrom.name())).or_insert(index);
        }

        Self {
            chromosomes: sorted.into(),
            by_name: Arc::new(by_name),
            aliases: Arc::new(aliases),
        }
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Chromosome> {
        self.chromosomes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chromosome> {
        self.chromosomes.iter()
    }

    pub fn as_slice(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    /// Find the index of a chromosome, trying different naming styles
    pub fn index_of(&self, name: &str) -> Option<usize> {
        if let Some(&index) = self.by_name.get(name) {
            return Some(index);
        }
        self.aliases.get(&normalize_chrom(name)).copied()
    }

    pub fn find(&self, name: &str) -> Option<&Chromosome> {
        self.index_of(name).and_then(|i| self.get(i))
    }

    /// Sum of all chromosome lengths
    pub fn genome_length(&self) -> u64 {
        self.chromosomes.iter().map(|c| u64::from(c.length())).sum()
    }

    /// True when both lists hold the same chromosomes in the same order
    pub fn same_layout(&self, other: &ChromosomeList) -> bool {
        Arc::ptr_eq(&self.chromosomes, &other.chromosomes)
            || self.chromosomes[..] == other.chromosomes[..]
    }
}

impl PartialEq for ChromosomeList {
    fn eq(&self, other: &Self) -> bool {
        self.same_layout(other)
    }
}

impl Default for ChromosomeList {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<'a> IntoIterator for &'a ChromosomeList {
    type Item = &'a Chromosome;
    type IntoIter = std::slice::Iter<'a, Chromosome>;

    fn into_iter(self) -> Self::IntoIter {
        self.chromosomes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &ChromosomeList) -> Vec<&str> {
        list.iter().map(|c| c.name()).collect()
    }

    #[test]
    fn test_natural_order() {
        let list = ChromosomeList::new(vec![
            Chromosome::new("chrM", 16569),
            Chromosome::new("chr10", 100),
            Chromosome::new("chrY", 100),
            Chromosome::new("chr2", 100),
            Chromosome::new("chrX", 100),
            Chromosome::new("chr1", 100),
            Chromosome::new("chrUn_gl000220", 100),
        ]);

        assert_eq!(
            names(&list),
            vec!["chr1", "chr2", "chr10", "chrX", "chrY", "chrM", "chrUn_gl000220"]
        );
    }

    #[test]
    fn test_numeric_suffix_order() {
        assert_eq!(compare_chrom_names("chr1", "chr1_random"), Ordering::Less);
        assert_eq!(compare_chrom_names("2", "chr2"), Ordering::Equal);
        assert_eq!(compare_chrom_names("chrMT", "chrM"), Ordering::Equal);
    }

    #[test]
    fn test_lexical_fallback() {
        assert_eq!(compare_chrom_names("scaffold_b", "scaffold_a"), Ordering::Greater);
        assert_eq!(compare_chrom_names("chr9", "scaffold_a"), Ordering::Less);
    }

    #[test]
    fn test_index_lookup_aliases() {
        let list = ChromosomeList::new(vec![
            Chromosome::new("chr1", 1000),
            Chromosome::new("chrM", 100),
        ]);

        assert_eq!(list.index_of("chr1"), Some(0));
        assert_eq!(list.index_of("1"), Some(0));
        assert_eq!(list.index_of("CHR1"), Some(0));
        assert_eq!(list.index_of("MT"), Some(1));
        assert_eq!(list.index_of("chr2"), None);
    }

    #[test]
    fn test_duplicates_dropped() {
        let list = ChromosomeList::new(vec![
            Chromosome::new("chr1", 1000),
            Chromosome::new("chr1", 2000),
        ]);

        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).map(|c| c.length()), Some(1000));
    }

    #[test]
    fn test_genome_length_and_layout() {
        let a = ChromosomeList::new(vec![Chromosome::new("chr1", 10), Chromosome::new("chr2", 20)]);
        let b = ChromosomeList::new(vec![Chromosome::new("chr2", 20), Chromosome::new("chr1", 10)]);
        let c = ChromosomeList::new(vec![Chromosome::new("chr1", 10)]);

        assert_eq!(a.genome_length(), 30);
        assert!(a.same_layout(&b));
        assert!(!a.same_layout(&c));
    }

    #[test]
    fn test_normalize_chrom() {
        assert_eq!(normalize_chrom("chr1"), "1");
        assert_eq!(normalize_chrom("x"), "X");
        assert_eq!(normalize_chrom("chrMT"), "MT");
        assert_eq!(normalize_chrom("M"), "MT");
    }
}
