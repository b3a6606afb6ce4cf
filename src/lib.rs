//! MetaGenomeSync - Multi-genome coordinate synchronization
//!
//! Builds a shared "meta-genome" axis over several sample genomes aligned to
//! one reference, so that features of every genome can be displayed and
//! compared on the same coordinates.
//!
//! # Features
//!
//! - Per-chromosome, per-genome offset tables translating reference,
//!   meta-genome and genome-native positions by binary search
//! - Chromosome-parallel operation pool with ordered results, cooperative
//!   cancellation and progress reporting (rayon)
//! - Immutable interval lists with display fitting, window queries, scaling,
//!   filtering, track arithmetic and statistics
//! - Tab-separated loaders with transparent gzip/bzip2 support
//!
//! # Example
//!
//! ```
//! use metagenome_sync::core::{
//!     Chromosome, ChromosomeList, OperationContext, OperationPool, Synchronizer, Variant,
//!     VariantStore,
//! };
//!
//! let chromosomes = ChromosomeList::new(vec![Chromosome::new("chr1", 1000)]);
//! let mut store = VariantStore::new();
//! store.push("chr1", Variant::insertion(100, 5, "A"));
//!
//! let pool = OperationPool::with_workers(2).unwrap();
//! let sync = Synchronizer::new(["A", "B"])
//!     .synchronize(&chromosomes, &store, &pool, &OperationContext::new())
//!     .unwrap();
//!
//! // the insertion is reserved on the meta axis of every genome
//! assert_eq!(sync.table("chr1", "B").unwrap().to_meta(150).unwrap(), 155);
//! ```

pub mod core;
pub mod formats;
pub mod ops;

// Re-export commonly used types
pub use core::{
    Chromosome, ChromosomeList, CoordinateError, CoordinateSystem, GenomeWideList, IntervalList,
    IntervalListBuilder, MetaGenomeError, OffsetTable, OperationContext, OperationError,
    OperationPool, ScoredInterval, SyncResult, Synchronizer, Variant, VariantKind, VariantStore,
};
