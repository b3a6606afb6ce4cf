//! Core coordinate synchronization functionality
//!
//! This module contains the chromosome and variant model, offset tables and
//! coordinate translation, the multi-genome synchronizer, the
//! chromosome-parallel operation pool and the interval list types.

mod builder;
mod chromosome;
mod error;
mod interval;
pub mod io;
mod offset;
pub mod pool;
mod sync;
mod variant;

pub use builder::{BuildMode, IntervalListBuilder};
pub use chromosome::{compare_chrom_names, normalize_chrom, Chromosome, ChromosomeList};
pub use error::{
    CoordinateError, CoordinateResult, IntervalError, IntervalResult, MetaGenomeError,
    OperationError, OperationResult, Result, TableParseError, TableResult, VariantError,
};
pub use interval::{GenomeWideList, IntervalList, ScoredInterval};
pub use io::{detect_compression, open_text, CompressionFormat, IoStrategy, SmartReader};
pub use offset::{CoordinateSystem, DeadZone, OffsetEntry, OffsetTable};
pub use pool::{
    global_pool, init_global_pool, OperationContext, OperationPool, ProgressCounter, ProgressSink,
    StopToken,
};
pub use sync::{
    collapse_sites, CarriedSite, ChromosomeSync, SyncResult, Synchronizer, REFERENCE_GENOME_ID,
};
pub use variant::{sort_variants, Allele, Variant, VariantKind, VariantSource, VariantStore};
