//! Error types for MetaGenomeSync
//!
//! Defines all error types used throughout the library.

use thiserror::Error;

/// Main error type for MetaGenomeSync operations
#[derive(Debug, Error)]
pub enum MetaGenomeError {
    /// Malformed variant record
    #[error("Variant error: {0}")]
    Variant(#[from] VariantError),

    /// Coordinate translation errors
    #[error("Coordinate error: {0}")]
    Coordinate(#[from] CoordinateError),

    /// Pool-wide operation errors
    #[error("Operation error: {0}")]
    Operation(#[from] OperationError),

    /// Interval list errors
    #[error("Interval error: {0}")]
    Interval(#[from] IntervalError),

    /// Input table errors
    #[error("Table parse error: {0}")]
    TableParse(#[from] TableParseError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A malformed variant record.
///
/// Recoverable: the record is skipped and the error is attached to the
/// chromosome result it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid variant on {chrom} at {position} (genome {genome}): {reason}")]
pub struct VariantError {
    pub chrom: String,
    pub genome: String,
    pub position: i64,
    pub reason: String,
}

impl VariantError {
    pub fn new(
        chrom: impl Into<String>,
        genome: impl Into<String>,
        position: i64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            genome: genome.into(),
            position,
            reason: reason.into(),
        }
    }
}

/// Errors raised by a single coordinate translation call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    /// Position is negative or past the end of the coordinate system
    #[error("Position {position} out of range 0..={limit} on {chrom} ({system})")]
    OutOfRange {
        chrom: String,
        position: i64,
        limit: i64,
        system: &'static str,
    },

    /// Chromosome not part of the synchronized set
    #[error("Unknown chromosome: {0}")]
    UnknownChromosome(String),

    /// Genome not part of the synchronized set
    #[error("Unknown genome: {0}")]
    UnknownGenome(String),
}

/// Errors that abort a whole pool submission
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// A stop was requested; the operation has no result
    #[error("Operation cancelled")]
    Cancelled,

    /// A unit failed; reported for the lowest failing index
    #[error("Operation failed on unit {index}: {message}")]
    Failed { index: usize, message: String },

    /// The worker pool could not be created
    #[error("Failed to create thread pool: {0}")]
    ThreadPool(String),
}

/// Errors about interval lists and their transformations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntervalError {
    /// start must be strictly lower than stop
    #[error("Invalid interval [{start}, {stop})")]
    InvalidInterval { start: i64, stop: i64 },

    /// Fit resolution must be finite and positive
    #[error("Invalid resolution: {0} pixels per base")]
    InvalidResolution(f64),

    /// Two genome-wide lists do not share the same chromosome layout
    #[error("Chromosome layout mismatch: {left} vs {right} chromosomes")]
    ChromosomeMismatch { left: usize, right: usize },
}

/// Errors raised by the tab-separated input adapters
#[derive(Debug, Error)]
pub enum TableParseError {
    /// Wrong number of columns
    #[error("Line {line}: expected at least {expected} fields, got {found}")]
    MissingFields {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A numeric column failed to parse
    #[error("Line {line}: invalid {field} '{value}'")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    /// Unrecognised keyword column
    #[error("Line {line}: invalid {field} '{value}'")]
    InvalidKeyword {
        line: usize,
        field: &'static str,
        value: String,
    },

    /// Record references a chromosome missing from the sizes table
    #[error("Line {line}: unknown chromosome '{chrom}'")]
    UnknownChromosome { line: usize, chrom: String },

    /// Record runs past the end of its chromosome
    #[error("Line {line}: stop {stop} beyond the end of {chrom} (length {length})")]
    PastChromosomeEnd {
        line: usize,
        chrom: String,
        stop: i64,
        length: u32,
    },

    /// I/O error while reading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for MetaGenomeSync operations
pub type Result<T> = std::result::Result<T, MetaGenomeError>;

/// Result type alias for coordinate translation
pub type CoordinateResult<T> = std::result::Result<T, CoordinateError>;

/// Result type alias for pool submissions
pub type OperationResult<T> = std::result::Result<T, OperationError>;

/// Result type alias for interval list operations
pub type IntervalResult<T> = std::result::Result<T, IntervalError>;

/// Result type alias for the input adapters
pub type TableResult<T> = std::result::Result<T, TableParseError>;
