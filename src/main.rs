//! MetaGenomeSync CLI entry point
//!
//! Synchronizes sample genomes onto a shared meta-genome axis and runs
//! interval operations over scored tracks.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use metagenome_sync::core::{
    init_global_pool, ChromosomeList, CoordinateSystem, OperationContext, OperationPool,
    ProgressSink, SyncResult, Synchronizer, REFERENCE_GENOME_ID,
};
use metagenome_sync::formats;
use metagenome_sync::ops::{self, ArithmeticOp};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "metagenome-sync")]
#[command(about = "Multi-genome coordinate synchronization and track operations")]
#[command(version)]
#[command(author = "MetaGenomeSync Contributors")]
struct Cli {
    /// Worker threads for chromosome-parallel operations (0 = one per CPU)
    #[arg(short = 't', long, global = true, default_value = "0")]
    threads: usize,

    #[command(subcommand)]
    command: Commands,
}

/// Coordinate system (CLI enum)
#[derive(Clone, Copy, Debug, ValueEnum)]
enum SystemArg {
    #[value(name = "reference")]
    Reference,
    #[value(name = "meta")]
    Meta,
    #[value(name = "genome")]
    Genome,
}

impl From<SystemArg> for CoordinateSystem {
    fn from(arg: SystemArg) -> Self {
        match arg {
            SystemArg::Reference => CoordinateSystem::Reference,
            SystemArg::Meta => CoordinateSystem::Meta,
            SystemArg::Genome => CoordinateSystem::Genome,
        }
    }
}

/// Track arithmetic (CLI enum)
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OpArg {
    Add,
    Subtract,
    Multiply,
    Divide,
    Maximum,
    Minimum,
    Average,
}

impl From<OpArg> for ArithmeticOp {
    fn from(arg: OpArg) -> Self {
        match arg {
            OpArg::Add => ArithmeticOp::Add,
            OpArg::Subtract => ArithmeticOp::Subtract,
            OpArg::Multiply => ArithmeticOp::Multiply,
            OpArg::Divide => ArithmeticOp::Divide,
            OpArg::Maximum => ArithmeticOp::Maximum,
            OpArg::Minimum => ArithmeticOp::Minimum,
            OpArg::Average => ArithmeticOp::Average,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build offset tables for every genome and report them
    Sync {
        /// Chromosome sizes table (name, length)
        sizes: PathBuf,
        /// Variant table (chrom, start, delta, genome, kind[, allele])
        variants: PathBuf,
        /// Output file (optional, stdout if not specified)
        output: Option<PathBuf>,
        /// Also write every offset entry and dead zone
        #[arg(long)]
        entries: bool,
    },
    /// Translate positions between reference, meta and genome coordinates
    Translate {
        /// Chromosome sizes table (name, length)
        sizes: PathBuf,
        /// Variant table (chrom, start, delta, genome, kind[, allele])
        variants: PathBuf,
        /// Chromosome of the positions
        #[arg(short = 'c', long)]
        chrom: String,
        /// Genome whose table is used
        #[arg(short = 'g', long, default_value = REFERENCE_GENOME_ID)]
        genome: String,
        /// Source coordinate system
        #[arg(long, default_value = "reference")]
        from: SystemArg,
        /// Target coordinate system
        #[arg(long, default_value = "meta")]
        to: SystemArg,
        /// Positions to translate
        #[arg(required = true, allow_negative_numbers = true)]
        positions: Vec<i64>,
    },
    /// Project a scored track onto the meta-genome axis
    Project {
        /// Chromosome sizes table (name, length)
        sizes: PathBuf,
        /// Variant table (chrom, start, delta, genome, kind[, allele])
        variants: PathBuf,
        /// Scored intervals (chrom, start, stop, score)
        track: PathBuf,
        /// Output file (optional, stdout if not specified)
        output: Option<PathBuf>,
        /// Genome the track belongs to
        #[arg(short = 'g', long, default_value = REFERENCE_GENOME_ID)]
        genome: String,
        /// Coordinates the track is in
        #[arg(long, default_value = "reference")]
        from: SystemArg,
        /// Also write the genome's dead zones as a mask track
        #[arg(long)]
        dead_zones: Option<PathBuf>,
    },
    /// Merge intervals closer than one display pixel
    Fit {
        /// Chromosome sizes table (name, length)
        sizes: PathBuf,
        /// Scored intervals (chrom, start, stop, score)
        track: PathBuf,
        /// Output file (optional, stdout if not specified)
        output: Option<PathBuf>,
        /// Display resolution in pixels per base
        #[arg(short = 'p', long, visible_alias = "ppb")]
        pixels_per_base: f64,
        /// Only report intervals overlapping chrom:start-stop
        #[arg(short = 'w', long)]
        window: Option<String>,
    },
    /// Scale scores and keep those within bounds
    Transform {
        /// Chromosome sizes table (name, length)
        sizes: PathBuf,
        /// Scored intervals (chrom, start, stop, score)
        track: PathBuf,
        /// Output file (optional, stdout if not specified)
        output: Option<PathBuf>,
        /// Score multiplier
        #[arg(long, default_value = "1.0")]
        scale: f32,
        /// Minimum score kept (inclusive)
        #[arg(long, allow_negative_numbers = true)]
        min: Option<f32>,
        /// Maximum score kept (inclusive)
        #[arg(long, allow_negative_numbers = true)]
        max: Option<f32>,
    },
    /// Combine two scored tracks segment by segment
    Combine {
        /// Chromosome sizes table (name, length)
        sizes: PathBuf,
        /// First scored track
        first: PathBuf,
        /// Second scored track
        second: PathBuf,
        /// Output file (optional, stdout if not specified)
        output: Option<PathBuf>,
        /// Operation applied to the two scores
        #[arg(long, default_value = "add")]
        op: OpArg,
    },
    /// Per-chromosome statistics of a scored track
    Stats {
        /// Chromosome sizes table (name, length)
        sizes: PathBuf,
        /// Scored intervals (chrom, start, stop, score)
        track: PathBuf,
    },
}

/// Logs pool progress at debug level
struct LogProgress(&'static str);

impl ProgressSink for LogProgress {
    fn unit_completed(&self, completed: usize, total: usize) {
        log::debug!("{}: {}/{} chromosomes", self.0, completed, total);
    }
}

fn context(label: &'static str) -> OperationContext {
    OperationContext::with_progress(Arc::new(LogProgress(label)))
}

fn open_output(output: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {:?}", path))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn load_sizes(path: &Path) -> anyhow::Result<ChromosomeList> {
    let chromosomes = formats::read_chrom_sizes(path)
        .with_context(|| format!("Failed to load chromosome sizes {:?}", path))?;
    eprintln!("Loaded {} chromosomes from {:?}", chromosomes.len(), path);
    Ok(chromosomes)
}

fn load_and_sync(
    chromosomes: &ChromosomeList,
    variants: &Path,
    pool: &OperationPool,
) -> anyhow::Result<SyncResult> {
    let start = Instant::now();
    let table = formats::read_variant_table(variants, chromosomes)
        .with_context(|| format!("Failed to load variant table {:?}", variants))?;
    eprintln!("Loaded {} variants for {} genomes", table.len(), table.genome_ids().len());

    let sync = Synchronizer::new(table.genome_ids()).synchronize(
        chromosomes,
        &table.store,
        pool,
        &context("sync"),
    )?;
    for chrom in sync.partial_chromosomes() {
        eprintln!(
            "Warning: {} invalid variants skipped on {} (genomes: {})",
            chrom.errors().len(),
            chrom.chromosome(),
            chrom.genomes_with_errors().into_iter().collect::<Vec<_>>().join(", ")
        );
    }
    eprintln!("Synchronized in {:.2}s", start.elapsed().as_secs_f64());
    Ok(sync)
}

fn write_sync_report(sync: &SyncResult, writer: &mut dyn Write, entries: bool) -> io::Result<()> {
    writeln!(writer, "#chrom\tgenome\tentries\ttotal_shift\tmeta_length\tgenome_length\tdead_zones")?;
    for chrom in sync.iter() {
        for table in std::iter::once(chrom.reference_table()).chain(chrom.tables()) {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                chrom.chromosome(),
                table.genome_id(),
                table.len(),
                table.total_shift(),
                table.meta_length(),
                table.genome_length(),
                table.dead_zones().len()
            )?;
        }
    }

    if entries {
        writeln!(writer, "#chrom\tkind\tgenome\treference\tmeta_start\tmeta_stop")?;
        for chrom in sync.iter() {
            let mut previous_shift = 0;
            for entry in chrom.entries() {
                let meta_start = entry.reference_position + previous_shift;
                writeln!(
                    writer,
                    "{}\tinsertion\t*\t{}\t{}\t{}",
                    chrom.chromosome(),
                    entry.reference_position,
                    meta_start,
                    entry.meta_position()
                )?;
                previous_shift = entry.cumulative_shift;
            }
            for table in chrom.tables() {
                for zone in table.dead_zones() {
                    writeln!(
                        writer,
                        "{}\tdead\t{}\t{}\t{}\t{}",
                        chrom.chromosome(),
                        table.genome_id(),
                        zone.reference_start,
                        zone.meta_start,
                        zone.meta_stop
                    )?;
                }
            }
        }
    }
    writer.flush()
}

fn parse_window(window: &str) -> anyhow::Result<(String, i64, i64)> {
    let (chrom, range) = window
        .rsplit_once(':')
        .ok_or_else(|| anyhow::anyhow!("Window must look like chrom:start-stop, got '{}'", window))?;
    let (start, stop) = range
        .split_once('-')
        .ok_or_else(|| anyhow::anyhow!("Window must look like chrom:start-stop, got '{}'", window))?;
    let start: i64 = start.replace(',', "").parse().context("Invalid window start")?;
    let stop: i64 = stop.replace(',', "").parse().context("Invalid window stop")?;
    Ok((chrom.to_string(), start, stop))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();

    let pool = init_global_pool(cli.threads)?;
    log::info!("Using {} worker threads", pool.workers());

    match cli.command {
        Commands::Sync { sizes, variants, output, entries } => {
            let chromosomes = load_sizes(&sizes)?;
            let sync = load_and_sync(&chromosomes, &variants, pool)?;

            let mut writer = open_output(output.as_deref())?;
            write_sync_report(&sync, &mut writer, entries)?;

            let meta_length: i64 = sync.iter().map(|c| c.meta_length()).sum();
            eprintln!("\n=== Synchronization Statistics ===");
            eprintln!("Chromosomes:     {}", chromosomes.len());
            eprintln!("Genomes:         {}", sync.genome_ids().len());
            eprintln!("Reference bases: {}", chromosomes.genome_length());
            eprintln!("Meta bases:      {}", meta_length);
            eprintln!("Skipped records: {}", sync.total_errors());
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::Translate { sizes, variants, chrom, genome, from, to, positions } => {
            let chromosomes = load_sizes(&sizes)?;
            let sync = load_and_sync(&chromosomes, &variants, pool)?;
            let table = sync.table(&chrom, &genome)?;

            let mut writer = open_output(None)?;
            for position in positions {
                match table.convert(position, from.into(), to.into())? {
                    Some(converted) => writeln!(writer, "{}\t{}", position, converted)?,
                    None => writeln!(writer, "{}\tNA", position)?,
                }
            }
            writer.flush()?;
        }

        Commands::Project { sizes, variants, track, output, genome, from, dead_zones } => {
            let chromosomes = load_sizes(&sizes)?;
            let sync = load_and_sync(&chromosomes, &variants, pool)?;
            let input = formats::read_scored_intervals(&track, &chromosomes)
                .with_context(|| format!("Failed to load track {:?}", track))?;

            let projected =
                ops::project_to_meta(&input, &sync, &genome, from.into(), pool, &context("project"))?;
            let mut writer = open_output(output.as_deref())?;
            formats::write_scored_intervals(&projected, &mut writer)?;

            if let Some(path) = dead_zones {
                let mask = ops::dead_zone_mask(&sync, &genome, pool, &context("mask"))?;
                let mut mask_writer = open_output(Some(&path))?;
                formats::write_scored_intervals(&mask, &mut mask_writer)?;
                eprintln!("Dead zones:      {} written to {:?}", mask.total_intervals(), path);
            }

            eprintln!("\n=== Projection Statistics ===");
            eprintln!("Intervals:       {}", input.total_intervals());
            eprintln!("Projected:       {}", projected.total_intervals());
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::Fit { sizes, track, output, pixels_per_base, window } => {
            let chromosomes = load_sizes(&sizes)?;
            let input = formats::read_scored_intervals(&track, &chromosomes)
                .with_context(|| format!("Failed to load track {:?}", track))?;
            let mut writer = open_output(output.as_deref())?;

            match window {
                Some(window) => {
                    let (chrom, window_start, window_stop) = parse_window(&window)?;
                    let mut cache = ops::DisplayCache::new(input);
                    for iv in cache.query(&chrom, pixels_per_base, window_start, window_stop)? {
                        writeln!(writer, "{}\t{}", chrom, iv)?;
                    }
                    writer.flush()?;
                }
                None => {
                    let fitted = ops::fit_genome_wide(&input, pixels_per_base, pool, &context("fit"))?;
                    formats::write_scored_intervals(&fitted, &mut writer)?;

                    eprintln!("\n=== Fit Statistics ===");
                    eprintln!("Intervals:       {}", input.total_intervals());
                    eprintln!("After fit:       {}", fitted.total_intervals());
                    eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
                }
            }
        }

        Commands::Transform { sizes, track, output, scale, min, max } => {
            let chromosomes = load_sizes(&sizes)?;
            let input = formats::read_scored_intervals(&track, &chromosomes)
                .with_context(|| format!("Failed to load track {:?}", track))?;

            let scaled = ops::scale(&input, scale, pool, &context("scale"))?;
            let filtered = ops::filter_by_score(&scaled, min, max, pool, &context("filter"))?;
            let mut writer = open_output(output.as_deref())?;
            formats::write_scored_intervals(&filtered, &mut writer)?;

            eprintln!("\n=== Transform Statistics ===");
            eprintln!("Intervals:       {}", input.total_intervals());
            eprintln!("Kept:            {}", filtered.total_intervals());
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::Combine { sizes, first, second, output, op } => {
            let chromosomes = load_sizes(&sizes)?;
            let a = formats::read_scored_intervals(&first, &chromosomes)
                .with_context(|| format!("Failed to load track {:?}", first))?;
            let b = formats::read_scored_intervals(&second, &chromosomes)
                .with_context(|| format!("Failed to load track {:?}", second))?;

            let combined = ops::combine(&a, &b, op.into(), pool, &context("combine"))?;
            let mut writer = open_output(output.as_deref())?;
            formats::write_scored_intervals(&combined, &mut writer)?;

            eprintln!("\n=== Combine Statistics ===");
            eprintln!("Operation:       {}", ArithmeticOp::from(op));
            eprintln!("Segments:        {}", combined.total_intervals());
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::Stats { sizes, track } => {
            let chromosomes = load_sizes(&sizes)?;
            let input = formats::read_scored_intervals(&track, &chromosomes)
                .with_context(|| format!("Failed to load track {:?}", track))?;
            let summary = ops::statistics(&input, pool, &context("stats"))?;

            let mut writer = open_output(None)?;
            writeln!(writer, "#chrom\tcount\tcovered\tmin\tmax\tmean")?;
            for (chrom, stats) in &summary.per_chromosome {
                writeln!(writer, "{}\t{}", chrom, stats)?;
            }
            writeln!(writer, "total\t{}", summary.total)?;
            writer.flush()?;
        }
    }

    Ok(())
}
