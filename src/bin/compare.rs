//! Experiment runner comparing the structured-matrix representations.
//!
//! For every requested structure kind, this executable builds a randomly
//! initialized `n × n` structured operator, multiplies a batch of random
//! vectors through it for a number of trials, and records wall-clock timing,
//! parameter counts, and (where a dense oracle exists) the maximum absolute
//! deviation of the fast path from the oracle. Results are consolidated into
//! a single CSV file tagged with the experiment name.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use faer::Mat;
use krylov_toeplitz::{
    toeplitz_mult_slow, utils::perf::peak_rss_kb, BatchedOperator, StructureKind, StructuredMatrix,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::Serialize;
use std::{path::PathBuf, time::Instant};

/// Structure kinds selectable from the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
#[clap(rename_all = "kebab-case")]
enum KindArg {
    Unconstrained,
    Circulant,
    LowRank,
    Toeplitz,
    ToeplitzCorner,
    Subdiagonal,
    TridiagonalCorner,
    HankelLike,
    VandermondeLike,
}

impl From<KindArg> for StructureKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Unconstrained => StructureKind::Unconstrained,
            KindArg::Circulant => StructureKind::Circulant,
            KindArg::LowRank => StructureKind::LowRank,
            KindArg::Toeplitz => StructureKind::Toeplitz,
            KindArg::ToeplitzCorner => StructureKind::ToeplitzCorner,
            KindArg::Subdiagonal => StructureKind::Subdiagonal,
            KindArg::TridiagonalCorner => StructureKind::TridiagonalCorner,
            KindArg::HankelLike => StructureKind::HankelLike,
            KindArg::VandermondeLike => StructureKind::VandermondeLike,
        }
    }
}

/// Command-line arguments for the comparison experiment.
#[derive(Parser, Debug)]
#[clap(
    name = "compare",
    about = "Compares structured-matrix multiplication paths on random data."
)]
struct CompareArgs {
    /// A name tagging this experiment run; recorded in every result row.
    name: String,

    /// Layer size n (the structured matrices are n x n).
    #[clap(long, default_value_t = 784)]
    n: usize,

    /// Number of input vectors per batch.
    #[clap(long, default_value_t = 50)]
    batch: usize,

    /// Displacement rank of the structured representations.
    #[clap(long, default_value_t = 4)]
    rank: usize,

    /// Number of timed trials per structure kind.
    #[clap(long, default_value_t = 5)]
    trials: usize,

    /// Standard deviation of the random initialization.
    #[clap(long, default_value_t = 0.01)]
    init_stddev: f32,

    /// RNG seed for reproducible runs.
    #[clap(long, default_value_t = 42)]
    seed: u64,

    /// Structure kinds to compare; all kinds when omitted.
    #[clap(long, value_enum, num_args = 1..)]
    kinds: Option<Vec<KindArg>>,

    /// Path to the output CSV file where results will be written.
    #[clap(long, value_name = "PATH")]
    output: PathBuf,
}

/// A single row of the consolidated results file.
#[derive(Debug, Serialize)]
struct CompareResult {
    name: String,
    operator: String,
    n: usize,
    rank: usize,
    batch: usize,
    trial: usize,
    num_parameters: usize,
    apply_time_s: f64,
    /// Maximum absolute deviation from the dense oracle, where one exists.
    max_abs_err: Option<f32>,
    rss_kb: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = CompareArgs::parse();
    let kinds: Vec<StructureKind> = match &args.kinds {
        Some(selected) => selected.iter().map(|&k| k.into()).collect(),
        None => StructureKind::all().to_vec(),
    };

    log::info!(
        "Experiment '{}': n={}, batch={}, rank={}, {} trials over {} kinds",
        args.name,
        args.n,
        args.batch,
        args.rank,
        args.trials,
        kinds.len()
    );

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to open output file {:?}", args.output))?;

    for kind in kinds {
        let layer = StructuredMatrix::random(kind, args.n, args.rank, args.init_stddev, &mut rng)?;
        log::info!("Running operator '{}'...", layer.name());

        for trial in 0..args.trials {
            let x = Mat::<f32>::from_fn(args.batch, args.n, |_, _| {
                rng.sample::<f32, _>(StandardNormal)
            });

            let start = Instant::now();
            let fast = layer.apply_batch(x.as_ref())?;
            let apply_time_s = start.elapsed().as_secs_f64();

            let max_abs_err = oracle_deviation(&layer, x.as_ref(), fast.as_ref())?;

            writer.serialize(CompareResult {
                name: args.name.clone(),
                operator: layer.name(),
                n: args.n,
                rank: args.rank,
                batch: args.batch,
                trial,
                num_parameters: layer.num_parameters(),
                apply_time_s,
                max_abs_err,
                rss_kb: peak_rss_kb(),
            })?;
        }
    }

    writer.flush()?;
    log::info!("Results written to {:?}", args.output);
    Ok(())
}

/// Computes the fast path's deviation from the dense oracle for the kinds
/// whose fast path differs from their reference path.
fn oracle_deviation(
    layer: &StructuredMatrix,
    x: faer::MatRef<'_, f32>,
    fast: faer::MatRef<'_, f32>,
) -> Result<Option<f32>> {
    let oracle = match layer {
        StructuredMatrix::Toeplitz { g, h, cycle } => {
            Some(toeplitz_mult_slow(g.as_ref(), h.as_ref(), x, *cycle)?)
        }
        // The remaining kinds either are their own reference (dense, generic
        // slow paths) or are a single transform (circulant); nothing
        // independent to compare against here.
        _ => None,
    };
    Ok(oracle.map(|expected| {
        let mut max = 0.0_f32;
        for i in 0..fast.nrows() {
            for j in 0..fast.ncols() {
                max = max.max((fast[(i, j)] - expected.as_ref()[(i, j)]).abs());
            }
        }
        max
    }))
}
