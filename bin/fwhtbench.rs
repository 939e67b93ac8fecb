/*
 * Copyright (C) 2026 EC FWHT Contributors
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * This file is part of EC FWHT.
 *
 * EC FWHT is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * EC FWHT is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with EC FWHT.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Command-line driver: correctness checks, timing and MSM baselines.
//!
//! ```text
//! fwhtbench verify 12 --workers 8 --mode seq
//! fwhtbench bench 20 --iters 5 --strategy batch --out const_procs_8.txt
//! fwhtbench compare 18 --workers 8 --mode rand --iters 3
//! fwhtbench msm 16 --cache-dir . --mode const --iters 5 --out msm.txt
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ec_fwht::random::{random_points_par, random_scalars_par};
use ec_fwht::{
    bn256, config, fast_msm, grumpkin, naive_msm, transform_serial, AffineStrategy, FixtureCache,
    FwhtCurve, FwhtEngine, FwhtOptions,
};
use group::prime::PrimeCurveAffine;
use group::Curve;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Parallel FWHT over elliptic-curve points")]
struct Cli {
    /// Curve the points live on
    #[arg(long, global = true, value_enum, default_value_t = CurveKind::Bn256)]
    curve: CurveKind,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check H(H(x)) = N·x and agreement with the serial transform
    Verify(VerifyArgs),

    /// Time the parallel transform
    Bench(BenchArgs),

    /// Time per-element against batch affine conversion
    Compare(CompareArgs),

    /// Time the bucket MSM, checked against a known result
    Msm(MsmArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CurveKind {
    Bn256,
    Grumpkin,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InputMode {
    /// Every entry is the generator
    Const,
    /// Entry i is (i + 1)·G
    Seq,
    /// Seeded random points
    Rand,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MsmMode {
    /// n copies of one scalar s against the generator, expected (n·s)·G
    Const,
    /// Cached random fixtures, checked against the naive MSM
    Rand,
}

#[derive(Args)]
struct VerifyArgs {
    /// Input length is 2^exp
    exp: u32,

    /// Worker threads (<= 0: all hardware threads)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    workers: isize,

    #[arg(long, value_enum, default_value_t = InputMode::Seq)]
    mode: InputMode,

    #[arg(long, default_value_t = 1)]
    seed: u64,
}

#[derive(Args)]
struct BenchArgs {
    /// Input length is 2^exp
    exp: u32,

    /// Worker threads (<= 0: all hardware threads)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    workers: isize,

    /// Timed iterations after one warmup run
    #[arg(long, default_value_t = 5)]
    iters: usize,

    /// Affine conversion strategy (default: FWHT_AFFINE)
    #[arg(long)]
    strategy: Option<AffineStrategy>,

    /// Stage tasks per worker (default: FWHT_OVERSUBSCRIPTION)
    #[arg(long)]
    oversubscription: Option<usize>,

    #[arg(long, value_enum, default_value_t = InputMode::Const)]
    mode: InputMode,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Append a result row to this file
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct CompareArgs {
    /// Input length is 2^exp
    exp: u32,

    /// Worker threads (<= 0: all hardware threads)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    workers: isize,

    #[arg(long, value_enum, default_value_t = InputMode::Rand)]
    mode: InputMode,

    /// Timed iterations per strategy
    #[arg(long, default_value_t = 3)]
    iters: usize,

    #[arg(long, default_value_t = 1)]
    seed: u64,
}

#[derive(Args)]
struct MsmArgs {
    /// Input length is 2^exp
    exp: u32,

    /// Worker threads for fixture generation (<= 0: all hardware threads)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    workers: isize,

    /// Directory holding the `data/` fixture tree
    #[arg(long, default_value = ".")]
    cache_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = MsmMode::Rand)]
    mode: MsmMode,

    /// Timed iterations
    #[arg(long, default_value_t = 5)]
    iters: usize,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Skip the naive MSM in rand mode (slow for large inputs)
    #[arg(long)]
    skip_naive: bool,

    /// Append a result row to this file
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    config::log_config();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    match cli.curve {
        CurveKind::Bn256 => dispatch::<bn256::G1Affine>(cli.command),
        CurveKind::Grumpkin => dispatch::<grumpkin::G1Affine>(cli.command),
    }
}

fn dispatch<A: FwhtCurve>(command: Command) -> Result<()> {
    match command {
        Command::Verify(args) => verify::<A>(args),
        Command::Bench(args) => bench::<A>(args),
        Command::Compare(args) => compare::<A>(args),
        Command::Msm(args) => msm::<A>(args),
    }
}

fn input_len(exp: u32) -> Result<usize> {
    if exp >= usize::BITS - 1 {
        bail!("exp {} is too large", exp);
    }
    Ok(1usize << exp)
}

fn make_points<A: FwhtCurve>(n: usize, mode: InputMode, workers: isize, seed: u64) -> Vec<A> {
    match mode {
        InputMode::Const => vec![A::generator(); n],
        InputMode::Seq => {
            let g = A::generator();
            (1..=n as u64)
                .map(|i| (g * A::ScalarExt::from(i)).to_affine())
                .collect()
        }
        InputMode::Rand => random_points_par(n, workers, seed),
    }
}

/// Best and average of a non-empty set of timings.
fn best_and_avg(times: &[Duration]) -> (Duration, Duration) {
    let best = times.iter().copied().min().unwrap_or_default();
    let total: Duration = times.iter().sum();
    (best, total / times.len().max(1) as u32)
}

fn percent(part: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    100.0 * part.as_secs_f64() / total.as_secs_f64()
}

fn ratio(num: Duration, den: Duration) -> f64 {
    if den.is_zero() {
        return 0.0;
    }
    num.as_secs_f64() / den.as_secs_f64()
}

/// Appends `row` to `path`, writing `header` first when the file is empty.
fn append_result(path: &Path, header: &[String], row: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    if file.metadata()?.len() == 0 {
        for line in header {
            writeln!(file, "{}", line)?;
        }
    }
    writeln!(file, "{}", row)?;
    info!("Appended result to {}", path.display());
    Ok(())
}

fn verify<A: FwhtCurve>(args: VerifyArgs) -> Result<()> {
    let n = input_len(args.exp)?;
    let engine = FwhtEngine::from_env();
    let input = make_points::<A>(n, args.mode, args.workers, args.seed);
    info!("verify: n=2^{}={} mode={:?}", args.exp, n, args.mode);

    let start = Instant::now();
    let once = engine.transform(&input, args.workers)?;
    println!("FWHT done in {:?} (len={})", start.elapsed(), once.len());

    let serial = transform_serial(&input)?;
    if let Some(i) = once.iter().zip(&serial).position(|(a, b)| a != b) {
        bail!("parallel and serial transforms differ at index {}", i);
    }
    println!("Parallel output matches the serial transform");

    let twice = engine.transform(&once, args.workers)?;
    let scale = A::ScalarExt::from(n as u64);
    for (i, (x, y)) in input.iter().zip(&twice).enumerate() {
        if (*x * scale).to_affine() != *y {
            bail!("H(H(x)) != N·x at index {}", i);
        }
    }
    println!("Check passed: H(H(x)) = N·x for all {} elements", n);
    Ok(())
}

fn bench<A: FwhtCurve>(args: BenchArgs) -> Result<()> {
    let n = input_len(args.exp)?;
    let iters = args.iters.max(1);

    let mut options = FwhtOptions::from_env();
    if let Some(strategy) = args.strategy {
        options = options.with_strategy(strategy);
    }
    if let Some(factor) = args.oversubscription {
        options = options.with_oversubscription(factor);
    }
    let engine = FwhtEngine::new(options);
    let input = make_points::<A>(n, args.mode, args.workers, args.seed);

    engine.transform(&input, args.workers)?;

    let mut times = Vec::with_capacity(iters);
    let mut last_profile = None;
    for _ in 0..iters {
        let (_, profile) = engine.transform_profiled(&input, args.workers)?;
        times.push(profile.total);
        last_profile = Some(profile);
    }
    let (best, avg) = best_and_avg(&times);
    let workers = last_profile.as_ref().map_or(0, |p| p.workers);

    if let Some(profile) = &last_profile {
        println!("{}", profile);
    }
    println!(
        "exp={} n={} workers={} iters={} best={:?} avg={:?}",
        args.exp, n, workers, iters, best, avg
    );

    if let Some(path) = &args.out {
        let header = [
            format!(
                "# FWHT benchmark (mode={:?}, workers={}, affine={})",
                args.mode,
                workers,
                engine.options().strategy
            ),
            "# exp | n | iters | best | avg".to_string(),
        ];
        let row = format!("{} | {} | {} | {:?} | {:?}", args.exp, n, iters, best, avg);
        append_result(path, &header, &row)?;
    }
    Ok(())
}

fn compare<A: FwhtCurve>(args: CompareArgs) -> Result<()> {
    let n = input_len(args.exp)?;
    let iters = args.iters.max(1);
    let input = make_points::<A>(n, args.mode, args.workers, args.seed);
    let base = FwhtOptions::from_env();
    info!("compare: n=2^{}={} mode={:?} iters={}", args.exp, n, args.mode, iters);

    let mut reference: Option<Vec<A>> = None;
    let mut summary = Vec::with_capacity(2);
    for strategy in [AffineStrategy::PerElement, AffineStrategy::Batch] {
        let engine = FwhtEngine::new(base.clone().with_strategy(strategy));
        let mut times = Vec::with_capacity(iters);
        let mut last_profile = None;

        for _ in 0..iters {
            let (out, profile) = engine.transform_profiled(&input, args.workers)?;
            match &reference {
                None => reference = Some(out),
                Some(expected) => {
                    if let Some(i) = expected.iter().zip(&out).position(|(a, b)| a != b) {
                        bail!("{} output differs from the first run at index {}", strategy, i);
                    }
                }
            }
            times.push(profile.total);
            last_profile = Some(profile);
        }

        let (best, avg) = best_and_avg(&times);
        println!("[{}] best={:?} avg={:?}", strategy, best, avg);
        if let Some(p) = &last_profile {
            println!(
                "  affine -> projective {:?} ({:.1}%)",
                p.to_projective,
                percent(p.to_projective, p.total)
            );
            println!(
                "  butterflies          {:?} ({:.1}%)",
                p.butterflies,
                percent(p.butterflies, p.total)
            );
            println!(
                "  projective -> affine {:?} ({:.1}%)",
                p.to_affine,
                percent(p.to_affine, p.total)
            );
            println!("  total                {:?} (workers={})", p.total, p.workers);
        }
        summary.push((best, avg));
    }

    if let [(single_best, single_avg), (batch_best, batch_avg)] = summary[..] {
        println!(
            "Speedup per-element/batch: best {:.2}x, avg {:.2}x",
            ratio(single_best, batch_best),
            ratio(single_avg, batch_avg)
        );
    }
    println!("Outputs agree across strategies and iterations");
    Ok(())
}

fn msm<A: FwhtCurve>(args: MsmArgs) -> Result<()> {
    let n = input_len(args.exp)?;
    let iters = args.iters.max(1);
    let (workers, seed) = (args.workers, args.seed);

    let (scalars, points, expected) = match args.mode {
        MsmMode::Const => {
            let s = random_scalars_par::<A>(1, workers, seed)
                .pop()
                .unwrap_or_else(|| A::ScalarExt::from(1u64));
            let expected = (A::generator() * (A::ScalarExt::from(n as u64) * s)).to_affine();
            (vec![s; n], vec![A::generator(); n], Some(expected))
        }
        MsmMode::Rand => {
            let cache = FixtureCache::new(&args.cache_dir);
            let (scalars, points, cached) = cache.load_or_create_inputs::<A, _, _>(
                args.exp,
                n,
                |n| random_scalars_par::<A>(n, workers, seed),
                |n| random_points_par::<A>(n, workers, seed.wrapping_add(1)),
            )?;
            info!(
                "MSM inputs: n={} cached={} root={}",
                n,
                cached,
                cache.root().display()
            );

            let expected = if args.skip_naive {
                None
            } else {
                let start = Instant::now();
                let naive = naive_msm(&points, &scalars)?;
                println!("naive MSM: {:?}", start.elapsed());
                Some(naive)
            };
            (scalars, points, expected)
        }
    };

    let mut times = Vec::with_capacity(iters);
    for iter in 0..iters {
        let start = Instant::now();
        let fast = fast_msm(&points, &scalars)?;
        times.push(start.elapsed());
        if let Some(expected) = &expected {
            if fast != *expected {
                bail!("MSM result is wrong on iteration {}", iter);
            }
        }
    }
    let (best, avg) = best_and_avg(&times);
    println!(
        "fast MSM : exp={} n={} iters={} best={:?} avg={:?}",
        args.exp, n, iters, best, avg
    );
    if expected.is_some() {
        println!("MSM results checked on every iteration");
    }

    if let Some(path) = &args.out {
        let header = [
            format!(
                "# MSM benchmark (mode={:?}, workers={})",
                args.mode,
                config::resolve_workers(workers)
            ),
            "# exp | n | iters | best | avg".to_string(),
        ];
        let row = format!("{} | {} | {} | {:?} | {:?}", args.exp, n, iters, best, avg);
        append_result(path, &header, &row)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> Result<()> {
        let mut argv = vec!["fwhtbench"];
        argv.extend_from_slice(args);
        execute(Cli::try_parse_from(argv)?)
    }

    #[test]
    fn test_curve_flag_is_global() {
        let cli = Cli::try_parse_from(["fwhtbench", "verify", "3", "--curve", "grumpkin"]).unwrap();
        assert!(matches!(cli.curve, CurveKind::Grumpkin));
        assert!(matches!(cli.command, Command::Verify(_)));
    }

    #[test]
    fn test_msm_rejects_seq_mode() {
        assert!(Cli::try_parse_from(["fwhtbench", "msm", "3", "--mode", "seq"]).is_err());
        assert!(Cli::try_parse_from(["fwhtbench", "msm", "3", "--mode", "const"]).is_ok());
    }

    #[test]
    fn test_verify_both_curves() {
        run(&["verify", "4", "--workers", "2"]).unwrap();
        run(&["verify", "3", "--mode", "rand", "--curve", "grumpkin"]).unwrap();
        run(&["verify", "2", "--workers", "-1", "--mode", "const"]).unwrap();
    }

    #[test]
    fn test_oversized_exp_is_an_error() {
        assert!(run(&["verify", "63"]).is_err());
        assert!(run(&["compare", "200"]).is_err());
    }

    #[test]
    fn test_bench_appends_rows() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("bench.txt");
        let out_arg = out.to_str().unwrap();

        for _ in 0..2 {
            run(&["bench", "4", "--workers", "2", "--iters", "2", "--out", out_arg]).unwrap();
        }

        let text = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("# FWHT benchmark"));
        assert!(lines[2].starts_with("4 | 16 | 2 |"));
        assert!(lines[3].starts_with("4 | 16 | 2 |"));
    }

    #[test]
    fn test_compare_all_modes() {
        for mode in ["const", "seq", "rand"] {
            run(&["compare", "3", "--workers", "2", "--iters", "2", "--mode", mode]).unwrap();
        }
        run(&["compare", "2", "--iters", "1", "--curve", "grumpkin"]).unwrap();
    }

    #[test]
    fn test_msm_const_mode() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("msm.txt");

        run(&["msm", "4", "--mode", "const", "--iters", "3", "--out", out.to_str().unwrap()])
            .unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        assert!(text.starts_with("# MSM benchmark (mode=Const"));
        assert!(text.lines().last().unwrap().starts_with("4 | 16 | 3 |"));
        // Const mode never touches the fixture tree.
        assert!(!dir.path().join("data").exists());
    }

    #[test]
    fn test_msm_rand_mode_caches_fixtures() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().to_str().unwrap();

        run(&["msm", "3", "--workers", "2", "--iters", "2", "--cache-dir", cache_dir]).unwrap();
        assert!(dir.path().join("data/scalars/exp_3_scalar.json").is_file());
        assert!(dir.path().join("data/points/exp_3_point.json").is_file());

        // Second run reads the fixtures back and still checks out.
        run(&["msm", "3", "--iters", "1", "--cache-dir", cache_dir]).unwrap();
        run(&["msm", "3", "--skip-naive", "--cache-dir", cache_dir]).unwrap();
    }
}
