use crate::cli::args::{Cli, MedianArg};
use anyhow::{Context, Result, bail};
use clap::Parser;
use genomedepth::core::engine::{self, RunConfig, fmt_dur};
use genomedepth::core::io::{CHUNK_SIZE, is_stdio};
use genomedepth::core::model::{FinalizeContext, MedianMode};
use genomedepth::report::{self, Staged, histogram_csv, summary_csv};
use log::{LevelFilter, debug, info, warn};
use std::env;
use std::path::Path;
use std::time::Instant;

pub fn entry() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}

fn init_logging(verbose: u8) {
    let mut builder = pretty_env_logger::formatted_builder();
    match env::var("RUST_LOG") {
        Ok(filters) if verbose == 0 => {
            builder.parse_filters(&filters);
        }
        _ => {
            builder.filter_level(match verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            });
        }
    }
    let _ = builder.try_init();
}

fn run(args: Cli) -> Result<()> {
    let t0 = Instant::now();

    let threads = stage("preflight", || {
        if args.ranges == 0 {
            bail!("--ranges must be >= 1");
        }
        if args.threads == 0 {
            bail!("--threads must be >= 1");
        }
        check_distinct_sinks(&args)?;
        let cpus = num_cpus::get().max(1);
        if args.threads > cpus {
            warn!(
                "--threads {} exceeds the {} available CPUs; using {}",
                args.threads, cpus, cpus
            );
        }
        Ok(args.threads.min(cpus))
    })?;

    let median_mode = match args.median {
        MedianArg::Conventional => MedianMode::Conventional,
        MedianArg::Legacy => MedianMode::Legacy,
    };

    info!(
        "genomedepth {}: sequencing depth and gap statistics",
        env!("CARGO_PKG_VERSION")
    );
    info!("input file: {}", describe(&args.input, "stdin"));
    info!("output file: {}", describe(&args.output, "stdout"));
    info!(
        "depth histogram: {}",
        args.depth_histogram
            .as_deref()
            .map_or("disabled".to_string(), |p| describe(p, "stdout"))
    );
    info!(
        "gap histogram: {}",
        args.gap_histogram
            .as_deref()
            .map_or("disabled".to_string(), |p| describe(p, "stdout"))
    );
    info!(
        "histogram ranges: {}, median: {}, threads: {}",
        args.ranges,
        median_mode.as_str(),
        threads
    );

    let config = RunConfig {
        input: args.input.clone(),
        thresholds: args.breadth.clone(),
        threads,
        chunk_size: CHUNK_SIZE,
        finalize: FinalizeContext {
            median_mode,
            nbins: args.ranges,
            depth_histogram: args.depth_histogram.is_some(),
            gap_histogram: args.gap_histogram.is_some(),
        },
    };

    let t_engine = Instant::now();
    let output = engine::run(config)
        .with_context(|| format!("failed to process {}", describe(&args.input, "stdin")))?;
    stage_done("engine", t_engine);
    debug!(
        "records={} chunks={} bases={} gaps={}",
        output.records,
        output.chunks,
        output.metrics.summary.genome_size,
        output.metrics.summary.num_gaps
    );
    if output.records == 0 {
        warn!("no coverage records found; statistics are reported as NA");
    }

    // Render everything first so a failure leaves no partial output behind.
    let t_report = Instant::now();
    let mut staged: Vec<Staged> = Vec::with_capacity(3);
    let summary = &output.metrics.summary;
    staged.push(
        report::stage(&args.output, |w| summary_csv::write(w, summary))
            .with_context(|| format!("failed to write {}", args.output.display()))?,
    );
    if let (Some(path), Some(hist)) = (&args.depth_histogram, &output.metrics.depth_histogram) {
        staged.push(
            report::stage(path, |w| histogram_csv::write(w, hist))
                .with_context(|| format!("failed to write {}", path.display()))?,
        );
    }
    if let (Some(path), Some(hist)) = (&args.gap_histogram, &output.metrics.gap_histogram) {
        staged.push(
            report::stage(path, |w| histogram_csv::write(w, hist))
                .with_context(|| format!("failed to write {}", path.display()))?,
        );
    }
    for s in staged {
        s.commit()?;
    }
    stage_done("report", t_report);

    debug!("stage=total time={}", fmt_dur(t0.elapsed()));
    Ok(())
}

fn describe(path: &Path, dash: &str) -> String {
    if is_stdio(path) {
        dash.to_string()
    } else {
        path.display().to_string()
    }
}

/// Two reports staged onto one path would share a temporary file.
fn check_distinct_sinks(args: &Cli) -> Result<()> {
    let sinks = [
        ("--output", Some(&args.output)),
        ("--depth-histogram", args.depth_histogram.as_ref()),
        ("--gap-histogram", args.gap_histogram.as_ref()),
    ];
    let mut seen: Vec<(&str, &Path)> = Vec::with_capacity(sinks.len());
    for (flag, path) in sinks {
        let Some(path) = path else { continue };
        if is_stdio(path) {
            continue;
        }
        if let Some((other, _)) = seen.iter().find(|(_, p)| *p == path.as_path()) {
            bail!(
                "{} and {} both write to {}",
                other,
                flag,
                path.display()
            );
        }
        seen.push((flag, path.as_path()));
    }
    Ok(())
}

fn stage<T, F>(name: &str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let t = Instant::now();
    let res = f();
    debug!("stage={} time={}", name, fmt_dur(t.elapsed()));
    res
}

fn stage_done(name: &str, t: Instant) {
    debug!("stage={} time={}", name, fmt_dur(t.elapsed()));
}
