use crate::core::interval::Records;
use crate::core::io::{Chunk, InputSource, MmapSource};
use crate::core::metrics::{Agg, FinalMetrics};
use crate::core::model::FinalizeContext;
use anyhow::{Context, Result, anyhow, bail};
use crossbeam_channel as channel;
use log::debug;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Plain run configuration handed to the core by the command layer.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub input: PathBuf,
    pub thresholds: Vec<u32>,
    pub threads: usize,
    pub chunk_size: usize,
    pub finalize: FinalizeContext,
}

pub struct RunOutput {
    pub metrics: FinalMetrics,
    pub records: u64,
    pub chunks: u64,
}

#[derive(Clone, Debug, Default)]
struct ProducerStats {
    chunks: u64,
    bytes: u64,
    read: Duration,
    align: Duration,
}

#[derive(Clone, Debug, Default)]
struct WorkerStats {
    chunks: u64,
    bytes: u64,
    records: u64,
    aggregate: Duration,
}

pub fn run(cfg: RunConfig) -> Result<RunOutput> {
    let t_open = Instant::now();
    let (input, mmap_source) = InputSource::open(&cfg.input, cfg.chunk_size)?;
    log_stage("engine.input_open", t_open);
    run_source(input, mmap_source, &cfg)
}

/// Aggregates every chunk of `input` and finalizes the result.
pub fn run_source(
    input: InputSource,
    mmap_source: Option<Arc<MmapSource>>,
    cfg: &RunConfig,
) -> Result<RunOutput> {
    let t_total = Instant::now();
    let (agg, chunks) = if cfg.threads <= 1 {
        aggregate_sequential(input, mmap_source.as_deref(), cfg)?
    } else {
        aggregate_parallel(input, mmap_source, cfg)?
    };
    let records = agg.records;
    debug!(
        "aggregated records={} bases={} gaps={} chunks={}",
        agg.records, agg.npos, agg.ngaps, chunks
    );

    let t_finalize = Instant::now();
    let metrics = agg
        .finalize(&cfg.finalize)
        .context("failed to compute coverage statistics")?;
    log_stage("engine.finalize", t_finalize);
    log_stage("engine.total", t_total);

    Ok(RunOutput {
        metrics,
        records,
        chunks,
    })
}

fn aggregate_chunk(chunk: &Chunk, source: Option<&MmapSource>, agg: &mut Agg) -> Result<()> {
    let bytes = chunk
        .bytes(source)
        .ok_or_else(|| anyhow!("mmap source missing for chunk {}", chunk.index))?;
    for rec in Records::new(bytes, chunk.first_line) {
        agg.update_record(&rec?)?;
    }
    Ok(())
}

fn aggregate_sequential(
    mut input: InputSource,
    source: Option<&MmapSource>,
    cfg: &RunConfig,
) -> Result<(Agg, u64)> {
    let mut agg = Agg::new(&cfg.thresholds);
    let mut chunks = 0u64;
    let t_agg = Instant::now();
    while let Some(chunk) = input.next_chunk()? {
        aggregate_chunk(&chunk, source, &mut agg)?;
        chunks += 1;
    }
    log_stage("engine.aggregate", t_agg);
    Ok((agg, chunks))
}

/// Outcome of one chunk, or the producer's final chunk count.
enum Part {
    Chunk { index: usize, agg: Result<Agg> },
    Total(usize),
}

fn aggregate_parallel(
    mut input: InputSource,
    mmap_source: Option<Arc<MmapSource>>,
    cfg: &RunConfig,
) -> Result<(Agg, u64)> {
    let (chunk_tx, chunk_rx) = channel::bounded::<Chunk>(cfg.threads * 2);
    let (part_tx, part_rx) = channel::unbounded::<Part>();
    let (prod_stats_tx, prod_stats_rx) = channel::bounded::<ProducerStats>(1);
    let (worker_stats_tx, worker_stats_rx) = channel::unbounded::<WorkerStats>();
    // Lowest chunk index known to have failed. Chunks past it are not needed.
    let failed_at = Arc::new(AtomicUsize::new(usize::MAX));

    let producer_tx = part_tx.clone();
    let producer_failed = Arc::clone(&failed_at);
    let producer = thread::spawn(move || {
        let mut count = 0usize;
        let mut stats = ProducerStats::default();
        let mut failure = None;
        while producer_failed.load(Ordering::Relaxed) == usize::MAX {
            match input.next_chunk() {
                Ok(Some(chunk)) => {
                    stats.chunks += 1;
                    stats.bytes += chunk.timing.bytes as u64;
                    stats.read += chunk.timing.read;
                    stats.align += chunk.timing.align;
                    if chunk_tx.send(chunk).is_err() {
                        break;
                    }
                    count += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        let _ = prod_stats_tx.send(stats);
        // A read failure takes the place of the chunk that could not be read.
        let last = match failure {
            Some(e) => {
                producer_failed.fetch_min(count, Ordering::Relaxed);
                Part::Chunk {
                    index: count,
                    agg: Err(e),
                }
            }
            None => Part::Total(count),
        };
        let _ = producer_tx.send(last);
    });

    let mut workers = Vec::with_capacity(cfg.threads);
    for _ in 0..cfg.threads {
        let rx = chunk_rx.clone();
        let tx = part_tx.clone();
        let failed = Arc::clone(&failed_at);
        let worker_source = mmap_source.as_ref().map(Arc::clone);
        let thresholds = cfg.thresholds.clone();
        let stats_tx = worker_stats_tx.clone();
        workers.push(thread::spawn(move || {
            let mut wstats = WorkerStats::default();
            for chunk in rx.iter() {
                if chunk.index > failed.load(Ordering::Relaxed) {
                    continue;
                }
                let t0 = Instant::now();
                let mut agg = Agg::new(&thresholds);
                let outcome = match aggregate_chunk(&chunk, worker_source.as_deref(), &mut agg) {
                    Ok(()) => {
                        wstats.aggregate += t0.elapsed();
                        wstats.chunks += 1;
                        wstats.bytes += chunk.timing.bytes as u64;
                        wstats.records += agg.records;
                        Ok(agg)
                    }
                    Err(e) => {
                        failed.fetch_min(chunk.index, Ordering::Relaxed);
                        Err(e)
                    }
                };
                let part = Part::Chunk {
                    index: chunk.index,
                    agg: outcome,
                };
                if tx.send(part).is_err() {
                    break;
                }
            }
            let _ = stats_tx.send(wstats);
        }));
    }
    drop(chunk_rx);
    drop(part_tx);
    drop(worker_stats_tx);

    let t_collect = Instant::now();
    let collected = merge_in_order(&part_rx, &cfg.thresholds);
    if collected.is_err() {
        // Stop the producer and let workers drain without aggregating.
        failed_at.store(0, Ordering::Relaxed);
    }
    drop(part_rx);
    let _ = producer.join();
    for worker in workers {
        let _ = worker.join();
    }
    let (agg, chunks) = collected?;
    log_stage("engine.collect", t_collect);

    if let Ok(prod) = prod_stats_rx.try_recv() {
        debug!(
            "producer chunks={} bytes={} read={} align={}",
            prod.chunks,
            prod.bytes,
            fmt_dur(prod.read),
            fmt_dur(prod.align)
        );
    }
    let mut worker_stats = WorkerStats::default();
    for ws in worker_stats_rx.iter() {
        worker_stats.chunks += ws.chunks;
        worker_stats.bytes += ws.bytes;
        worker_stats.records += ws.records;
        worker_stats.aggregate += ws.aggregate;
    }
    debug!(
        "workers={} chunks={} bytes={} records={} aggregate={}",
        cfg.threads,
        worker_stats.chunks,
        worker_stats.bytes,
        worker_stats.records,
        fmt_dur(worker_stats.aggregate)
    );

    Ok((agg, chunks))
}

/// Folds chunk results into one aggregate strictly in chunk order.
///
/// Parts that arrive ahead of their turn wait in `pending` and are dropped as
/// soon as they are merged. Every chunk before a failed one is merged first,
/// so the error returned is the earliest one in input order.
fn merge_in_order(part_rx: &channel::Receiver<Part>, thresholds: &[u32]) -> Result<(Agg, u64)> {
    let mut merged = Agg::new(thresholds);
    let mut pending: BTreeMap<usize, Result<Agg>> = BTreeMap::new();
    let mut next = 0usize;
    let mut total = None;
    loop {
        while let Some(part) = pending.remove(&next) {
            merged.merge(part?)?;
            next += 1;
        }
        if total == Some(next) {
            return Ok((merged, next as u64));
        }
        match part_rx.recv() {
            Ok(Part::Chunk { index, agg }) => {
                pending.insert(index, agg);
            }
            Ok(Part::Total(n)) => total = Some(n),
            Err(_) => bail!("chunk pipeline stopped before chunk {} was aggregated", next),
        }
    }
}

fn log_stage(name: &str, t: Instant) {
    debug!("stage={} time={}", name, fmt_dur(t.elapsed()));
}

pub fn fmt_dur(d: Duration) -> String {
    if d.as_secs_f64() < 1.0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.3}s", d.as_secs_f64())
    }
}
