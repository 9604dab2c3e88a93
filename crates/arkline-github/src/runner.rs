//! Dispatcher: pipelined enumeration feeding a bounded worker pool
//!
//! One producer walks the listing API and pushes units onto a bounded
//! queue; W long-lived workers pull from it until it is closed and
//! drained. The scope join is the only shutdown synchronization — no
//! worker signals another directly.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result};
use arkline_core::{fmt_bytes, is_shutdown_requested, SharedProgress, UnitQueue};
use arkline_store::{RunStamp, Uploader};

use crate::api::{RepoUnit, UnitSource};
use crate::config::Config;
use crate::worker;

/// Outcome of one fan-out run.
#[derive(Debug)]
pub struct Summary {
    pub enumerated: usize,
    pub archived: usize,
    pub failed: usize,
    pub bytes: u64,
    pub elapsed: std::time::Duration,
}

/// Run the fan-out pipeline: enumerate → queue → W workers → join.
///
/// Per-unit failures are logged with the unit identity and skipped; the
/// pool keeps going. An enumeration failure closes the queue, lets
/// queued units drain, and is returned as fatal.
pub fn run(
    config: &Config,
    source: &dyn UnitSource,
    uploader: &Uploader,
    progress: &SharedProgress,
) -> Result<Summary> {
    let start = Instant::now();
    let stamp = RunStamp::now();
    let workers = config.workers.max(1);

    log::info!(
        "archiving organization {} with {} workers (run stamp {})",
        config.org,
        workers,
        stamp.compact()
    );

    let queue: UnitQueue<RepoUnit> = UnitQueue::new(workers * 2);
    let enumerated = AtomicUsize::new(0);
    let archived = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let bytes = AtomicU64::new(0);
    let enumeration_error: Mutex<Option<anyhow::Error>> = Mutex::new(None);

    // One extra thread so the producer never competes with workers
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers + 1)
        .build()
        .context("cannot build worker pool")?;

    pool.scope(|s| {
        // Producer: push units as listing pages arrive. The bounded queue
        // throttles pagination to archival throughput.
        s.spawn(|_| {
            let mut pushed = 0usize;
            let result = source.for_each(&mut |unit| {
                if config.limit.is_some_and(|limit| pushed >= limit) {
                    return false;
                }
                if !queue.push(unit) {
                    return false;
                }
                pushed += 1;
                true
            });
            enumerated.store(pushed, Ordering::Relaxed);
            if let Err(e) = result {
                *enumeration_error.lock().expect("producer panicked") = Some(e);
            }
            queue.close();
        });

        for _ in 0..workers {
            s.spawn(|_| {
                while let Some(unit) = queue.pop() {
                    if is_shutdown_requested() {
                        // Unblock the producer too, then stop pulling
                        queue.close();
                        break;
                    }
                    let pb = progress.unit_bar(&unit.full_name);
                    match worker::archive_repo(&unit, config, &stamp, uploader, &pb) {
                        Ok((key, n)) => {
                            pb.finish_and_clear();
                            archived.fetch_add(1, Ordering::Relaxed);
                            bytes.fetch_add(n, Ordering::Relaxed);
                            log::info!("archived {} ({}) -> {key}", unit.full_name, fmt_bytes(n));
                        }
                        Err(e) => {
                            pb.finish_and_clear();
                            failed.fetch_add(1, Ordering::Relaxed);
                            log::error!("{}: {e:#}", unit.full_name);
                        }
                    }
                }
            });
        }
    });

    if let Some(e) = enumeration_error
        .into_inner()
        .expect("enumeration lock poisoned")
    {
        return Err(e.context("repository enumeration failed"));
    }

    let summary = Summary {
        enumerated: enumerated.load(Ordering::Relaxed),
        archived: archived.load(Ordering::Relaxed),
        failed: failed.load(Ordering::Relaxed),
        bytes: bytes.load(Ordering::Relaxed),
        elapsed: start.elapsed(),
    };

    log::info!("=== Archive run summary ===");
    log::info!(
        "Repositories: {}/{} archived ({} failed)",
        summary.archived,
        summary.enumerated,
        summary.failed
    );
    log::info!("Uploaded: {}", fmt_bytes(summary.bytes));
    log::info!("Time: {:.1}s", summary.elapsed.as_secs_f64());

    Ok(summary)
}
