//! Stream coupler: dump process stdout piped into one streaming upload
//!
//! The extractor leg drains the process's stdout into the conduit; the
//! uploader leg streams the conduit into the object store. Both legs run
//! concurrently and are joined before the run reports its byte total.
//! Either leg failing poisons the conduit, so the other leg aborts
//! instead of finalizing a truncated object.

use std::io;
use std::time::Instant;

use anyhow::{Context, Result};
use arkline_core::{conduit, fmt_bytes, SharedProgress, DEFAULT_CONDUIT_CAPACITY};
use arkline_store::{dump_key, RunStamp, Uploader};

use crate::config::DumpConfig;
use crate::dump;

/// Outcome of one streaming run.
#[derive(Debug)]
pub struct DumpSummary {
    pub key: String,
    pub bytes: u64,
    pub elapsed: std::time::Duration,
}

/// Run the streaming pipeline: spawn dump → conduit → upload → join.
pub fn run(
    config: &DumpConfig,
    uploader: &Uploader,
    progress: &SharedProgress,
) -> Result<DumpSummary> {
    let start = Instant::now();
    let stamp = RunStamp::now();
    let key = dump_key(&config.prefix, &config.target.database, &stamp);

    log::info!(
        "dumping database {} from {} -> {key}",
        config.target.database,
        config.target.hosts.join(",")
    );

    let mut child = dump::spawn(config)?;
    let mut stdout = child.stdout.take().expect("stdout is piped");

    let (mut writer, reader) = conduit(DEFAULT_CONDUIT_CAPACITY);
    let pb = progress.stage_line("dump");
    pb.set_message(format!("streaming to {key}"));

    let (produced, uploaded) = rayon::join(
        // Extractor leg: stdout → conduit, then reap the process
        move || -> Result<u64> {
            let copied = io::copy(&mut stdout, &mut writer);
            match copied {
                Ok(n) => {
                    let status = child.wait().context("waiting for dump process")?;
                    if !status.success() {
                        let msg = format!("dump process exited with {status}");
                        writer.fail(msg.clone());
                        anyhow::bail!(msg);
                    }
                    // Writer drops here: clean end-of-stream for the uploader
                    Ok(n)
                }
                Err(e) => {
                    writer.fail(format!("dump stream interrupted: {e}"));
                    // Nobody is draining the pipe anymore; reap the process
                    // so the join cannot hang on a blocked writer
                    child.kill().ok();
                    let _ = child.wait();
                    Err(anyhow::Error::new(e).context("dump stream interrupted"))
                }
            }
        },
        // Uploader leg: conduit → object store
        || uploader.put_stream(&key, reader),
    );

    pb.finish_and_clear();

    let bytes = match (produced, uploaded) {
        (Ok(produced), Ok(uploaded)) => {
            // FIFO conduit: what went in is what came out
            debug_assert_eq!(produced, uploaded);
            uploaded
        }
        (Err(e), Ok(_)) => return Err(e),
        (Ok(_), Err(e)) => {
            return Err(anyhow::Error::new(e).context("upload failed"));
        }
        (Err(extract_err), Err(upload_err)) => {
            log::error!("upload side: {upload_err}");
            return Err(extract_err.context("database dump failed"));
        }
    };

    let summary = DumpSummary {
        key,
        bytes,
        elapsed: start.elapsed(),
    };

    log::info!(
        "uploaded {} ({}) in {:.1}s",
        summary.key,
        fmt_bytes(summary.bytes),
        summary.elapsed.as_secs_f64()
    );

    Ok(summary)
}
