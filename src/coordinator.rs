use rayon::prelude::*;
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::config::{PipelineConfig, Transfer};
use crate::error::{PipelineError, Result};
use crate::extract::FieldExtractor;
use crate::planner::ByteRange;
use crate::scanner;
use crate::spool::{self, SpillFile};
use crate::stats::ChunkAggregate;

/// A finished worker's result, still in the form it was handed over in.
#[derive(Debug)]
pub enum Published {
    Memory(ChunkAggregate),
    Spilled(SpillFile),
}

impl Published {
    /// Takes the aggregate out, deleting any spill file behind it.
    pub fn into_aggregate(self) -> Result<ChunkAggregate> {
        match self {
            Published::Memory(chunk) => Ok(chunk),
            Published::Spilled(file) => file.load().map_err(PipelineError::Spool),
        }
    }
}

/// Scans every range on its own pool thread and returns the results in range order.
///
/// All units run to completion before anything is returned. If any of them
/// failed, the lowest-index failure is reported and every other result is
/// dropped, which also removes their spill files.
pub fn run_workers(
    path: &Path,
    ranges: &[ByteRange],
    config: &PipelineConfig,
) -> Result<Vec<Published>> {
    let start_time = Instant::now();
    info!(
        action = "start",
        component = "worker_coordinator",
        worker_count = config.workers,
        chunk_count = ranges.len(),
        "Starting chunk workers"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|index| format!("hitmap-worker-{}", index))
        .build()?;

    let extractor = config.extractor.as_ref();
    let transfer = &config.transfer;
    let outcomes: Vec<Result<Published>> = pool.install(|| {
        ranges
            .par_iter()
            .enumerate()
            .map(|(index, range)| run_unit(index, path, *range, extractor, transfer))
            .collect()
    });

    let published = outcomes.into_iter().collect::<Result<Vec<_>>>()?;

    info!(
        action = "complete",
        component = "worker_coordinator",
        chunk_count = published.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "All chunk workers finished"
    );
    Ok(published)
}

fn run_unit(
    index: usize,
    path: &Path,
    range: ByteRange,
    extractor: &dyn FieldExtractor,
    transfer: &Transfer,
) -> Result<Published> {
    let start_time = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> io::Result<Published> {
        let chunk = scanner::scan_range(path, range, extractor)?;
        info!(
            action = "scan",
            component = "chunk_worker",
            index,
            start = range.start,
            end = range.end,
            lines_read = chunk.lines_read,
            lines_skipped = chunk.lines_skipped,
            url_date_pairs = chunk.pair_count(),
            duration_ms = start_time.elapsed().as_millis(),
            "Chunk scanned"
        );
        match transfer {
            Transfer::InMemory => Ok(Published::Memory(chunk)),
            Transfer::Spill(dir) => {
                let file = spool::spill(&chunk, dir)?;
                debug!(
                    action = "spill",
                    component = "chunk_worker",
                    index,
                    path = ?file.path(),
                    "Chunk result spilled"
                );
                Ok(Published::Spilled(file))
            }
        }
    }));

    let reason = match outcome {
        Ok(Ok(published)) => return Ok(published),
        Ok(Err(e)) => e.to_string(),
        Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
    };

    error!(
        action = "fail",
        component = "chunk_worker",
        index,
        start = range.start,
        end = range.end,
        error = %reason,
        "Chunk worker failed"
    );
    Err(PipelineError::Worker { index, reason })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
