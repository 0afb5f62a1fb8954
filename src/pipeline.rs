use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::merger::Merger;
use crate::stats::{MergedResult, RunSummary};
use crate::utils::format_number;
use crate::{coordinator, output, planner, serializer};

/// Plans, scans and merges `input` without writing anything.
pub fn aggregate(input: &Path, config: &PipelineConfig) -> Result<(MergedResult, RunSummary)> {
    let total_start_time = Instant::now();
    config.validate()?;
    info!(
        action = "start",
        component = "pipeline",
        input = ?input,
        worker_count = config.workers,
        "Starting hit aggregation"
    );

    let ranges = planner::plan_file(input, config.workers)?;
    let published = coordinator::run_workers(input, &ranges, config)?;

    let merge_start_time = Instant::now();
    let mut merger = Merger::default();
    for unit in published {
        merger.fold(unit.into_aggregate()?);
    }

    let chunk_count = merger.chunks();
    let lines_read = merger.lines_read();
    let lines_skipped = merger.lines_skipped();
    let result = merger.finish();

    let summary = RunSummary {
        chunk_count,
        lines_read,
        lines_skipped,
        unique_urls: result.urls.len(),
        url_date_pairs: result.pair_count(),
        total_hits: result.total_hits(),
        elapsed: total_start_time.elapsed(),
    };

    info!(
        action = "complete",
        component = "merger",
        unique_urls = summary.unique_urls,
        url_date_pairs = summary.url_date_pairs,
        lines_read,
        lines_skipped,
        duration_ms = merge_start_time.elapsed().as_millis(),
        "Chunk results merged"
    );

    if result.is_empty() && lines_read > 0 {
        warn!(
            action = "complete",
            component = "merger",
            lines_read,
            lines_skipped,
            "No line matched the log layout"
        );
    }

    Ok((result, summary))
}

/// Runs the whole pipeline and writes the JSON result to `output_path`.
///
/// Nothing is written unless every chunk was scanned and merged.
pub fn run(input: &Path, output_path: &Path, config: &PipelineConfig) -> Result<RunSummary> {
    let total_start_time = Instant::now();
    let (result, mut summary) = aggregate(input, config)?;
    let rendered = serializer::serialize(&result)?;
    drop(result);
    output::write_atomic(output_path, &rendered)?;

    summary.elapsed = total_start_time.elapsed();
    info!(
        action = "complete",
        component = "pipeline",
        output = ?output_path,
        duration_ms = summary.elapsed.as_millis(),
        "Hit aggregation completed successfully"
    );
    Ok(summary)
}

pub fn print_summary(summary: &RunSummary) {
    println!("\n--- Hit Aggregation Summary ---");
    println!("Chunks scanned: {}", summary.chunk_count);
    println!("Lines read: {}", format_number(summary.lines_read));
    println!("Lines skipped (malformed): {}", format_number(summary.lines_skipped));
    println!("Unique URLs: {}", format_number(summary.unique_urls as u64));
    println!("URL/date pairs: {}", format_number(summary.url_date_pairs as u64));
    println!("Hits counted: {}", format_number(summary.total_hits));
    println!("Elapsed: {:.1}ms", summary.elapsed.as_secs_f64() * 1000.0);
}
