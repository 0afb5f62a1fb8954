use hitmap::planner::{self, ByteRange};
use hitmap::{
    aggregate, run, scanner, FixedOffsetExtractor, MergedResult, PipelineConfig, PipelineError,
    Transfer,
};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const PREFIX: &str = "https://stitcher.io";

fn log_line(url: &str, date: &str) -> String {
    format!("{}{},{}T12:34:56+00:00\n", PREFIX, url, date)
}

fn write_input(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("visits.csv");
    std::fs::write(&path, contents).unwrap();
    path
}

fn hits(result: &MergedResult, url: &str, date: &str) -> Option<u64> {
    result.urls.get(url)?.get(date).copied()
}

fn config(workers: usize) -> PipelineConfig {
    PipelineConfig::default().with_workers(workers)
}

fn run_to_string(input: &Path, dir: &TempDir, config: &PipelineConfig) -> String {
    let output = dir.path().join("out.json");
    run(input, &output, config).unwrap();
    std::fs::read_to_string(output).unwrap()
}

fn sample_log() -> String {
    let urls = ["/blog/php-enums", "/blog/new-in-php-84", "/", "/blog/tabs-are-better"];
    let mut log = String::new();
    for i in 0..400 {
        let url = urls[(i * 7) % urls.len()];
        let date = format!("2024-{:02}-{:02}", 1 + (i * 5) % 12, 1 + (i * 11) % 28);
        log.push_str(&log_line(url, &date));
    }
    log
}

#[test]
fn test_end_to_end_example() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "https://stitcher.io/a,2024-01-01,x\nhttps://stitcher.io/a,2024-01-01,y\nhttps://stitcher.io/b,2024-01-02,z\n",
    );

    let text = run_to_string(&input, &dir, &config(2));
    assert_eq!(
        text,
        "{\n    \"\\/a\": {\n        \"2024-01-01\": 2\n    },\n    \"\\/b\": {\n        \"2024-01-02\": 1\n    }\n}"
    );
}

#[test]
fn test_every_line_counted_once_for_any_worker_count() {
    let dir = TempDir::new().unwrap();
    let log = sample_log();
    let input = write_input(&dir, &log);
    let expected_lines = log.lines().count() as u64;

    let (baseline, _) = aggregate(&input, &config(1)).unwrap();
    for workers in 1..=12 {
        let (result, summary) = aggregate(&input, &config(workers)).unwrap();
        assert_eq!(summary.lines_read, expected_lines, "workers = {}", workers);
        assert_eq!(summary.lines_skipped, 0);
        assert_eq!(result.total_hits(), expected_lines);
        assert_eq!(summary.total_hits, expected_lines);
        assert_eq!(result, baseline, "workers = {}", workers);
    }
}

#[test]
fn test_per_chunk_line_counts_add_up() {
    let dir = TempDir::new().unwrap();
    let log = sample_log();
    let input = write_input(&dir, &log);
    let extractor = FixedOffsetExtractor::default();

    for workers in [2, 3, 5, 8] {
        let ranges = planner::plan_file(&input, workers).unwrap();
        let total: u64 = ranges
            .iter()
            .map(|range| scanner::scan_range(&input, *range, &extractor).unwrap().lines_read)
            .sum();
        assert_eq!(total, log.lines().count() as u64);
    }
}

#[test]
fn test_record_straddling_split_point_counted_once() {
    let dir = TempDir::new().unwrap();
    let short = log_line("/x", "2024-01-01");
    let long = log_line("/a-much-longer-url-that-crosses-the-middle", "2024-01-02");
    let contents = format!("{}{}{}", short, long, short);
    let input = write_input(&dir, &contents);

    let midpoint = contents.len() / 2;
    assert!(midpoint > short.len() && midpoint < short.len() + long.len());

    let ranges = planner::plan_file(&input, 2).unwrap();
    assert_eq!(
        ranges,
        vec![
            ByteRange::new(0, (short.len() + long.len()) as u64),
            ByteRange::new((short.len() + long.len()) as u64, contents.len() as u64),
        ]
    );

    let (result, summary) = aggregate(&input, &config(2)).unwrap();
    assert_eq!(summary.lines_read, 3);
    assert_eq!(
        hits(&result, "/a-much-longer-url-that-crosses-the-middle", "2024-01-02"),
        Some(1)
    );
    assert_eq!(hits(&result, "/x", "2024-01-01"), Some(2));
}

#[test]
fn test_rerun_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sample_log());

    let first = run_to_string(&input, &dir, &config(4));
    let second = run_to_string(&input, &dir, &config(4));
    assert_eq!(first, second);
}

#[test]
fn test_dates_listed_in_ascending_order() {
    let dir = TempDir::new().unwrap();
    let contents = [
        log_line("/post", "2024-03-01"),
        log_line("/post", "2023-12-31"),
        log_line("/post", "2024-01-15"),
        log_line("/post", "2024-01-02"),
    ]
    .concat();
    let input = write_input(&dir, &contents);

    let (result, _) = aggregate(&input, &config(3)).unwrap();
    let dates: Vec<&str> = result.urls["/post"].keys().map(String::as_str).collect();
    assert_eq!(dates, vec!["2023-12-31", "2024-01-02", "2024-01-15", "2024-03-01"]);
}

#[test]
fn test_escaped_urls_parse_back() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &log_line("/blog/2024/some-post", "2024-05-05"));

    let text = run_to_string(&input, &dir, &config(2));
    assert!(text.contains("\\/blog\\/2024\\/some-post"));

    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["/blog/2024/some-post"]["2024-05-05"], 1);
}

#[test]
fn test_empty_input_renders_empty_object() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "");

    let output = dir.path().join("out.json");
    let summary = run(&input, &output, &config(4)).unwrap();
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "{}");
    assert_eq!(summary.chunk_count, 0);
    assert_eq!(summary.lines_read, 0);
}

#[test]
fn test_malformed_lines_are_skipped() {
    let dir = TempDir::new().unwrap();
    let contents = format!(
        "{}short\n\n{}/no-delimiter-here\n{}/cut,2024\n{}",
        log_line("/ok", "2024-01-01"),
        PREFIX,
        PREFIX,
        log_line("/ok", "2024-01-01"),
    );
    let input = write_input(&dir, &contents);

    let (result, summary) = aggregate(&input, &config(2)).unwrap();
    assert_eq!(summary.lines_read, 6);
    assert_eq!(summary.lines_skipped, 4);
    assert_eq!(hits(&result, "/ok", "2024-01-01"), Some(2));
    assert_eq!(result.urls.len(), 1);
}

#[test]
fn test_spill_transfer_matches_in_memory() {
    let dir = TempDir::new().unwrap();
    let spill_dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sample_log());

    let in_memory = run_to_string(&input, &dir, &config(3));
    let spilled = run_to_string(
        &input,
        &dir,
        &config(3).with_transfer(Transfer::Spill(spill_dir.path().to_path_buf())),
    );

    assert_eq!(in_memory, spilled);
    assert_eq!(std::fs::read_dir(spill_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_spill_transfer_keeps_tabs_inside_dates() {
    let dir = TempDir::new().unwrap();
    let spill_dir = TempDir::new().unwrap();
    let input = write_input(&dir, "XXX/a,2024\t01-01,x\nXXX/a,2024-01-01,y\n");
    let extractor = FixedOffsetExtractor {
        prefix_len: 3,
        ..FixedOffsetExtractor::default()
    };
    let base = config(1).with_extractor(extractor);

    let (in_memory, _) = aggregate(&input, &base).unwrap();
    let (spilled, _) = aggregate(
        &input,
        &base
            .clone()
            .with_transfer(Transfer::Spill(spill_dir.path().to_path_buf())),
    )
    .unwrap();

    assert_eq!(hits(&spilled, "/a", "2024\t01-01"), Some(1));
    assert_eq!(hits(&spilled, "/a", "2024-01-01"), Some(1));
    assert_eq!(spilled.urls.len(), 1);
    assert_eq!(in_memory, spilled);
}

#[test]
fn test_unusable_layout_rejected_before_scanning() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &log_line("/a", "2024-01-01"));
    let config = config(2).with_extractor(FixedOffsetExtractor {
        date_width: 0,
        ..FixedOffsetExtractor::default()
    });

    let err = aggregate(&input, &config).unwrap_err();
    assert!(matches!(err, PipelineError::Config { .. }));
}

#[test]
fn test_missing_input_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");

    let err = run(&dir.path().join("nope.csv"), &output, &config(2)).unwrap_err();
    assert!(matches!(err, PipelineError::Split { .. }));
    assert!(!output.exists());
}

#[test]
fn test_cli_success() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &log_line("/cli", "2024-07-07"));
    let output = dir.path().join("out.json");

    let status = Command::new(env!("CARGO_BIN_EXE_hitmap"))
        .arg(&input)
        .arg(&output)
        .args(["--workers", "2"])
        .status()
        .unwrap();

    assert!(status.success());
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "{\n    \"\\/cli\": {\n        \"2024-07-07\": 1\n    }\n}"
    );
}

#[test]
fn test_cli_failure_exit_code() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");

    let status = Command::new(env!("CARGO_BIN_EXE_hitmap"))
        .arg(dir.path().join("missing.csv"))
        .arg(&output)
        .status()
        .unwrap();

    assert!(!status.success());
    assert!(!output.exists());
}
