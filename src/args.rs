use clap::Parser;
use std::path::PathBuf;

use crate::extract::{DEFAULT_DATE_WIDTH, DEFAULT_PREFIX_LEN};

#[derive(Parser, Debug)]
#[command(
    name = "hitmap",
    about = "Count daily hits per URL in a large access log, in parallel",
    version,
    long_about = None
)]
pub struct Args {
    /// Access log to read, one `<prefix><url>,<date>...` record per line
    pub input: PathBuf,

    /// Where to write the JSON result
    pub output: PathBuf,

    /// Number of worker threads (defaults to the CPU count, at most 8)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Bytes to skip at the start of each line before the URL begins
    #[arg(long, default_value_t = DEFAULT_PREFIX_LEN, conflicts_with = "pattern")]
    pub prefix_len: usize,

    /// Width of the date field that follows the delimiter
    #[arg(long, default_value_t = DEFAULT_DATE_WIDTH, conflicts_with = "pattern")]
    pub date_width: usize,

    /// Field delimiter between URL and date
    #[arg(long, default_value_t = ',', conflicts_with = "pattern")]
    pub delimiter: char,

    /// Regex with `url` and `date` named groups, replacing the fixed layout
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Hand worker results over through temporary files in this directory
    #[arg(long)]
    pub spill_dir: Option<PathBuf>,

    /// Print line and URL totals after the run
    #[arg(short, long)]
    pub summary: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
