use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::error::{PipelineError, Result};

/// Half-open byte range `[start, end)` of the input file handed to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        ByteRange { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits the file at `path` into `workers` line-aligned ranges.
pub fn plan_file(path: &Path, workers: usize) -> Result<Vec<ByteRange>> {
    let start_time = Instant::now();
    let split_err = |source| PipelineError::Split {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(split_err)?;
    let file_size = file.metadata().map_err(split_err)?.len();
    let ranges = plan(BufReader::new(file), file_size, workers).map_err(split_err)?;

    info!(
        action = "complete",
        component = "chunk_planner",
        file_size,
        chunk_count = ranges.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Planned chunk boundaries"
    );
    Ok(ranges)
}

/// Computes line-aligned ranges over a seekable reader of `file_size` bytes.
///
/// Each boundary except the last is found by jumping `file_size / workers`
/// bytes past the previous boundary and then consuming the rest of that line,
/// so no line is ever split between two ranges. The last range always ends at
/// `file_size`. An empty file yields no ranges at all; when there are fewer
/// lines than workers the trailing ranges come out empty.
pub fn plan<R: BufRead + Seek>(
    mut reader: R,
    file_size: u64,
    workers: usize,
) -> io::Result<Vec<ByteRange>> {
    if workers == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "worker count must be greater than zero",
        ));
    }
    if file_size == 0 {
        return Ok(Vec::new());
    }

    let chunk_size = file_size / workers as u64;
    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    let mut line = Vec::new();

    for i in 0..workers {
        if i == workers - 1 {
            ranges.push(ByteRange::new(start, file_size));
            break;
        }

        let candidate = start + chunk_size;
        let end = if candidate >= file_size {
            file_size
        } else {
            reader.seek(SeekFrom::Start(candidate))?;
            line.clear();
            let consumed = reader.read_until(b'\n', &mut line)?;
            candidate + consumed as u64
        };

        ranges.push(ByteRange::new(start, end));
        start = end;
    }

    Ok(ranges)
}
