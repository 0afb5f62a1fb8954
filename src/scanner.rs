use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use crate::extract::FieldExtractor;
use crate::planner::ByteRange;
use crate::stats::ChunkAggregate;

pub const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Counts every line in `range` of the file at `path`.
///
/// Opens its own handle so several scans of the same file can run at once.
pub fn scan_range(
    path: &Path,
    range: ByteRange,
    extractor: &dyn FieldExtractor,
) -> io::Result<ChunkAggregate> {
    if range.is_empty() {
        return Ok(ChunkAggregate::default());
    }

    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(range.start))?;
    let reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    scan_lines(reader, range.len(), extractor)
}

/// Reads lines until at least `limit` bytes have been consumed.
///
/// A line that starts before `limit` is always read to its end, even if it
/// runs past it.
pub fn scan_lines<R: BufRead>(
    mut reader: R,
    limit: u64,
    extractor: &dyn FieldExtractor,
) -> io::Result<ChunkAggregate> {
    let mut chunk = ChunkAggregate::default();
    let mut consumed = 0u64;
    let mut line = Vec::with_capacity(256);

    while consumed < limit {
        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            break;
        }
        consumed += read as u64;
        chunk.lines_read += 1;

        match extractor.extract(&line) {
            Some((url, date)) => chunk.record(url, date),
            None => chunk.lines_skipped += 1,
        }
    }

    Ok(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FixedOffsetExtractor;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn extractor() -> FixedOffsetExtractor {
        FixedOffsetExtractor {
            prefix_len: 3,
            ..FixedOffsetExtractor::default()
        }
    }

    const LOG: &[u8] = b"XXX/a,2024-01-01,x\nXXX/a,2024-01-01,y\nXXX/b,2024-01-02,z\n";

    #[test]
    fn test_scan_whole_input() {
        let chunk = scan_lines(Cursor::new(LOG), LOG.len() as u64, &extractor()).unwrap();
        assert_eq!(chunk.lines_read, 3);
        assert_eq!(chunk.lines_skipped, 0);
        assert_eq!(chunk.counts["/a"]["2024-01-01"], 2);
        assert_eq!(chunk.counts["/b"]["2024-01-02"], 1);
    }

    #[test]
    fn test_line_crossing_limit_is_fully_consumed() {
        // Limit lands in the middle of the second line.
        let chunk = scan_lines(Cursor::new(LOG), 25, &extractor()).unwrap();
        assert_eq!(chunk.lines_read, 2);
        assert_eq!(chunk.counts["/a"]["2024-01-01"], 2);
        assert!(!chunk.counts.contains_key("/b"));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let input = b"XXX/a,2024-01-01\nbad\n\nXXX/c 2024-01-01\nXXX/a,2024-01-03";
        let chunk = scan_lines(Cursor::new(&input[..]), input.len() as u64, &extractor()).unwrap();
        assert_eq!(chunk.lines_read, 5);
        assert_eq!(chunk.lines_skipped, 3);
        assert_eq!(chunk.pair_count(), 2);
    }

    #[test]
    fn test_scan_range_of_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(LOG).unwrap();

        let second_line = 19;
        let chunk = scan_range(
            file.path(),
            ByteRange::new(second_line, LOG.len() as u64),
            &extractor(),
        )
        .unwrap();
        assert_eq!(chunk.lines_read, 2);
        assert_eq!(chunk.counts["/a"]["2024-01-01"], 1);
        assert_eq!(chunk.counts["/b"]["2024-01-02"], 1);
    }

    #[test]
    fn test_empty_range_produces_empty_aggregate() {
        let chunk = scan_range(
            Path::new("/definitely/not/a/real/file"),
            ByteRange::new(7, 7),
            &extractor(),
        )
        .unwrap();
        assert_eq!(chunk, ChunkAggregate::default());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = scan_range(
            Path::new("/definitely/not/a/real/file"),
            ByteRange::new(0, 10),
            &extractor(),
        );
        assert!(result.is_err());
    }
}
