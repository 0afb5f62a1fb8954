use std::borrow::Cow;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::stats::ChunkAggregate;

/// A worker's aggregate parked on disk as JSON lines.
///
/// The first line is `[lines_read, lines_skipped]`, every following line a
/// `[url, date, count]` entry. The file is removed when the handle is dropped,
/// whether or not it was ever loaded.
#[derive(Debug)]
pub struct SpillFile {
    file: NamedTempFile,
}

impl SpillFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Reads the aggregate back and deletes the file.
    pub fn load(self) -> io::Result<ChunkAggregate> {
        let reader = BufReader::new(self.file.reopen()?);
        let mut lines = reader.lines();
        let mut chunk = ChunkAggregate::default();

        let header = lines
            .next()
            .transpose()?
            .ok_or_else(|| invalid("spill file is missing its header"))?;
        let (lines_read, lines_skipped): (u64, u64) = serde_json::from_str(&header)?;
        chunk.lines_read = lines_read;
        chunk.lines_skipped = lines_skipped;

        for line in lines {
            let (url, date, count): (String, String, u64) = serde_json::from_str(&line?)?;
            chunk.add(Cow::Owned(url), Cow::Owned(date), count);
        }

        Ok(chunk)
    }
}

pub fn spill(chunk: &ChunkAggregate, dir: &Path) -> io::Result<SpillFile> {
    let mut file = tempfile::Builder::new()
        .prefix("hitmap_")
        .suffix(".jsonl")
        .tempfile_in(dir)?;

    {
        let mut writer = BufWriter::new(file.as_file_mut());
        serde_json::to_writer(&mut writer, &(chunk.lines_read, chunk.lines_skipped))?;
        writer.write_all(b"\n")?;
        for (url, dates) in &chunk.counts {
            for (date, count) in dates {
                serde_json::to_writer(&mut writer, &(url, date, count))?;
                writer.write_all(b"\n")?;
            }
        }
        writer.flush()?;
    }

    Ok(SpillFile { file })
}

fn invalid(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}
