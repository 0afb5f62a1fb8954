use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::error::{PipelineError, Result};

/// Writes `bytes` to `path` through a temporary sibling file and a rename.
///
/// Either the full output appears at `path` or nothing is touched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let start_time = Instant::now();
    persist(path, bytes).map_err(|source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        action = "complete",
        component = "output_writer",
        path = ?path,
        bytes = bytes.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Output written"
    );
    Ok(())
}

fn persist(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::Builder::new()
        .prefix(".hitmap-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
