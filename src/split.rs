//! Fixed-line-count file splitting
//!
//! Rewrites one finalized sink file into an ordered sequence of chunk
//! files of at most `max_lines` lines each. Lines stream through one at a
//! time; the source is never loaded whole into memory.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Split `source` into chunk files under `dest_dir`.
///
/// Chunk `k` is written to `dest_dir/<base>-<k>.<ext>`, preserving line
/// order: chunk 0 holds the first `max_lines` lines, chunk 1 the next,
/// and the last chunk may be short. An empty source produces no chunks.
/// Returns the chunk paths in order.
pub fn split_file(source: &Path, max_lines: usize, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    if max_lines == 0 {
        return Err(Error::split(
            source.display().to_string(),
            "max_lines must be at least 1",
        ));
    }

    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::split(source.display().to_string(), "source has no file name"))?;
    let extension = source.extension().and_then(|e| e.to_str());

    std::fs::create_dir_all(dest_dir)?;

    let reader = BufReader::new(File::open(source)?);
    let mut chunks = Vec::new();
    let mut current: Option<BufWriter<File>> = None;
    let mut lines_in_chunk = 0usize;

    for line in reader.lines() {
        let line = line?;

        if current.is_none() {
            let chunk_path = chunk_path(dest_dir, stem, chunks.len(), extension);
            debug!("Opening chunk {}", chunk_path.display());
            current = Some(BufWriter::new(File::create(&chunk_path)?));
            chunks.push(chunk_path);
            lines_in_chunk = 0;
        }

        let writer = current
            .as_mut()
            .ok_or_else(|| Error::split(source.display().to_string(), "chunk writer missing"))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        lines_in_chunk += 1;

        if lines_in_chunk == max_lines {
            if let Some(mut done) = current.take() {
                done.flush()?;
            }
        }
    }

    if let Some(mut done) = current.take() {
        done.flush()?;
    }

    debug!(
        "Split {} into {} chunk(s) of at most {max_lines} line(s)",
        source.display(),
        chunks.len()
    );
    Ok(chunks)
}

fn chunk_path(dest_dir: &Path, stem: &str, index: usize, extension: Option<&str>) -> PathBuf {
    match extension {
        Some(ext) => dest_dir.join(format!("{stem}-{index}.{ext}")),
        None => dest_dir.join(format!("{stem}-{index}")),
    }
}
