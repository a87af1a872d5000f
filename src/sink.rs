//! Per-module buffered JSON-lines sinks
//!
//! Records route to a sink named after their module (deletion markers get
//! the `-Deleted` suffix). Writers are created lazily on first write, one
//! file per distinct name, inside an isolated scratch directory so
//! concurrently-written sinks never contend over paths. The sink is the
//! only owner of the open handles and the only entity that closes them.
//!
//! The scratch directory is temporary by design: `finalize` hands the
//! per-sink files to the splitter, and dropping the sink at the end of
//! the run removes the scratch files.

use crate::error::{Error, Result};
use crate::types::Record;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::debug;

/// A finalized sink file, ready for the splitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkFile {
    /// Sink name (module name, possibly `-Deleted` suffixed)
    pub name: String,
    /// Path of the scratch file
    pub path: PathBuf,
    /// Lines written
    pub lines: u64,
}

struct SinkWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    lines: u64,
}

/// Buffered line-oriented export sink, keyed by sink name
pub struct ExportSink {
    scratch: TempDir,
    file_type: String,
    include_module_name: bool,
    writers: HashMap<String, SinkWriter>,
    finalized: Option<Vec<SinkFile>>,
}

impl ExportSink {
    /// Create a sink with a fresh scratch directory
    pub fn new(file_type: impl Into<String>, include_module_name: bool) -> Result<Self> {
        Ok(Self {
            scratch: TempDir::new()?,
            file_type: file_type.into(),
            include_module_name,
            writers: HashMap::new(),
            finalized: None,
        })
    }

    /// Number of distinct sinks created so far
    pub fn sink_count(&self) -> usize {
        self.writers.len()
    }

    /// Lines written to a named sink, if it exists
    pub fn lines_written(&self, name: &str) -> Option<u64> {
        self.writers.get(name).map(|w| w.lines)
    }

    /// Append one record as a JSON line to its destination sink.
    ///
    /// The writer for the destination name is created on first use; two
    /// records with the same sink name always share one writer.
    pub fn write(&mut self, record: &Record) -> Result<()> {
        if self.finalized.is_some() {
            return Err(Error::sink("write after finalize"));
        }

        let name = record.sink_name();
        if !self.writers.contains_key(&name) {
            let path = self
                .scratch
                .path()
                .join(format!("{name}.{}", self.file_type));
            debug!("Opening sink file {}", path.display());
            let file = File::create(&path)?;
            self.writers.insert(
                name.clone(),
                SinkWriter {
                    writer: BufWriter::new(file),
                    path,
                    lines: 0,
                },
            );
        }

        let line = serde_json::to_string(&record.to_output(self.include_module_name))?;
        let sink = self
            .writers
            .get_mut(&name)
            .ok_or_else(|| Error::sink(format!("sink {name} vanished")))?;
        sink.writer.write_all(line.as_bytes())?;
        sink.writer.write_all(b"\n")?;
        sink.lines += 1;
        Ok(())
    }

    /// Flush and close every open writer.
    ///
    /// Closes each writer exactly once; calling again returns the same
    /// file list without touching the files.
    pub fn finalize(&mut self) -> Result<Vec<SinkFile>> {
        if let Some(files) = &self.finalized {
            return Ok(files.clone());
        }

        let mut files = Vec::with_capacity(self.writers.len());
        for (name, mut sink) in self.writers.drain() {
            sink.writer.flush()?;
            files.push(SinkFile {
                name,
                path: sink.path,
                lines: sink.lines,
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("Finalized {} sink file(s)", files.len());
        self.finalized = Some(files.clone());
        Ok(files)
    }
}

impl std::fmt::Debug for ExportSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportSink")
            .field("scratch", &self.scratch.path())
            .field("sinks", &self.writers.len())
            .field("finalized", &self.finalized.is_some())
            .finish()
    }
}
