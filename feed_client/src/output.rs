//! Persistence of the final, sorted record list.
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use feed_common::{Record, Result};

/// Destination for the records produced by a run.
pub trait RecordSink {
    /// Stores `records`, which are already sorted by sequence.
    fn write(&mut self, records: &[Record]) -> Result<()>;
}

/// Writes records as a pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    /// Creates a sink targeting `path`; the file is created on write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// File this sink writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonFileSink {
    fn write(&mut self, records: &[Record]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(&self.path)?;
        let mut w = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut w, records)?;
        w.write_all(b"\n")?;
        w.flush()?;
        Ok(())
    }
}
