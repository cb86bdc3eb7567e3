//! Append-only sink for queries that resolved to nothing.
//!
//! An injected collaborator rather than process-global state: the cascade,
//! batch resolver and reverse resolver all write through the same trait, and
//! tests substitute the in-memory implementation. Appends are line-atomic;
//! no cross-request ordering is guaranteed or needed.

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
    sync::Mutex,
};

use crate::error::Result;

/// Capability to record one unmatched query per line.
pub trait NotFoundSink: Send + Sync {
    fn append(&self, query: &str) -> Result<()>;
}

/// File-backed sink. The mutex keeps concurrent appends from interleaving
/// mid-record; each append is flushed as one line.
pub struct FileNotFoundLog {
    writer: Mutex<BufWriter<File>>,
}

impl FileNotFoundLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl NotFoundSink for FileNotFoundLog {
    fn append(&self, query: &str) -> Result<()> {
        let mut writer = self.writer.lock().expect("not-found log lock poisoned");
        writeln!(writer, "{query}")?;
        writer.flush()?;
        Ok(())
    }
}

/// In-memory sink for tests and embedders that want to inspect misses.
#[derive(Debug, Default)]
pub struct MemoryNotFoundLog {
    entries: Mutex<Vec<String>>,
}

impl MemoryNotFoundLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().expect("not-found log lock poisoned").clone()
    }
}

impl NotFoundSink for MemoryNotFoundLog {
    fn append(&self, query: &str) -> Result<()> {
        self.entries
            .lock()
            .expect("not-found log lock poisoned")
            .push(query.to_string());
        Ok(())
    }
}
