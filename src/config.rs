use crate::storage::{FileStore, MemoryStore, Persistence};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where table snapshots live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// One set of files per table in `data_dir`.
    #[default]
    File,
    /// Nothing is written to disk.
    Memory,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Directory holding `<table>.json`, `<table>.csv` and marker files
    pub data_dir: PathBuf,

    /// Schema descriptor to bootstrap tables from at open
    pub schema_path: Option<PathBuf>,

    pub storage: StorageMode,

    /// Indent width of JSON snapshots
    pub snapshot_indent: usize,
}

impl DbConfig {
    pub fn new() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            schema_path: None,
            storage: StorageMode::File,
            snapshot_indent: 4,
        }
    }

    /// In-memory configuration, mostly for tests.
    pub fn in_memory() -> Self {
        Self::new().storage(StorageMode::Memory)
    }

    /// Set the data directory
    pub fn data_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the schema descriptor path
    pub fn schema_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.schema_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn storage(mut self, storage: StorageMode) -> Self {
        self.storage = storage;
        self
    }

    pub fn snapshot_indent(mut self, indent: usize) -> Self {
        self.snapshot_indent = indent;
        self
    }

    pub fn build_persistence(&self) -> Arc<dyn Persistence> {
        match self.storage {
            StorageMode::File => {
                Arc::new(FileStore::new(&self.data_dir).with_indent(self.snapshot_indent))
            }
            StorageMode::Memory => Arc::new(MemoryStore::new()),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::new()
    }
}
