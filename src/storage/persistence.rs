//! Snapshot and CSV persistence for individual tables.

use super::csv;
use super::table::Table;
use crate::core::{DbError, Result, Row, TableSchema};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

// ============================================================================
// Table Snapshot
// ============================================================================

/// Serialized form of one table: `{name, columns, rows, primary_key}`,
/// plus the key sequence when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub primary_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk_sequence: Option<usize>,
}

impl From<&Table> for TableSnapshot {
    fn from(table: &Table) -> Self {
        Self {
            name: table.name().to_string(),
            columns: table.schema().columns().to_vec(),
            rows: table.rows().to_vec(),
            primary_key: table.schema().primary_key().to_string(),
            pk_sequence: Some(table.pk_sequence()),
        }
    }
}

impl TableSnapshot {
    /// Rebuilds a table, checking the schema and row invariants.
    /// `fallback_sequence` is used when the snapshot carries none.
    pub fn into_table(self, fallback_sequence: Option<usize>) -> Result<Table> {
        let schema = TableSchema::from_columns(self.name.clone(), self.columns, self.primary_key)
            .map_err(|e| DbError::CorruptSnapshot(self.name.clone(), e.to_string()))?;
        Table::from_parts(schema, self.rows, self.pk_sequence.or(fallback_sequence))
    }

    /// Builds a snapshot from CSV text. The first record is the header and
    /// its first column the primary key; keys are renumbered from 0.
    pub fn from_csv(name: &str, text: &str) -> Result<Self> {
        let corrupt = |msg: String| DbError::CorruptSnapshot(name.to_string(), msg);

        let mut records = csv::decode(text).map_err(|e| corrupt(e.to_string()))?.into_iter();
        let columns = records
            .next()
            .ok_or_else(|| corrupt("CSV file has no header".into()))?;
        let primary_key = columns
            .first()
            .cloned()
            .ok_or_else(|| corrupt("CSV header is empty".into()))?;

        let mut rows = Vec::new();
        for (idx, mut record) in records.enumerate() {
            if record.len() != columns.len() {
                return Err(corrupt(format!(
                    "CSV line {} has {} fields, expected {}",
                    idx + 2,
                    record.len(),
                    columns.len()
                )));
            }
            record[0] = idx.to_string();
            rows.push(record);
        }

        Ok(Self {
            name: name.to_string(),
            pk_sequence: Some(rows.len()),
            columns,
            rows,
            primary_key,
        })
    }

    pub fn to_csv(&self) -> String {
        csv::encode(&self.columns, &self.rows)
    }
}

// ============================================================================
// Persistence Collaborator
// ============================================================================

/// Storage used by the executor after every mutation and by LOAD/SAVE.
pub trait Persistence: Send + Sync {
    fn save_snapshot(&self, snapshot: &TableSnapshot) -> Result<()>;

    /// Fails with `FileNotFound` when no snapshot exists for `name`.
    fn load_snapshot(&self, name: &str) -> Result<TableSnapshot>;

    fn snapshot_exists(&self, name: &str) -> bool;

    /// Writes the CSV export and returns where it went.
    fn export_rows(&self, snapshot: &TableSnapshot) -> Result<String>;

    /// Fails with `FileNotFound` when no CSV exists for `name`.
    fn import_rows(&self, name: &str) -> Result<TableSnapshot>;

    fn save_counter(&self, _name: &str, _value: usize) -> Result<()> {
        Ok(())
    }

    fn load_counter(&self, _name: &str) -> Result<Option<usize>> {
        Ok(None)
    }

    /// Records whether the table guard was held at save time. Advisory only.
    fn save_lock_marker(&self, _name: &str, _locked: bool) -> Result<()> {
        Ok(())
    }

    fn load_lock_marker(&self, _name: &str) -> Result<Option<bool>> {
        Ok(None)
    }
}

// ============================================================================
// File Store
// ============================================================================

/// Keeps `<name>.json`, `<name>.csv`, `<name>_pk_sequence` and `<name>_lock`
/// in one directory. Files are replaced atomically.
pub struct FileStore {
    dir: PathBuf,
    indent: usize,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            indent: 4,
        }
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    fn path_for(&self, name: &str, suffix: &str) -> Result<PathBuf> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(DbError::ParseError(format!(
                "'{}' cannot be used as a file name",
                name
            )));
        }
        Ok(self.dir.join(format!("{}{}", name, suffix)))
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut temp = NamedTempFile::new_in(&self.dir)?;
        temp.write_all(bytes)?;
        temp.flush()?;
        temp.persist(path)
            .map_err(|e| DbError::IoError(format!("Failed to replace {}: {}", path.display(), e.error)))?;
        Ok(())
    }

    fn read_existing(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(DbError::FileNotFound(path.display().to_string()));
        }
        Ok(fs::read_to_string(path)?)
    }
}

impl Persistence for FileStore {
    fn save_snapshot(&self, snapshot: &TableSnapshot) -> Result<()> {
        let path = self.path_for(&snapshot.name, ".json")?;

        let indent = vec![b' '; self.indent];
        let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        snapshot
            .serialize(&mut serializer)
            .map_err(|e| DbError::IoError(format!("Failed to serialize '{}': {}", snapshot.name, e)))?;
        buf.push(b'\n');

        self.write_atomic(&path, &buf)?;
        debug!("snapshot of '{}' written to {}", snapshot.name, path.display());
        Ok(())
    }

    fn load_snapshot(&self, name: &str) -> Result<TableSnapshot> {
        let path = self.path_for(name, ".json")?;
        let text = self.read_existing(&path)?;
        let snapshot: TableSnapshot = serde_json::from_str(&text)
            .map_err(|e| DbError::CorruptSnapshot(name.to_string(), e.to_string()))?;
        if snapshot.name != name {
            return Err(DbError::CorruptSnapshot(
                name.to_string(),
                format!("file holds table '{}'", snapshot.name),
            ));
        }
        info!("loaded '{}' ({} rows) from {}", name, snapshot.rows.len(), path.display());
        Ok(snapshot)
    }

    fn snapshot_exists(&self, name: &str) -> bool {
        self.path_for(name, ".json").is_ok_and(|p| p.exists())
    }

    fn export_rows(&self, snapshot: &TableSnapshot) -> Result<String> {
        let path = self.path_for(&snapshot.name, ".csv")?;
        self.write_atomic(&path, snapshot.to_csv().as_bytes())?;
        info!("table '{}' exported to {}", snapshot.name, path.display());
        Ok(path.display().to_string())
    }

    fn import_rows(&self, name: &str) -> Result<TableSnapshot> {
        let path = self.path_for(name, ".csv")?;
        let text = self.read_existing(&path)?;
        let snapshot = TableSnapshot::from_csv(name, &text)?;
        info!("imported '{}' ({} rows) from {}", name, snapshot.rows.len(), path.display());
        Ok(snapshot)
    }

    fn save_counter(&self, name: &str, value: usize) -> Result<()> {
        let path = self.path_for(name, "_pk_sequence")?;
        self.write_atomic(&path, value.to_string().as_bytes())
    }

    fn load_counter(&self, name: &str) -> Result<Option<usize>> {
        let path = self.path_for(name, "_pk_sequence")?;
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        text.trim()
            .parse()
            .map(Some)
            .map_err(|_| DbError::CorruptSnapshot(name.to_string(), format!("bad key sequence '{}'", text.trim())))
    }

    fn save_lock_marker(&self, name: &str, locked: bool) -> Result<()> {
        let path = self.path_for(name, "_lock")?;
        self.write_atomic(&path, if locked { b"1" } else { b"0" })
    }

    fn load_lock_marker(&self, name: &str) -> Result<Option<bool>> {
        let path = self.path_for(name, "_lock")?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?.trim() == "1"))
    }
}

// ============================================================================
// Memory Store
// ============================================================================

/// Keeps everything in process memory. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    snapshots: Mutex<HashMap<String, TableSnapshot>>,
    exports: Mutex<HashMap<String, String>>,
    counters: Mutex<HashMap<String, usize>>,
    markers: Mutex<HashMap<String, bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages CSV text for a later `LOAD CSV`.
    pub fn put_csv(&self, name: &str, text: &str) -> Result<()> {
        self.exports.lock()?.insert(name.to_string(), text.to_string());
        Ok(())
    }

    /// The last CSV exported for `name`.
    pub fn csv(&self, name: &str) -> Option<String> {
        self.exports.lock().ok()?.get(name).cloned()
    }

    pub fn snapshot(&self, name: &str) -> Option<TableSnapshot> {
        self.snapshots.lock().ok()?.get(name).cloned()
    }
}

impl Persistence for MemoryStore {
    fn save_snapshot(&self, snapshot: &TableSnapshot) -> Result<()> {
        self.snapshots
            .lock()?
            .insert(snapshot.name.clone(), snapshot.clone());
        Ok(())
    }

    fn load_snapshot(&self, name: &str) -> Result<TableSnapshot> {
        self.snapshots
            .lock()?
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::FileNotFound(format!("{}.json", name)))
    }

    fn snapshot_exists(&self, name: &str) -> bool {
        self.snapshots
            .lock()
            .map(|s| s.contains_key(name))
            .unwrap_or(false)
    }

    fn export_rows(&self, snapshot: &TableSnapshot) -> Result<String> {
        self.exports
            .lock()?
            .insert(snapshot.name.clone(), snapshot.to_csv());
        Ok(format!("memory:{}.csv", snapshot.name))
    }

    fn import_rows(&self, name: &str) -> Result<TableSnapshot> {
        let text = self
            .exports
            .lock()?
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::FileNotFound(format!("{}.csv", name)))?;
        TableSnapshot::from_csv(name, &text)
    }

    fn save_counter(&self, name: &str, value: usize) -> Result<()> {
        self.counters.lock()?.insert(name.to_string(), value);
        Ok(())
    }

    fn load_counter(&self, name: &str) -> Result<Option<usize>> {
        Ok(self.counters.lock()?.get(name).copied())
    }

    fn save_lock_marker(&self, name: &str, locked: bool) -> Result<()> {
        self.markers.lock()?.insert(name.to_string(), locked);
        Ok(())
    }

    fn load_lock_marker(&self, name: &str) -> Result<Option<bool>> {
        Ok(self.markers.lock()?.get(name).copied())
    }
}
