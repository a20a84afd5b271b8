// ============================================================================
// tabstore: a small concurrent table store with a line-oriented command
// language and per-table JSON/CSV persistence.
// ============================================================================

pub mod config;
pub mod core;
pub mod executor;
pub mod expression;
pub mod facade;
pub mod parser;
pub mod result;
pub mod storage;

pub use config::{DbConfig, StorageMode};
pub use crate::core::{DbError, Result, Row, TableSchema};
pub use facade::{BootstrapReport, Database, SchemaFile, TableDefinition};
pub use parser::Command;
pub use result::QueryResult;
pub use storage::{FileStore, MemoryStore, Persistence};
