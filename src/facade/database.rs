use super::bootstrap::{BootstrapReport, SchemaFile, TableDefinition};
use crate::config::DbConfig;
use crate::core::{DbError, Result, TableSchema};
use crate::executor::{ExecutionContext, ExecutorPipeline};
use crate::parser::Command;
use crate::result::QueryResult;
use crate::storage::{MemoryStore, Persistence, Registry};
use std::path::Path;
use std::sync::Arc;
use tracing::{Instrument, Level, event, info_span};

/// The table store: registry of tables, persistence collaborator and the
/// executors that run commands against them.
///
/// Constructed explicitly and passed around; there is no global instance.
/// All methods take `&self`, so one `Arc<Database>` can serve several tasks.
pub struct Database {
    registry: Registry,
    persistence: Arc<dyn Persistence>,
    executor_pipeline: ExecutorPipeline,
}

impl Database {
    pub fn new(persistence: Arc<dyn Persistence>) -> Self {
        Self {
            registry: Registry::new(),
            persistence,
            executor_pipeline: ExecutorPipeline::with_default_executors(),
        }
    }

    /// Database backed by a `MemoryStore`.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Builds the store described by `config` and bootstraps the schema
    /// descriptor when one is configured.
    pub async fn open(config: &DbConfig) -> Result<Self> {
        let db = Self::new(config.build_persistence());
        if let Some(path) = &config.schema_path {
            db.bootstrap_from_path(path).await?;
        }
        Ok(db)
    }

    pub async fn bootstrap_from_path<P: AsRef<Path>>(&self, path: P) -> Result<BootstrapReport> {
        let schema = SchemaFile::from_path(path)?;
        Ok(self.bootstrap(&schema).await)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn persistence(&self) -> &Arc<dyn Persistence> {
        &self.persistence
    }

    pub fn list_tables(&self) -> Result<Vec<String>> {
        self.registry.list_tables()
    }

    /// Column names of `name`, primary key first.
    pub async fn table_columns(&self, name: &str) -> Result<Vec<String>> {
        let handle = self.registry.get(name)?;
        let table = handle.lock().await;
        Ok(table.schema().columns().to_vec())
    }

    /// Parses and runs one command line. Blank lines produce an empty result.
    pub async fn execute(&self, line: &str) -> Result<QueryResult> {
        match Command::parse(line)? {
            Some(cmd) => self.execute_command(&cmd).await,
            None => Ok(QueryResult::empty()),
        }
    }

    pub async fn execute_command(&self, cmd: &Command) -> Result<QueryResult> {
        if let Command::Exit = cmd {
            return Ok(QueryResult::message("Bye."));
        }

        let ctx = ExecutionContext::new(&self.registry, self.persistence.as_ref());
        let span = info_span!("command", kind = cmd.kind());
        let result = self
            .executor_pipeline
            .execute(cmd, &ctx)
            .instrument(span.clone())
            .await;

        span.in_scope(|| match &result {
            Ok(res) if cmd.is_mutation() => {
                event!(Level::DEBUG, affected = ?res.affected_rows(), "mutation applied")
            }
            Ok(res) => event!(Level::TRACE, rows = res.row_count(), "command completed"),
            Err(err) => event!(Level::DEBUG, error = %err, "command rejected"),
        });
        result
    }

    /// Creates every table of `schema`. A table with an existing snapshot is
    /// reloaded from it instead of being recreated empty.
    pub async fn bootstrap(&self, schema: &SchemaFile) -> BootstrapReport {
        let mut report = BootstrapReport::default();

        for def in &schema.tables {
            match self.registry.contains(&def.name) {
                Ok(false) => {}
                Ok(true) => {
                    let err = DbError::TableExists(def.name.clone());
                    event!(Level::WARN, table = %def.name, "duplicate schema table skipped");
                    report.skipped.push((def.name.clone(), err.to_string()));
                    continue;
                }
                Err(err) => {
                    event!(Level::ERROR, table = %def.name, error = %err, "registry unavailable");
                    report.skipped.push((def.name.clone(), err.to_string()));
                    continue;
                }
            }

            let resume = self.persistence.snapshot_exists(&def.name);
            let cmd = if resume {
                Command::LoadTable {
                    name: def.name.clone(),
                }
            } else {
                Command::CreateTable {
                    name: def.name.clone(),
                    columns: def.columns.clone(),
                    primary_key: def.primary_key.clone(),
                }
            };

            match self.execute_command(&cmd).await {
                Ok(_) if resume => {
                    event!(Level::INFO, table = %def.name, "table resumed from snapshot");
                    if let Some(reason) = self.schema_drift(def).await {
                        event!(Level::WARN, table = %def.name, %reason, "snapshot differs from schema");
                        report.mismatched.push((def.name.clone(), reason));
                    }
                    report.resumed.push(def.name.clone());
                }
                Ok(_) => {
                    event!(Level::INFO, table = %def.name, "table created from schema");
                    report.created.push(def.name.clone());
                }
                Err(err) => {
                    event!(Level::WARN, table = %def.name, error = %err, "schema table skipped");
                    report.skipped.push((def.name.clone(), err.to_string()));
                }
            }
        }

        report
    }

    /// Describes how a resumed table differs from its descriptor entry.
    async fn schema_drift(&self, def: &TableDefinition) -> Option<String> {
        let expected =
            TableSchema::new(def.name.clone(), def.columns.clone(), def.primary_key.clone());
        let actual = self.table_columns(&def.name).await.ok()?;
        match expected {
            Ok(schema) if schema.columns() == actual.as_slice() => None,
            Ok(schema) => Some(format!(
                "snapshot has columns {:?}, schema declares {:?}",
                actual,
                schema.columns()
            )),
            Err(e) => Some(e.to_string()),
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_line_and_exit() {
        let db = Database::in_memory();
        assert_eq!(db.execute("   ").await.unwrap(), QueryResult::empty());
        assert_eq!(db.execute("EXIT").await.unwrap().status(), Some("Bye."));
    }

    #[tokio::test]
    async fn test_unknown_command_keeps_session() {
        let db = Database::in_memory();
        assert!(matches!(db.execute("FLY AWAY").await, Err(DbError::ParseError(_))));
        db.execute("CREATE TABLE t (a) PRIMARY KEY (id)").await.unwrap();
        assert_eq!(db.list_tables().unwrap(), vec!["t"]);
        assert_eq!(db.registry().len().unwrap(), 1);
        assert!(db.persistence().snapshot_exists("t"));
    }

    #[tokio::test]
    async fn test_table_columns() {
        let db = Database::in_memory();
        db.execute("CREATE TABLE t (a, b) PRIMARY KEY (id)").await.unwrap();
        assert_eq!(db.table_columns("t").await.unwrap(), vec!["id", "a", "b"]);
        assert!(db.table_columns("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_bootstrap_reports_duplicates() {
        let db = Database::in_memory();
        let schema = SchemaFile::from_json(
            r#"{"tables": [
                {"name": "a", "columns": ["x"], "primary_key": "id"},
                {"name": "a", "columns": ["y"], "primary_key": "id"},
                {"name": "b", "columns": ["x", "x"], "primary_key": "id"}
            ]}"#,
        )
        .unwrap();
        let report = db.bootstrap(&schema).await;
        assert_eq!(report.created, vec!["a"]);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(db.table_columns("a").await.unwrap(), vec!["id", "x"]);
    }
}
