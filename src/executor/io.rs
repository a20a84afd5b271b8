use super::{ExecutionContext, Executor};
use crate::core::{DbError, Result};
use crate::parser::Command;
use crate::result::QueryResult;
use crate::storage::{Table, TableSnapshot};

use async_trait::async_trait;
use log::{info, warn};

/// `LOAD TABLE` (JSON snapshot) and `LOAD CSV`.
pub struct LoadExecutor;

#[async_trait]
impl Executor for LoadExecutor {
    fn name(&self) -> &'static str {
        "LOAD"
    }

    fn can_handle(&self, cmd: &Command) -> bool {
        matches!(cmd, Command::LoadTable { .. } | Command::LoadCsv { .. })
    }

    async fn execute(&self, cmd: &Command, ctx: &ExecutionContext<'_>) -> Result<QueryResult> {
        let table = match cmd {
            Command::LoadTable { name } => self.load_snapshot(name, ctx)?,
            Command::LoadCsv { name } => ctx.persistence.import_rows(name)?.into_table(None)?,
            _ => unreachable!(),
        };

        let name = table.name().to_string();
        let rows = table.row_count();
        install(table, ctx).await?;

        Ok(QueryResult::affected(
            rows,
            format!("Table {} loaded ({} rows).", name, rows),
        ))
    }
}

impl LoadExecutor {
    fn load_snapshot(&self, name: &str, ctx: &ExecutionContext<'_>) -> Result<Table> {
        let snapshot = ctx.persistence.load_snapshot(name)?;

        let fallback = match ctx.persistence.load_counter(name) {
            Ok(counter) => counter,
            Err(e) => {
                warn!("ignoring unreadable key sequence of '{}': {}", name, e);
                None
            }
        };
        if let Ok(Some(true)) = ctx.persistence.load_lock_marker(name) {
            info!("'{}' was saved while its guard was held", name);
        }

        snapshot.into_table(fallback)
    }
}

/// Registers `table`, or swaps it into the existing registration of the
/// same name under that table's guard.
pub(crate) async fn install(table: Table, ctx: &ExecutionContext<'_>) -> Result<()> {
    let name = table.name().to_string();
    let table = match ctx.registry.lookup(&name)? {
        Some(handle) => {
            *handle.lock().await = table;
            return Ok(());
        }
        None => table,
    };

    let replacement = table.clone();
    match ctx.registry.register(table) {
        Ok(_) => Ok(()),
        Err(DbError::TableExists(_)) => {
            *ctx.registry.get(&name)?.lock().await = replacement;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// `SAVE TABLE`: CSV export of the current rows.
pub struct SaveExecutor;

#[async_trait]
impl Executor for SaveExecutor {
    fn name(&self) -> &'static str {
        "SAVE"
    }

    fn can_handle(&self, cmd: &Command) -> bool {
        matches!(cmd, Command::SaveTable { .. })
    }

    async fn execute(&self, cmd: &Command, ctx: &ExecutionContext<'_>) -> Result<QueryResult> {
        let Command::SaveTable { name } = cmd else {
            unreachable!();
        };

        let handle = ctx.registry.get(name)?;
        let table = handle.lock().await;
        let location = ctx.persistence.export_rows(&TableSnapshot::from(&*table))?;

        Ok(QueryResult::affected(
            table.row_count(),
            format!("Table saved to {}", location),
        ))
    }
}
