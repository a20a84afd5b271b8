use super::{ExecutionContext, Executor};
use crate::core::{Result, TableSchema};
use crate::parser::Command;
use crate::result::QueryResult;
use crate::storage::Table;

use async_trait::async_trait;
use log::info;

pub struct CreateTableExecutor;

#[async_trait]
impl Executor for CreateTableExecutor {
    fn name(&self) -> &'static str {
        "CREATE_TABLE"
    }

    fn can_handle(&self, cmd: &Command) -> bool {
        matches!(cmd, Command::CreateTable { .. })
    }

    async fn execute(&self, cmd: &Command, ctx: &ExecutionContext<'_>) -> Result<QueryResult> {
        let Command::CreateTable {
            name,
            columns,
            primary_key,
        } = cmd
        else {
            unreachable!();
        };

        self.execute_create_table(name, columns, primary_key, ctx).await
    }
}

impl CreateTableExecutor {
    async fn execute_create_table(
        &self,
        name: &str,
        columns: &[String],
        primary_key: &str,
        ctx: &ExecutionContext<'_>,
    ) -> Result<QueryResult> {
        let schema = TableSchema::new(name, columns.to_vec(), primary_key)?;

        // A concurrent CREATE of the same name fails here, before the store is touched.
        let handle = ctx.registry.register(Table::new(schema))?;
        let table = handle.lock().await;

        if let Err(e) = ctx.persist(&table) {
            drop(table);
            ctx.registry.discard(name, &handle)?;
            return Err(e);
        }

        info!("table '{}' created with columns {:?}", name, table.schema().columns());
        Ok(QueryResult::message(format!("Table {} created successfully.", name)))
    }
}
