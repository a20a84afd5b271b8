use super::{ExecutionContext, Executor};
use crate::core::Result;
use crate::parser::Command;
use crate::result::QueryResult;

use async_trait::async_trait;
use log::debug;

pub struct InsertExecutor;

#[async_trait]
impl Executor for InsertExecutor {
    fn name(&self) -> &'static str {
        "INSERT"
    }

    fn can_handle(&self, cmd: &Command) -> bool {
        matches!(cmd, Command::Insert { .. })
    }

    async fn execute(&self, cmd: &Command, ctx: &ExecutionContext<'_>) -> Result<QueryResult> {
        let Command::Insert { table, values } = cmd else {
            unreachable!();
        };

        self.execute_insert(table, values, ctx).await
    }
}

impl InsertExecutor {
    async fn execute_insert(
        &self,
        table_name: &str,
        values: &[String],
        ctx: &ExecutionContext<'_>,
    ) -> Result<QueryResult> {
        let handle = ctx.registry.get(table_name)?;
        let mut table = handle.lock().await;

        let undo = table.undo_insert();
        let index = table.insert(values.to_vec())?;

        if let Err(e) = ctx.persist(&table) {
            table.rollback(undo);
            return Err(e);
        }

        let key = table.rows()[index][0].clone();
        debug!("row {} inserted into '{}'", key, table_name);
        Ok(QueryResult::affected(
            1,
            format!("Row inserted into {} with {} = {}.", table_name, table.schema().primary_key(), key),
        ))
    }
}
