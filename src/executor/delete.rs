use super::{ExecutionContext, Executor};
use crate::core::Result;
use crate::expression::Condition;
use crate::parser::Command;
use crate::result::QueryResult;

use async_trait::async_trait;
use log::debug;

pub struct DeleteExecutor;

#[async_trait]
impl Executor for DeleteExecutor {
    fn name(&self) -> &'static str {
        "DELETE"
    }

    fn can_handle(&self, cmd: &Command) -> bool {
        matches!(cmd, Command::Delete { .. })
    }

    async fn execute(&self, cmd: &Command, ctx: &ExecutionContext<'_>) -> Result<QueryResult> {
        let Command::Delete { table, condition } = cmd else {
            unreachable!();
        };

        self.execute_delete(table, condition, ctx).await
    }
}

impl DeleteExecutor {
    async fn execute_delete(
        &self,
        table_name: &str,
        condition: &Condition,
        ctx: &ExecutionContext<'_>,
    ) -> Result<QueryResult> {
        let handle = ctx.registry.get(table_name)?;
        let mut table = handle.lock().await;

        let undo = table.undo_replace();
        let deleted = table.delete_where(condition)?;

        if let Err(e) = ctx.persist(&table) {
            table.rollback(undo);
            return Err(e);
        }

        debug!(
            "deleted {} row(s) from '{}' where {}; {} remain",
            deleted,
            table_name,
            condition,
            table.row_count()
        );
        Ok(QueryResult::affected(deleted, "Rows deleted successfully."))
    }
}
