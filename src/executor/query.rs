use super::{ExecutionContext, Executor};
use crate::core::{DbError, Result, Row};
use crate::expression::Condition;
use crate::parser::{Command, Projection};
use crate::result::QueryResult;
use crate::storage::Table;

use async_trait::async_trait;

/// A column of a cross join, located on one side of the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left(usize),
    Right(usize),
}

impl Side {
    fn pick<'r>(&self, left: &'r Row, right: &'r Row) -> &'r str {
        match *self {
            Side::Left(c) => &left[c],
            Side::Right(c) => &right[c],
        }
    }
}

pub struct QueryExecutor;

#[async_trait]
impl Executor for QueryExecutor {
    fn name(&self) -> &'static str {
        "SELECT"
    }

    fn can_handle(&self, cmd: &Command) -> bool {
        matches!(cmd, Command::Select { .. })
    }

    async fn execute(&self, cmd: &Command, ctx: &ExecutionContext<'_>) -> Result<QueryResult> {
        let Command::Select {
            projection,
            tables,
            condition,
        } = cmd
        else {
            unreachable!();
        };

        match tables.as_slice() {
            [single] => self.execute_select(single, projection, condition.as_ref(), ctx).await,
            [left, right] => {
                self.execute_cross_join(left, right, projection, condition.as_ref(), ctx)
                    .await
            }
            _ => Err(DbError::ParseError("SELECT takes one or two tables".into())),
        }
    }
}

impl QueryExecutor {
    /// Projection and filter over one table, under its guard for the whole scan.
    async fn execute_select(
        &self,
        table_name: &str,
        projection: &Projection,
        condition: Option<&Condition>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<QueryResult> {
        let handle = ctx.registry.get(table_name)?;
        let table = handle.lock().await;

        let (headers, columns) = match projection {
            Projection::All => (
                table.schema().columns().to_vec(),
                (0..table.schema().column_count()).collect::<Vec<_>>(),
            ),
            Projection::Columns(names) => {
                let columns = names
                    .iter()
                    .map(|name| {
                        table.resolve_column(name).ok_or_else(|| {
                            DbError::ColumnNotFound(name.clone(), table_name.to_string())
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                (names.clone(), columns)
            }
        };

        let rows = table
            .scan(condition)?
            .into_iter()
            .map(|idx| table.project(idx, &columns))
            .collect();

        Ok(QueryResult::new(headers, rows))
    }

    /// Unindexed nested-loop cross join: outer loop over the first table,
    /// inner loop over the second, condition checked per pair against the
    /// side owning its column.
    ///
    /// Each side is copied under its own guard, one after the other. The two
    /// copies are not taken atomically, so a concurrent write to either table
    /// between the copies is visible on one side only.
    async fn execute_cross_join(
        &self,
        left_name: &str,
        right_name: &str,
        projection: &Projection,
        condition: Option<&Condition>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<QueryResult> {
        let left_handle = ctx.registry.get(left_name)?;
        let right_handle = ctx.registry.get(right_name)?;
        let left = left_handle.lock().await.clone();
        let right = right_handle.lock().await.clone();

        let (headers, columns) = match projection {
            Projection::All => (
                left.schema().columns().to_vec(),
                (0..left.schema().column_count()).map(Side::Left).collect::<Vec<_>>(),
            ),
            Projection::Columns(names) => {
                let columns = names
                    .iter()
                    .map(|name| locate(name, &left, &right))
                    .collect::<Result<Vec<_>>>()?;
                (names.clone(), columns)
            }
        };

        let filter = match condition {
            Some(cond) => Some((locate(&cond.column, &left, &right)?, cond)),
            None => None,
        };

        let mut rows = Vec::new();
        for l in left.rows() {
            for r in right.rows() {
                if let Some((side, cond)) = &filter
                    && !cond.matches(side.pick(l, r))
                {
                    continue;
                }
                rows.push(columns.iter().map(|c| c.pick(l, r).to_string()).collect());
            }
        }

        Ok(QueryResult::new(headers, rows))
    }
}

/// Resolves a column against the first table, then the second.
fn locate(name: &str, left: &Table, right: &Table) -> Result<Side> {
    left.resolve_column(name)
        .map(Side::Left)
        .or_else(|| right.resolve_column(name).map(Side::Right))
        .ok_or_else(|| {
            DbError::ColumnNotFound(
                name.to_string(),
                format!("{}, {}", left.name(), right.name()),
            )
        })
}
