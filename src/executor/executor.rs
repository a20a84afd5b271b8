use super::ExecutionContext;
use crate::core::{DbError, Result};
use crate::parser::Command;
use crate::result::QueryResult;

use async_trait::async_trait;

#[async_trait]
pub trait Executor: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    fn can_handle(&self, cmd: &Command) -> bool;

    async fn execute(&self, cmd: &Command, ctx: &ExecutionContext<'_>) -> Result<QueryResult>;
}

pub struct ExecutorPipeline {
    executors: Vec<Box<dyn Executor>>,
}

impl ExecutorPipeline {
    pub fn new() -> Self {
        Self {
            executors: Vec::new(),
        }
    }

    /// Pipeline with an executor for every command that touches tables.
    pub fn with_default_executors() -> Self {
        use super::ddl::CreateTableExecutor;
        use super::delete::DeleteExecutor;
        use super::dml::InsertExecutor;
        use super::io::{LoadExecutor, SaveExecutor};
        use super::query::QueryExecutor;

        let mut pipeline = Self::new();
        pipeline.register(Box::new(CreateTableExecutor));
        pipeline.register(Box::new(InsertExecutor));
        pipeline.register(Box::new(DeleteExecutor));
        pipeline.register(Box::new(QueryExecutor));
        pipeline.register(Box::new(LoadExecutor));
        pipeline.register(Box::new(SaveExecutor));
        pipeline
    }

    pub fn register(&mut self, executor: Box<dyn Executor>) {
        self.executors.push(executor);
    }

    pub fn list_executors(&self) -> Vec<&'static str> {
        self.executors.iter().map(|e| e.name()).collect()
    }

    pub async fn execute(&self, cmd: &Command, ctx: &ExecutionContext<'_>) -> Result<QueryResult> {
        for executor in &self.executors {
            if executor.can_handle(cmd) {
                return executor.execute(cmd, ctx).await;
            }
        }

        Err(DbError::ParseError(format!(
            "No executor found for {}",
            cmd.kind()
        )))
    }
}

impl Default for ExecutorPipeline {
    fn default() -> Self {
        Self::with_default_executors()
    }
}
