pub mod context;
pub mod ddl;
pub mod delete;
pub mod dml;
#[allow(clippy::module_inception)]
pub mod executor;
pub mod io;
pub mod query;

pub use context::ExecutionContext;
pub use executor::{Executor, ExecutorPipeline};
