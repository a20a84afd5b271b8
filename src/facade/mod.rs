pub mod bootstrap;
pub mod database;

pub use bootstrap::{BootstrapReport, SchemaFile, TableDefinition};
pub use database::Database;
