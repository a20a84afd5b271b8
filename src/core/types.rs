use super::{DbError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One record. Field 0 is always the primary key.
pub type Row = Vec<String>;

/// Ordered column list of a table, primary key first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    columns: Vec<String>,
    primary_key: String,
}

impl TableSchema {
    /// Builds a schema, moving `primary_key` to the front of `columns`
    /// (prepending it when absent).
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        primary_key: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let primary_key = primary_key.into().trim().to_string();

        if name.is_empty() {
            return Err(DbError::InvalidSchema("table name is empty".into()));
        }
        if primary_key.is_empty() {
            return Err(DbError::InvalidSchema(format!(
                "table '{}' has an empty primary key name",
                name
            )));
        }

        let mut ordered = Vec::with_capacity(columns.len() + 1);
        ordered.push(primary_key.clone());
        ordered.extend(
            columns
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| *c != primary_key),
        );

        let schema = Self {
            name,
            columns: ordered,
            primary_key,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Takes `columns` as stored, without reordering. Used when reading
    /// snapshots, whose rows are aligned with the stored column order.
    pub fn from_columns(
        name: impl Into<String>,
        columns: Vec<String>,
        primary_key: impl Into<String>,
    ) -> Result<Self> {
        let schema = Self {
            name: name.into(),
            columns,
            primary_key: primary_key.into(),
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Checks the column invariants: no empty names, no duplicates, PK first.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            if column.is_empty() {
                return Err(DbError::InvalidSchema(format!(
                    "table '{}' has an empty column name",
                    self.name
                )));
            }
            if !seen.insert(column.as_str()) {
                return Err(DbError::InvalidSchema(format!(
                    "duplicate column '{}' in table '{}'",
                    column, self.name
                )));
            }
        }
        if self.columns.first() != Some(&self.primary_key) {
            return Err(DbError::InvalidSchema(format!(
                "primary key '{}' must be the first column of '{}'",
                self.primary_key, self.name
            )));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn find_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col == name)
    }
}
