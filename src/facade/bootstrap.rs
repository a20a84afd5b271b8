use crate::core::{DbError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Schema descriptor: `{"tables": [{"name", "columns", "primary_key"}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemaFile {
    pub tables: Vec<TableDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<String>,
    pub primary_key: String,
}

impl SchemaFile {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| DbError::ParseError(format!("Invalid schema descriptor: {}", e)))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DbError::FileNotFound(path.display().to_string()));
        }
        Self::from_json(&fs::read_to_string(path)?)
    }
}

/// What bootstrap did with each table of the descriptor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Created empty and persisted.
    pub created: Vec<String>,
    /// Reloaded from an existing snapshot.
    pub resumed: Vec<String>,
    /// Not registered, with the reason.
    pub skipped: Vec<(String, String)>,
    /// Resumed, but the snapshot's columns differ from the descriptor.
    /// The snapshot wins.
    pub mismatched: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_descriptor() {
        let schema = SchemaFile::from_json(
            r#"{"tables": [{"name": "employees", "columns": ["name", "dept"], "primary_key": "id"}]}"#,
        )
        .unwrap();
        assert_eq!(
            schema.tables,
            vec![TableDefinition {
                name: "employees".into(),
                columns: vec!["name".into(), "dept".into()],
                primary_key: "id".into(),
            }]
        );
    }

    #[test]
    fn test_bad_descriptor() {
        assert!(matches!(
            SchemaFile::from_json(r#"{"tables": [{"name": "t"}]}"#),
            Err(DbError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_descriptor_file() {
        assert!(matches!(
            SchemaFile::from_path("/definitely/not/here/schema.json"),
            Err(DbError::FileNotFound(_))
        ));
    }
}
