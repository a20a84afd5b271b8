use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Invalid number of values: expected {expected}, got {got}")]
    ColumnCountMismatch { expected: usize, got: usize },

    #[error("Invalid condition: {0}")]
    ConditionParse(String),

    #[error("Table '{0}' is empty. Nothing to delete")]
    EmptyTable(String),

    #[error("No rows in '{0}' matched the condition. Nothing to delete")]
    NoMatch(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Table '{0}' has no primary key values left")]
    KeyExhausted(String),

    #[error("Corrupt snapshot for '{0}': {1}")]
    CorruptSnapshot(String, String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    /// Errors that leave the session usable. Everything except I/O and lock
    /// poisoning is a plain command-level rejection.
    pub fn is_command_error(&self) -> bool {
        !matches!(self, DbError::IoError(_) | DbError::LockError(_))
    }
}

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}
