use super::{Token, tokenize_marked};
use crate::core::{DbError, Result};
use crate::expression::Condition;

const CREATE_USAGE: &str =
    "Usage: CREATE TABLE table_name (column1, column2) PRIMARY KEY (primary_key)";
const INSERT_USAGE: &str = "Usage: INSERT INTO table_name VALUES (value1, value2)";
const SELECT_USAGE: &str =
    "Usage: SELECT (column1, column2) FROM table_name[, other_table] [WHERE column = value]";
const DELETE_USAGE: &str = "Usage: DELETE FROM table_name WHERE column = value";
const LOAD_USAGE: &str = "Usage: LOAD TABLE table_name | LOAD CSV table_name";
const SAVE_USAGE: &str = "Usage: SAVE TABLE table_name";

/// Which columns a SELECT emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// `*`: every column of the first table.
    All,
    Columns(Vec<String>),
}

/// One parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateTable {
        name: String,
        columns: Vec<String>,
        primary_key: String,
    },
    Insert {
        table: String,
        values: Vec<String>,
    },
    Select {
        projection: Projection,
        tables: Vec<String>,
        condition: Option<Condition>,
    },
    Delete {
        table: String,
        condition: Condition,
    },
    LoadTable {
        name: String,
    },
    LoadCsv {
        name: String,
    },
    SaveTable {
        name: String,
    },
    Exit,
}

impl Command {
    /// Parses a command line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let tokens = tokenize_marked(line);
        if tokens.is_empty() {
            return Ok(None);
        }
        Self::from_tokens(&tokens).map(Some)
    }

    pub fn from_tokens(tokens: &[Token]) -> Result<Command> {
        let head = match tokens.first() {
            Some(first) if !first.grouped => first.text.to_ascii_uppercase(),
            Some(first) => {
                return Err(DbError::ParseError(format!("Unknown command '({})'", first.text)));
            }
            None => return Err(DbError::ParseError("Empty command".into())),
        };
        match head.as_str() {
            "CREATE" => parse_create(tokens),
            "INSERT" => parse_insert(tokens),
            "SELECT" => parse_select(tokens),
            "DELETE" => parse_delete(tokens),
            "LOAD" => parse_load(tokens),
            "SAVE" => parse_save(tokens),
            "EXIT" => Ok(Command::Exit),
            _ => Err(DbError::ParseError(format!("Unknown command '{}'", tokens[0].text))),
        }
    }

    /// Short name used in logs and spans.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::CreateTable { .. } => "CREATE",
            Command::Insert { .. } => "INSERT",
            Command::Select { .. } => "SELECT",
            Command::Delete { .. } => "DELETE",
            Command::LoadTable { .. } => "LOAD TABLE",
            Command::LoadCsv { .. } => "LOAD CSV",
            Command::SaveTable { .. } => "SAVE TABLE",
            Command::Exit => "EXIT",
        }
    }

    /// Whether a successful run changes table contents.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::CreateTable { .. } | Command::Insert { .. } | Command::Delete { .. }
        )
    }
}

fn keyword(tokens: &[Token], idx: usize, expected: &str) -> bool {
    tokens.get(idx).is_some_and(|t| t.is_keyword(expected))
}

fn position_of(tokens: &[Token], from: usize, expected: &str) -> Option<usize> {
    tokens
        .iter()
        .skip(from)
        .position(|t| t.is_keyword(expected))
        .map(|p| p + from)
}

fn joined(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Joins a token span and splits it on commas: `["a,", "b"]` -> `["a", "b"]`.
fn comma_list(tokens: &[Token]) -> Vec<String> {
    let text = joined(tokens);
    if text.trim().is_empty() {
        return Vec::new();
    }
    text.split(',').map(|s| s.trim().to_string()).collect()
}

fn usage(message: &str) -> DbError {
    DbError::ParseError(format!("Invalid command. {}", message))
}

fn parse_create(tokens: &[Token]) -> Result<Command> {
    if tokens.len() < 6 || !keyword(tokens, 1, "TABLE") {
        return Err(usage(CREATE_USAGE));
    }
    let pk_at = position_of(tokens, 3, "PRIMARY").ok_or_else(|| usage(CREATE_USAGE))?;
    if !keyword(tokens, pk_at + 1, "KEY") || tokens.len() != pk_at + 3 {
        return Err(usage(CREATE_USAGE));
    }

    Ok(Command::CreateTable {
        name: tokens[2].text.clone(),
        columns: comma_list(&tokens[3..pk_at]),
        primary_key: tokens[pk_at + 2].text.clone(),
    })
}

fn parse_insert(tokens: &[Token]) -> Result<Command> {
    if tokens.len() < 5 || !keyword(tokens, 1, "INTO") || !keyword(tokens, 3, "VALUES") {
        return Err(usage(INSERT_USAGE));
    }
    Ok(Command::Insert {
        table: tokens[2].text.clone(),
        values: comma_list(&tokens[4..]),
    })
}

fn parse_select(tokens: &[Token]) -> Result<Command> {
    let from_at = position_of(tokens, 1, "FROM")
        .filter(|&at| at >= 2 && at + 1 < tokens.len())
        .ok_or_else(|| usage(SELECT_USAGE))?;
    let where_at = position_of(tokens, from_at + 1, "WHERE");

    let columns = comma_list(&tokens[1..from_at]);
    let projection = match columns.as_slice() {
        [star] if star == "*" => Projection::All,
        _ if columns.iter().any(|c| c.is_empty()) => return Err(usage(SELECT_USAGE)),
        _ => Projection::Columns(columns),
    };

    let tables = comma_list(&tokens[from_at + 1..where_at.unwrap_or(tokens.len())]);
    if tables.is_empty() || tables.len() > 2 || tables.iter().any(|t| t.is_empty()) {
        return Err(DbError::ParseError(format!(
            "SELECT takes one or two tables. {}",
            SELECT_USAGE
        )));
    }

    let condition = match where_at {
        Some(at) => Some(Condition::parse(&joined(&tokens[at + 1..]))?),
        None => None,
    };

    Ok(Command::Select {
        projection,
        tables,
        condition,
    })
}

fn parse_delete(tokens: &[Token]) -> Result<Command> {
    if tokens.len() < 5 || !keyword(tokens, 1, "FROM") || !keyword(tokens, 3, "WHERE") {
        return Err(usage(DELETE_USAGE));
    }
    Ok(Command::Delete {
        table: tokens[2].text.clone(),
        condition: Condition::parse(&joined(&tokens[4..]))?,
    })
}

fn parse_load(tokens: &[Token]) -> Result<Command> {
    if tokens.len() != 3 {
        return Err(usage(LOAD_USAGE));
    }
    let name = tokens[2].text.clone();
    if keyword(tokens, 1, "TABLE") {
        Ok(Command::LoadTable { name })
    } else if keyword(tokens, 1, "CSV") {
        Ok(Command::LoadCsv { name })
    } else {
        Err(usage(LOAD_USAGE))
    }
}

fn parse_save(tokens: &[Token]) -> Result<Command> {
    if tokens.len() != 3 || !keyword(tokens, 1, "TABLE") {
        return Err(usage(SAVE_USAGE));
    }
    Ok(Command::SaveTable {
        name: tokens[2].text.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::CompareOp;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_empty_tokens() {
        assert!(matches!(Command::from_tokens(&[]), Err(DbError::ParseError(_))));
    }

    #[test]
    fn test_grouped_keyword_is_a_name() {
        assert_eq!(
            parse("CREATE TABLE t (primary) PRIMARY KEY (id)"),
            Command::CreateTable {
                name: "t".into(),
                columns: strings(&["primary"]),
                primary_key: "id".into(),
            }
        );
        assert_eq!(
            parse("SELECT (from) FROM t"),
            Command::Select {
                projection: Projection::Columns(strings(&["from"])),
                tables: strings(&["t"]),
                condition: None,
            }
        );
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_create() {
        assert_eq!(
            parse("CREATE TABLE employees (name, dept) PRIMARY KEY (id)"),
            Command::CreateTable {
                name: "employees".into(),
                columns: strings(&["name", "dept"]),
                primary_key: "id".into(),
            }
        );
    }

    #[test]
    fn test_create_bare_primary_key_and_lowercase() {
        assert_eq!(
            parse("create table t (a) primary key id"),
            Command::CreateTable {
                name: "t".into(),
                columns: strings(&["a"]),
                primary_key: "id".into(),
            }
        );
    }

    #[test]
    fn test_create_missing_primary_key() {
        assert!(matches!(
            Command::parse("CREATE TABLE t (a, b) PRIMARY KEY"),
            Err(DbError::ParseError(_))
        ));
        assert!(matches!(
            Command::parse("CREATE TABLE t (a, b)"),
            Err(DbError::ParseError(_))
        ));
    }

    #[test]
    fn test_insert_splits_and_trims_values() {
        assert_eq!(
            parse("INSERT INTO employees VALUES ( Alice ,  Eng )"),
            Command::Insert {
                table: "employees".into(),
                values: strings(&["Alice", "Eng"]),
            }
        );
    }

    #[test]
    fn test_insert_requires_values_keyword() {
        assert!(Command::parse("INSERT INTO t (a, b)").is_err());
        assert!(Command::parse("INSERT INTO t VALUES").is_err());
    }

    #[test]
    fn test_select_star() {
        assert_eq!(
            parse("SELECT * FROM employees"),
            Command::Select {
                projection: Projection::All,
                tables: strings(&["employees"]),
                condition: None,
            }
        );
    }

    #[test]
    fn test_select_columns_with_filter() {
        assert_eq!(
            parse("SELECT (name) FROM employees WHERE dept = Eng"),
            Command::Select {
                projection: Projection::Columns(strings(&["name"])),
                tables: strings(&["employees"]),
                condition: Some(Condition::new("dept", CompareOp::Eq, "Eng")),
            }
        );
    }

    #[test]
    fn test_select_unparenthesized_columns_and_join() {
        assert_eq!(
            parse("SELECT name, title FROM employees, projects"),
            Command::Select {
                projection: Projection::Columns(strings(&["name", "title"])),
                tables: strings(&["employees", "projects"]),
                condition: None,
            }
        );
    }

    #[test]
    fn test_select_rejects_three_tables() {
        assert!(matches!(
            Command::parse("SELECT * FROM a, b, c"),
            Err(DbError::ParseError(_))
        ));
    }

    #[test]
    fn test_select_without_from() {
        assert!(Command::parse("SELECT * employees").is_err());
        assert!(Command::parse("SELECT * FROM").is_err());
        assert!(Command::parse("SELECT FROM t").is_err());
    }

    #[test]
    fn test_select_bad_condition() {
        assert!(matches!(
            Command::parse("SELECT * FROM t WHERE dept"),
            Err(DbError::ConditionParse(_))
        ));
    }

    #[test]
    fn test_delete() {
        assert_eq!(
            parse("DELETE FROM t WHERE (name != Bob)"),
            Command::Delete {
                table: "t".into(),
                condition: Condition::new("name", CompareOp::NotEq, "Bob"),
            }
        );
    }

    #[test]
    fn test_delete_requires_where() {
        assert!(matches!(
            Command::parse("DELETE FROM t"),
            Err(DbError::ParseError(_))
        ));
    }

    #[test]
    fn test_load_save_exit() {
        assert_eq!(parse("LOAD TABLE t"), Command::LoadTable { name: "t".into() });
        assert_eq!(parse("LOAD CSV t"), Command::LoadCsv { name: "t".into() });
        assert_eq!(parse("SAVE TABLE t"), Command::SaveTable { name: "t".into() });
        assert_eq!(parse("EXIT"), Command::Exit);
        assert!(Command::parse("LOAD JSON t").is_err());
        assert!(Command::parse("SAVE TABLE").is_err());
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            Command::parse("DROP TABLE t"),
            Err(DbError::ParseError(_))
        ));
    }
}
