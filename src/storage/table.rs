use crate::core::{DbError, Result, Row, TableSchema};
use crate::expression::{Condition, strip_parens};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handle to a table. The mutex is the table's guard: hold it for the
/// whole of any operation that reads or writes the row sequence.
pub type TableHandle = Arc<Mutex<Table>>;

/// A named, schema-bound ordered collection of fixed-arity records.
///
/// Primary keys are **not** stable identifiers: `delete_where` renumbers the
/// remaining rows to `0..len` in storage order and resets the sequence to
/// `len`, so a key may be reused by the next insert.
#[derive(Debug, Clone)]
pub struct Table {
    schema: TableSchema,
    rows: Vec<Row>,
    pk_sequence: usize,
}

/// State captured before a mutation, used to revert it when the change
/// cannot be persisted.
#[derive(Debug, Clone)]
pub enum Undo {
    Insert { pk_sequence: usize },
    Replace { rows: Vec<Row>, pk_sequence: usize },
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
            pk_sequence: 0,
        }
    }

    /// Rebuilds a table from stored parts, checking every row invariant.
    ///
    /// The sequence is raised past the largest stored key when the saved
    /// value is missing or stale.
    pub fn from_parts(schema: TableSchema, rows: Vec<Row>, pk_sequence: Option<usize>) -> Result<Self> {
        let corrupt = |msg: String| DbError::CorruptSnapshot(schema.name().to_string(), msg);

        schema.validate()?;
        let width = schema.column_count();
        let mut keys = HashSet::with_capacity(rows.len());
        let mut next_free = 0usize;

        for (idx, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(corrupt(format!(
                    "row {} has {} fields, expected {}",
                    idx,
                    row.len(),
                    width
                )));
            }
            let key: usize = row[0]
                .parse()
                .map_err(|_| corrupt(format!("row {} has non-numeric key '{}'", idx, row[0])))?;
            if !keys.insert(key) {
                return Err(corrupt(format!("duplicate key {}", key)));
            }
            let after = key
                .checked_add(1)
                .ok_or_else(|| corrupt(format!("row {} key {} is out of range", idx, key)))?;
            next_free = next_free.max(after);
        }

        Ok(Self {
            schema,
            rows,
            pk_sequence: pk_sequence.unwrap_or(0).max(next_free),
        })
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn pk_sequence(&self) -> usize {
        self.pk_sequence
    }

    /// Finds a column by name, accepting `table.column` for this table.
    pub fn resolve_column(&self, name: &str) -> Option<usize> {
        let bare = match name.split_once('.') {
            Some((table, column)) if table == self.name() => column,
            Some(_) => return None,
            None => name,
        };
        self.schema.find_column_index(bare)
    }

    fn require_column(&self, name: &str) -> Result<usize> {
        self.resolve_column(name)
            .ok_or_else(|| DbError::ColumnNotFound(name.to_string(), self.name().to_string()))
    }

    /// Appends a record for every non-key column. The key is taken from the
    /// sequence; one layer of parentheses is stripped from each value.
    ///
    /// Returns the new record's index.
    pub fn insert(&mut self, values: Vec<String>) -> Result<usize> {
        let expected = self.schema.column_count() - 1;
        if values.len() != expected {
            return Err(DbError::ColumnCountMismatch {
                expected,
                got: values.len(),
            });
        }

        let next = self
            .pk_sequence
            .checked_add(1)
            .ok_or_else(|| DbError::KeyExhausted(self.name().to_string()))?;

        let mut row = Row::with_capacity(expected + 1);
        row.push(self.pk_sequence.to_string());
        row.extend(values.iter().map(|v| strip_parens(v).to_string()));

        self.pk_sequence = next;
        self.rows.push(row);
        Ok(self.rows.len() - 1)
    }

    /// Indices of rows satisfying `predicate`, or of every row without one.
    pub fn scan(&self, predicate: Option<&Condition>) -> Result<Vec<usize>> {
        let Some(cond) = predicate else {
            return Ok((0..self.rows.len()).collect());
        };
        let col = self.require_column(&cond.column)?;
        Ok(self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| cond.matches(&row[col]))
            .map(|(idx, _)| idx)
            .collect())
    }

    /// Removes every row matching `predicate` and renumbers the survivors.
    ///
    /// Fails with `EmptyTable` before evaluating anything when there are no
    /// rows, and with `NoMatch` (table untouched) when nothing matches.
    pub fn delete_where(&mut self, predicate: &Condition) -> Result<usize> {
        if self.rows.is_empty() {
            return Err(DbError::EmptyTable(self.name().to_string()));
        }
        let col = self.require_column(&predicate.column)?;

        let before = self.rows.len();
        if !self.rows.iter().any(|row| predicate.matches(&row[col])) {
            return Err(DbError::NoMatch(self.name().to_string()));
        }
        self.rows.retain(|row| !predicate.matches(&row[col]));

        self.renumber();
        Ok(before - self.rows.len())
    }

    fn renumber(&mut self) {
        for (idx, row) in self.rows.iter_mut().enumerate() {
            row[0] = idx.to_string();
        }
        self.pk_sequence = self.rows.len();
    }

    /// Selects fields of one record by column index.
    pub fn project(&self, row: usize, columns: &[usize]) -> Row {
        columns.iter().map(|&c| self.rows[row][c].clone()).collect()
    }

    pub fn undo_insert(&self) -> Undo {
        Undo::Insert {
            pk_sequence: self.pk_sequence,
        }
    }

    pub fn undo_replace(&self) -> Undo {
        Undo::Replace {
            rows: self.rows.clone(),
            pk_sequence: self.pk_sequence,
        }
    }

    pub fn rollback(&mut self, undo: Undo) {
        match undo {
            Undo::Insert { pk_sequence } => {
                self.rows.pop();
                self.pk_sequence = pk_sequence;
            }
            Undo::Replace { rows, pk_sequence } => {
                self.rows = rows;
                self.pk_sequence = pk_sequence;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employees() -> Table {
        let schema = TableSchema::new(
            "employees",
            vec!["name".to_string(), "dept".to_string()],
            "id",
        )
        .unwrap();
        Table::new(schema)
    }

    fn values(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn keys(table: &Table) -> Vec<String> {
        table.rows().iter().map(|r| r[0].clone()).collect()
    }

    #[test]
    fn test_insert_assigns_sequential_keys() {
        let mut table = employees();
        assert_eq!(table.insert(values(&["Alice", "Eng"])).unwrap(), 0);
        assert_eq!(table.insert(values(&["Bob", "Sales"])).unwrap(), 1);
        assert_eq!(table.rows()[1], values(&["1", "Bob", "Sales"]));
        assert_eq!(table.pk_sequence(), 2);
    }

    #[test]
    fn test_insert_wrong_arity() {
        let mut table = employees();
        let err = table.insert(values(&["Alice"])).unwrap_err();
        assert!(matches!(err, DbError::ColumnCountMismatch { expected: 2, got: 1 }));
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.pk_sequence(), 0);
    }

    #[test]
    fn test_insert_strips_parens() {
        let mut table = employees();
        table.insert(values(&["(Alice)", "Eng)"])).unwrap();
        assert_eq!(table.rows()[0], values(&["0", "Alice", "Eng"]));
    }

    #[test]
    fn test_scan_with_and_without_predicate() {
        let mut table = employees();
        table.insert(values(&["Alice", "Eng"])).unwrap();
        table.insert(values(&["Bob", "Sales"])).unwrap();
        table.insert(values(&["Carol", "Eng"])).unwrap();

        assert_eq!(table.scan(None).unwrap(), vec![0, 1, 2]);
        let cond = Condition::parse("dept = Eng").unwrap();
        assert_eq!(table.scan(Some(&cond)).unwrap(), vec![0, 2]);
        let cond = Condition::parse("employees.dept != Eng").unwrap();
        assert_eq!(table.scan(Some(&cond)).unwrap(), vec![1]);
    }

    #[test]
    fn test_scan_unknown_column() {
        let table = employees();
        let cond = Condition::parse("salary = 1").unwrap();
        assert!(matches!(
            table.scan(Some(&cond)),
            Err(DbError::ColumnNotFound(_, _))
        ));
    }

    #[test]
    fn test_delete_renumbers_keys() {
        let mut table = employees();
        for name in ["A", "B", "C", "D"] {
            table.insert(values(&[name, if name == "B" { "x" } else { "y" }])).unwrap();
        }
        let cond = Condition::parse("dept = x").unwrap();
        assert_eq!(table.delete_where(&cond).unwrap(), 1);
        assert_eq!(keys(&table), values(&["0", "1", "2"]));
        assert_eq!(table.rows()[1][1], "C");
        assert_eq!(table.pk_sequence(), 3);

        table.insert(values(&["E", "y"])).unwrap();
        assert_eq!(keys(&table), values(&["0", "1", "2", "3"]));
    }

    #[test]
    fn test_delete_on_empty_table() {
        let mut table = employees();
        let cond = Condition::parse("dept = x").unwrap();
        assert!(matches!(table.delete_where(&cond), Err(DbError::EmptyTable(_))));
    }

    #[test]
    fn test_delete_no_match_leaves_rows_untouched() {
        let mut table = employees();
        table.insert(values(&["Alice", "Eng"])).unwrap();
        table.insert(values(&["Bob", "Sales"])).unwrap();
        let cond = Condition::parse("name = Alice").unwrap();
        table.delete_where(&cond).unwrap();
        let before = table.rows().to_vec();
        let seq = table.pk_sequence();

        let cond = Condition::parse("dept = HR").unwrap();
        assert!(matches!(table.delete_where(&cond), Err(DbError::NoMatch(_))));
        assert_eq!(table.rows(), before.as_slice());
        assert_eq!(table.pk_sequence(), seq);
    }

    #[test]
    fn test_rollback_insert_and_replace() {
        let mut table = employees();
        table.insert(values(&["Alice", "Eng"])).unwrap();

        let undo = table.undo_insert();
        table.insert(values(&["Bob", "Sales"])).unwrap();
        table.rollback(undo);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.pk_sequence(), 1);

        let undo = table.undo_replace();
        table.delete_where(&Condition::parse("name = Alice").unwrap()).unwrap();
        table.rollback(undo);
        assert_eq!(table.rows()[0], values(&["0", "Alice", "Eng"]));
    }

    #[test]
    fn test_from_parts_validates_rows() {
        let schema = employees().schema().clone();
        let ok = Table::from_parts(
            schema.clone(),
            vec![values(&["0", "a", "b"]), values(&["5", "c", "d"])],
            None,
        )
        .unwrap();
        assert_eq!(ok.pk_sequence(), 6);

        let short = Table::from_parts(schema.clone(), vec![values(&["0", "a"])], None);
        assert!(matches!(short, Err(DbError::CorruptSnapshot(_, _))));

        let dup = Table::from_parts(
            schema.clone(),
            vec![values(&["1", "a", "b"]), values(&["1", "c", "d"])],
            Some(9),
        );
        assert!(matches!(dup, Err(DbError::CorruptSnapshot(_, _))));

        let negative = Table::from_parts(schema, vec![values(&["-1", "a", "b"])], None);
        assert!(matches!(negative, Err(DbError::CorruptSnapshot(_, _))));
    }

    #[test]
    fn test_from_parts_rejects_largest_key() {
        let schema = employees().schema().clone();
        let max = usize::MAX.to_string();
        let result = Table::from_parts(schema, vec![values(&[max.as_str(), "a", "b"])], None);
        assert!(matches!(result, Err(DbError::CorruptSnapshot(_, _))));
    }

    #[test]
    fn test_insert_fails_when_sequence_is_exhausted() {
        let schema = employees().schema().clone();
        let mut table = Table::from_parts(schema, Vec::new(), Some(usize::MAX)).unwrap();

        let err = table.insert(values(&["Alice", "Eng"])).unwrap_err();
        assert!(matches!(err, DbError::KeyExhausted(_)));
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.pk_sequence(), usize::MAX);
    }

    #[test]
    fn test_resolve_qualified_column() {
        let table = employees();
        assert_eq!(table.resolve_column("dept"), Some(2));
        assert_eq!(table.resolve_column("employees.id"), Some(0));
        assert_eq!(table.resolve_column("projects.id"), None);
    }
}
