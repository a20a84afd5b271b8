use crate::core::Row;

/// Outcome of one command: projected rows for SELECT, a status line for
/// everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Row>,
    affected_rows: Option<usize>,
    message: Option<String>,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            ..Self::default()
        }
    }

    pub fn affected(count: usize, message: impl Into<String>) -> Self {
        Self {
            affected_rows: Some(count),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn affected_rows(&self) -> Option<usize> {
        self.affected_rows
    }

    pub fn status(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// One line per row, fields separated by a single space.
    pub fn lines(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.join(" ")).collect()
    }

    /// Rows as an aligned text table with a header and a row count footer.
    pub fn render_table(&self) -> Vec<String> {
        if self.columns.is_empty() {
            return vec![self.message.clone().unwrap_or_else(|| "OK".to_string())];
        }

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (i, value) in row.iter().enumerate() {
                widths[i] = widths[i].max(value.chars().count());
            }
        }

        let format_row = |fields: &[String]| -> String {
            fields
                .iter()
                .enumerate()
                .map(|(i, field)| format!("{:width$}", field, width = widths[i]))
                .collect::<Vec<_>>()
                .join(" | ")
        };

        let mut out = Vec::with_capacity(self.rows.len() + 3);
        out.push(format_row(&self.columns));
        out.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        out.extend(self.rows.iter().map(|row| format_row(row)));
        out.push(format!("{} row(s)", self.rows.len()));
        out
    }
}
