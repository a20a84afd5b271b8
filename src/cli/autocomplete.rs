use std::collections::BTreeSet;
use tabstore::Database;

const KEYWORDS: &[&str] = &[
    "CREATE", "TABLE", "INSERT", "INTO", "VALUES", "SELECT", "FROM", "WHERE", "DELETE", "LOAD",
    "CSV", "SAVE", "PRIMARY", "KEY", "EXIT",
];

pub struct Autocompleter {
    keywords: BTreeSet<&'static str>,
}

impl Autocompleter {
    pub fn new() -> Self {
        Self {
            keywords: KEYWORDS.iter().copied().collect(),
        }
    }

    /// Keywords, table names and column names of known tables starting with `input`.
    pub async fn get_suggestions(&self, input: &str, db: &Database) -> Vec<String> {
        let mut candidates = Vec::new();
        for table in db.list_tables().unwrap_or_default() {
            if let Ok(columns) = db.table_columns(&table).await {
                candidates.extend(columns);
            }
            candidates.push(table);
        }
        self.matching(input, candidates)
    }

    fn matching(&self, input: &str, names: Vec<String>) -> Vec<String> {
        let input_upper = input.to_uppercase();
        let mut suggestions: BTreeSet<String> = self
            .keywords
            .iter()
            .filter(|kw| kw.starts_with(&input_upper))
            .map(|kw| kw.to_string())
            .collect();

        suggestions.extend(
            names
                .into_iter()
                .filter(|name| name.to_uppercase().starts_with(&input_upper) && name != input),
        );
        suggestions.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_prefix_is_case_insensitive() {
        let ac = Autocompleter::new();
        assert_eq!(ac.matching("se", vec![]), vec!["SELECT"]);
        assert_eq!(ac.matching("C", vec![]), vec!["CREATE", "CSV"]);
    }

    #[tokio::test]
    async fn test_suggests_tables_and_columns() {
        let db = Database::in_memory();
        db.execute("CREATE TABLE employees (name, dept) PRIMARY KEY (id)")
            .await
            .unwrap();
        let ac = Autocompleter::new();
        assert_eq!(ac.get_suggestions("emp", &db).await, vec!["employees"]);
        assert_eq!(ac.get_suggestions("d", &db).await, vec!["DELETE", "dept"]);
    }
}
