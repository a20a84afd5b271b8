use super::table::{Table, TableHandle};
use crate::core::{DbError, Result};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// Maps table names to shared table handles.
///
/// Registration is insert-if-absent under one write lock, so two callers
/// racing on the same name see exactly one success. There is no removal:
/// tables live as long as the registry.
#[derive(Default)]
pub struct Registry {
    tables: RwLock<HashMap<String, TableHandle>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `table` under its own name and returns its handle.
    pub fn register(&self, table: Table) -> Result<TableHandle> {
        let name = table.name().to_string();
        let mut tables = self.tables.write()?;
        match tables.entry(name) {
            Entry::Occupied(entry) => Err(DbError::TableExists(entry.key().clone())),
            Entry::Vacant(entry) => {
                let handle = Arc::new(Mutex::new(table));
                entry.insert(Arc::clone(&handle));
                Ok(handle)
            }
        }
    }

    /// Drops a registration made moments ago whose creation could not be
    /// persisted. Does nothing if `name` now maps to a different handle.
    pub(crate) fn discard(&self, name: &str, handle: &TableHandle) -> Result<()> {
        let mut tables = self.tables.write()?;
        if tables.get(name).is_some_and(|h| Arc::ptr_eq(h, handle)) {
            tables.remove(name);
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<Option<TableHandle>> {
        Ok(self.tables.read()?.get(name).cloned())
    }

    /// Like `lookup`, but a missing table is a `TableNotFound` error.
    pub fn get(&self, name: &str) -> Result<TableHandle> {
        self.lookup(name)?
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.tables.read()?.contains_key(name))
    }

    /// Registered names, sorted.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.tables.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.tables.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TableSchema;

    fn table(name: &str) -> Table {
        Table::new(TableSchema::new(name, vec!["a".to_string()], "id").unwrap())
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = Registry::new();
        registry.register(table("users")).unwrap();
        assert!(registry.contains("users").unwrap());
        assert!(registry.lookup("users").unwrap().is_some());
        assert!(registry.lookup("orders").unwrap().is_none());
        assert!(matches!(registry.get("orders"), Err(DbError::TableNotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_register_keeps_first() {
        let registry = Registry::new();
        let first = registry.register(table("users")).unwrap();
        first.lock().await.insert(vec!["x".into()]).unwrap();

        let err = registry.register(table("users")).unwrap_err();
        assert!(matches!(err, DbError::TableExists(name) if name == "users"));

        let handle = registry.get("users").unwrap();
        assert_eq!(handle.lock().await.row_count(), 1);
        assert_eq!(registry.len().unwrap(), 1);
    }

    #[test]
    fn test_concurrent_register_same_name() {
        let registry = Arc::new(Registry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.register(table("race")).is_ok())
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn test_list_tables_sorted() {
        let registry = Registry::new();
        registry.register(table("b")).unwrap();
        registry.register(table("a")).unwrap();
        assert_eq!(registry.list_tables().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let registry = Arc::new(Registry::new());
        registry.register(table("users")).unwrap();

        let poisoner = Arc::clone(&registry);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.tables.write().unwrap();
            panic!("writer died");
        })
        .join();

        assert!(matches!(registry.contains("users"), Err(DbError::LockError(_))));
        assert!(matches!(registry.list_tables(), Err(DbError::LockError(_))));
        assert!(matches!(registry.len(), Err(DbError::LockError(_))));
        assert!(matches!(registry.lookup("users"), Err(DbError::LockError(_))));
    }
}
