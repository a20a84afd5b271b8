use crate::core::Result;
use crate::storage::{Persistence, Registry, Table, TableSnapshot};
use log::warn;

pub struct ExecutionContext<'a> {
    pub registry: &'a Registry,
    pub persistence: &'a dyn Persistence,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(registry: &'a Registry, persistence: &'a dyn Persistence) -> Self {
        Self {
            registry,
            persistence,
        }
    }

    /// Writes the snapshot of a table whose guard the caller holds.
    ///
    /// Only the snapshot is authoritative: a failure there is returned so the
    /// caller can undo its change. The key sequence and lock marker are
    /// best-effort.
    pub fn persist(&self, table: &Table) -> Result<()> {
        self.persistence.save_snapshot(&TableSnapshot::from(table))?;

        if let Err(e) = self.persistence.save_counter(table.name(), table.pk_sequence()) {
            warn!("could not save key sequence of '{}': {}", table.name(), e);
        }
        if let Err(e) = self.persistence.save_lock_marker(table.name(), true) {
            warn!("could not save lock marker of '{}': {}", table.name(), e);
        }
        Ok(())
    }
}
