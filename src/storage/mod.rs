pub mod csv;
pub mod persistence;
pub mod registry;
pub mod table;

pub use persistence::{FileStore, MemoryStore, Persistence, TableSnapshot};
pub use registry::Registry;
pub use table::{Table, TableHandle, Undo};
