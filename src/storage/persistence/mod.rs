//! Report store implementations.

mod sqlite;

pub use sqlite::SqliteStore;
