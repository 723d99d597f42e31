pub mod aggregate;
pub mod connection;
pub mod error;
pub mod feed;
pub mod index;
pub mod memory;
pub mod repositories;
pub mod schema;
pub mod sqlite;
pub mod store;

pub use connection::{Database, DbPool};
pub use error::{StoreError, StoreResult};
pub use memory::MemStorage;
pub use sqlite::SqliteStorage;
pub use store::Storage;
