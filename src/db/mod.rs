// src/db/mod.rs - SQLite storage backend (sqlx pool, one transaction per session)

pub mod engine;
pub mod pool;
pub mod schema;
pub mod session;

pub use engine::Database;
pub use pool::{PoolOptions, PoolStats};
pub use session::SqliteSession;
