pub mod app_config;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use app_config::{Config, StoreBackend};
pub use memory::{FaultPoint, MemoryStore};
pub use postgres::PgStore;
pub use repository::{DirectoryStore, LedgerStore, LedgerTx};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness rule was violated (duplicate email, airport code,
    /// tail number).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backend refused or failed an operation. Covers injected test
    /// faults and corrupted rows.
    #[error("Storage backend failure: {0}")]
    Backend(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
