pub mod service;

pub use service::DirectoryService;

use uuid::Uuid;

use skyfare_domain::DomainError;
use skyfare_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Flight {0} has already departed")]
    FlightDeparted(Uuid),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for DirectoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => DirectoryError::Conflict(msg),
            other => DirectoryError::Store(other),
        }
    }
}

impl From<DomainError> for DirectoryError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => DirectoryError::Validation(msg),
        }
    }
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;
