pub mod engine;
pub mod wallet;

pub use engine::BookingEngine;
pub use wallet::WalletService;

use rust_decimal::Decimal;
use uuid::Uuid;

use skyfare_domain::{DomainError, WalletError};
use skyfare_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    /// Registration guarantees every user a wallet, so a missing wallet
    /// row means the ledger itself is damaged, not that the caller did
    /// anything wrong.
    #[error("Wallet record missing for user {0}")]
    MissingWallet(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DomainError> for BookingError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => BookingError::Validation(msg),
        }
    }
}

impl From<WalletError> for BookingError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::InsufficientFunds {
                requested,
                available,
            } => BookingError::InsufficientFunds {
                required: requested,
                available,
            },
            WalletError::NonPositiveAmount(amount) => {
                BookingError::Validation(format!("amount must be positive, got {}", amount))
            }
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
