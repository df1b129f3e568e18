pub mod booking;
pub mod directory;
pub mod review;
pub mod user;
pub mod wallet;

pub use booking::{Booking, BookingRequest, PassengerSpec, Ticket};
pub use directory::{Airplane, AirplaneSpec, Airport, AirportSpec, Flight, FlightSpec};
pub use review::{Review, ReviewSpec};
pub use user::{Role, User};
pub use wallet::{Wallet, WalletError};

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
