use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use skyfare_domain::{Booking, BookingRequest};
use skyfare_store::{DirectoryStore, LedgerStore, LedgerTx};

use crate::BookingError;

/// Orchestrates the one multi-record mutation in the system: flight
/// lookup, wallet debit, and booking/ticket creation as a single unit of
/// work, plus the inverse refund path for cancellation.
///
/// The engine is authorization-agnostic: the requester's identity is an
/// explicit parameter, and ownership checks belong to the HTTP layer.
pub struct BookingEngine {
    ledger: Arc<dyn LedgerStore>,
    directory: Arc<dyn DirectoryStore>,
}

impl BookingEngine {
    pub fn new(ledger: Arc<dyn LedgerStore>, directory: Arc<dyn DirectoryStore>) -> Self {
        Self { ledger, directory }
    }

    /// Books a flight for `requester_id`, one ticket per passenger.
    ///
    /// The wallet debit and the booking insert commit together or not at
    /// all; any failure before commit leaves the ledger untouched.
    pub async fn book_flight(
        &self,
        requester_id: Uuid,
        request: BookingRequest,
    ) -> Result<Booking, BookingError> {
        // 1. Validate the passenger manifest before touching any state
        request.validate()?;

        // 2. Resolve the requester and the flight
        let user = self
            .ledger
            .user(requester_id)
            .await?
            .ok_or(BookingError::NotFound("user"))?;
        let flight = self
            .directory
            .flight(request.flight_id)
            .await?
            .ok_or(BookingError::NotFound("flight"))?;

        // 3. Price the reservation with exact decimal arithmetic
        let total = flight.price * Decimal::from(request.passengers.len() as u64);

        // 4. Debit the wallet and persist the booking in one unit of work
        let mut tx = self.ledger.begin().await?;
        let mut wallet = tx
            .wallet_for_update(user.id)
            .await?
            .ok_or(BookingError::MissingWallet(user.id))?;
        wallet.debit(total)?;
        tx.save_wallet(&wallet).await?;

        let booking = Booking::create(user.id, flight.id, total, request.passengers);
        tx.insert_booking(&booking).await?;
        tx.commit().await?;

        info!(
            "booking {} committed: debited {} from user {} for flight {}",
            booking.id, total, user.id, flight.id
        );
        Ok(booking)
    }

    /// Cancels a booking: credits the full amount back to the owner's
    /// wallet and deletes the booking with its tickets, committing both
    /// effects together. A repeated cancellation of the same id finds no
    /// booking and refunds nothing.
    pub async fn cancel_booking(&self, booking_id: Uuid) -> Result<Decimal, BookingError> {
        let mut tx = self.ledger.begin().await?;

        // 1. Claim the booking row; a concurrent cancel of the same id
        //    serializes here and then observes it gone
        let booking = tx
            .booking_for_update(booking_id)
            .await?
            .ok_or(BookingError::NotFound("booking"))?;

        // 2. Refund the owner's wallet
        let mut wallet = tx
            .wallet_for_update(booking.user_id)
            .await?
            .ok_or(BookingError::MissingWallet(booking.user_id))?;
        wallet.credit(booking.total_amount)?;
        tx.save_wallet(&wallet).await?;

        // 3. Remove the booking and commit refund + deletion together
        tx.delete_booking(booking_id).await?;
        tx.commit().await?;

        info!(
            "booking {} cancelled: refunded {} to user {}",
            booking_id, booking.total_amount, booking.user_id
        );
        Ok(booking.total_amount)
    }

    pub async fn booking_by_id(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        self.ledger
            .booking(booking_id)
            .await?
            .ok_or(BookingError::NotFound("booking"))
    }

    pub async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, BookingError> {
        if self.ledger.user(user_id).await?.is_none() {
            return Err(BookingError::NotFound("user"));
        }
        Ok(self.ledger.bookings_for_user(user_id).await?)
    }

    /// All bookings, optionally narrowed to one customer.
    pub async fn all_bookings(&self, customer: Option<Uuid>) -> Result<Vec<Booking>, BookingError> {
        match customer {
            Some(user_id) => self.bookings_for_user(user_id).await,
            None => Ok(self.ledger.bookings().await?),
        }
    }
}
