use async_trait::async_trait;
use uuid::Uuid;

use skyfare_domain::{Airplane, Airport, Booking, Flight, Review, User, Wallet};

use crate::StoreError;

/// Storage seam for users, wallets, bookings, and reviews. Reads go
/// straight through; every mutation happens inside a [`LedgerTx`] opened
/// with [`begin`](LedgerStore::begin).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a unit of work. Mutations staged on the returned handle
    /// become visible to readers only once `commit` succeeds.
    async fn begin(&self) -> Result<Box<dyn LedgerTx + '_>, StoreError>;

    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn users(&self) -> Result<Vec<User>, StoreError>;

    async fn wallet_for_user(&self, user_id: Uuid) -> Result<Option<Wallet>, StoreError>;

    async fn booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;
    async fn bookings(&self) -> Result<Vec<Booking>, StoreError>;
    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError>;
    async fn user_has_booked_flight(
        &self,
        user_id: Uuid,
        flight_id: Uuid,
    ) -> Result<bool, StoreError>;

    async fn reviews_for_flight(&self, flight_id: Uuid) -> Result<Vec<Review>, StoreError>;
}

/// One atomic unit of work. All staged mutations apply together at
/// `commit`; dropping the handle without committing discards them.
#[async_trait]
pub trait LedgerTx: Send {
    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError>;
    async fn update_user(&mut self, user: &User) -> Result<(), StoreError>;
    /// Removes the user together with their wallet, bookings, and
    /// reviews. Returns false when no such user exists.
    async fn delete_user(&mut self, user_id: Uuid) -> Result<bool, StoreError>;

    /// Reads a wallet with an exclusive claim for the remainder of this
    /// transaction, so two debits of the same wallet cannot interleave.
    async fn wallet_for_update(&mut self, user_id: Uuid) -> Result<Option<Wallet>, StoreError>;
    /// Creates or overwrites the wallet row for `wallet.user_id`.
    async fn save_wallet(&mut self, wallet: &Wallet) -> Result<(), StoreError>;

    async fn insert_booking(&mut self, booking: &Booking) -> Result<(), StoreError>;
    /// Reads a booking with an exclusive claim, used by cancellation so a
    /// concurrent cancel of the same booking serializes behind this one.
    async fn booking_for_update(&mut self, id: Uuid) -> Result<Option<Booking>, StoreError>;
    /// Removes the booking and its tickets. Returns false when absent.
    async fn delete_booking(&mut self, id: Uuid) -> Result<bool, StoreError>;

    async fn insert_review(&mut self, review: &Review) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Storage seam for reference data. These are single-row operations with
/// no cross-entity invariants, so they commit individually instead of
/// going through a [`LedgerTx`].
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn insert_airplane(&self, airplane: &Airplane) -> Result<(), StoreError>;
    async fn update_airplane(&self, airplane: &Airplane) -> Result<(), StoreError>;
    async fn delete_airplane(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn airplane(&self, id: Uuid) -> Result<Option<Airplane>, StoreError>;
    async fn airplane_by_tail_number(&self, tail: &str) -> Result<Option<Airplane>, StoreError>;
    async fn airplanes(&self) -> Result<Vec<Airplane>, StoreError>;

    async fn insert_airport(&self, airport: &Airport) -> Result<(), StoreError>;
    async fn update_airport(&self, airport: &Airport) -> Result<(), StoreError>;
    async fn delete_airport(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn airport(&self, id: Uuid) -> Result<Option<Airport>, StoreError>;
    async fn airport_by_code(&self, code: &str) -> Result<Option<Airport>, StoreError>;
    async fn airports(&self) -> Result<Vec<Airport>, StoreError>;

    async fn insert_flight(&self, flight: &Flight) -> Result<(), StoreError>;
    async fn update_flight(&self, flight: &Flight) -> Result<(), StoreError>;
    async fn delete_flight(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn flight(&self, id: Uuid) -> Result<Option<Flight>, StoreError>;
    async fn flights(&self) -> Result<Vec<Flight>, StoreError>;
    async fn flights_by_route(
        &self,
        from_airport_id: Uuid,
        to_airport_id: Uuid,
    ) -> Result<Vec<Flight>, StoreError>;
}
