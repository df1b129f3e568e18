use std::collections::HashMap;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use skyfare_domain::{Airplane, Airport, Booking, Flight, Review, User, Wallet};

use crate::repository::{DirectoryStore, LedgerStore, LedgerTx};
use crate::StoreError;

/// Mutation sites where a fault can be armed with
/// [`MemoryStore::fail_next`]. Lets tests prove that a failure inside the
/// unit of work leaves no partial state behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    SaveWallet,
    InsertBooking,
    DeleteBooking,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct State {
    users: HashMap<Uuid, User>,
    // keyed by owning user id; a user has exactly one wallet
    wallets: HashMap<Uuid, Wallet>,
    bookings: HashMap<Uuid, Booking>,
    airplanes: HashMap<Uuid, Airplane>,
    airports: HashMap<Uuid, Airport>,
    flights: HashMap<Uuid, Flight>,
    reviews: HashMap<Uuid, Review>,
}

/// In-memory backend. Transactions take the single state lock for their
/// whole lifetime and stage writes against a snapshot that replaces the
/// live state on commit, so units of work are fully serialized and a
/// dropped transaction leaves nothing behind.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fault: StdMutex<Option<FaultPoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a one-shot fault: the next transaction operation matching
    /// `point` fails with a backend error, after which the store behaves
    /// normally again.
    pub fn fail_next(&self, point: FaultPoint) {
        *self.fault.lock().unwrap_or_else(|e| e.into_inner()) = Some(point);
    }
}

struct MemoryTx<'a> {
    guard: MutexGuard<'a, State>,
    staged: State,
    fault: &'a StdMutex<Option<FaultPoint>>,
}

impl MemoryTx<'_> {
    fn trip(&mut self, point: FaultPoint) -> Result<(), StoreError> {
        let mut armed = self.fault.lock().unwrap_or_else(|e| e.into_inner());
        if *armed == Some(point) {
            *armed = None;
            return Err(StoreError::Backend(format!("injected fault at {:?}", point)));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerTx for MemoryTx<'_> {
    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        if self.staged.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                user.email
            )));
        }
        self.staged.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<(), StoreError> {
        if self
            .staged
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                user.email
            )));
        }
        self.staged.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&mut self, user_id: Uuid) -> Result<bool, StoreError> {
        if self.staged.users.remove(&user_id).is_none() {
            return Ok(false);
        }
        self.staged.wallets.remove(&user_id);
        self.staged.bookings.retain(|_, b| b.user_id != user_id);
        self.staged.reviews.retain(|_, r| r.user_id != user_id);
        Ok(true)
    }

    async fn wallet_for_update(&mut self, user_id: Uuid) -> Result<Option<Wallet>, StoreError> {
        // The state lock is already held for the lifetime of this
        // transaction, which is as exclusive as a row lock gets.
        Ok(self.staged.wallets.get(&user_id).cloned())
    }

    async fn save_wallet(&mut self, wallet: &Wallet) -> Result<(), StoreError> {
        self.trip(FaultPoint::SaveWallet)?;
        self.staged.wallets.insert(wallet.user_id, wallet.clone());
        Ok(())
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<(), StoreError> {
        self.trip(FaultPoint::InsertBooking)?;
        self.staged.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn booking_for_update(&mut self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.staged.bookings.get(&id).cloned())
    }

    async fn delete_booking(&mut self, id: Uuid) -> Result<bool, StoreError> {
        self.trip(FaultPoint::DeleteBooking)?;
        // Tickets live inside the booking value, so removing it removes
        // them with it.
        Ok(self.staged.bookings.remove(&id).is_some())
    }

    async fn insert_review(&mut self, review: &Review) -> Result<(), StoreError> {
        self.staged.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        self.trip(FaultPoint::Commit)?;
        let MemoryTx { mut guard, staged, .. } = *self;
        *guard = staged;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx + '_>, StoreError> {
        let guard = self.state.lock().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            staged,
            fault: &self.fault,
        }))
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn users(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.state.lock().await.users.values().cloned().collect();
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(users)
    }

    async fn wallet_for_user(&self, user_id: Uuid) -> Result<Option<Wallet>, StoreError> {
        Ok(self.state.lock().await.wallets.get(&user_id).cloned())
    }

    async fn booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.state.lock().await.bookings.get(&id).cloned())
    }

    async fn bookings(&self) -> Result<Vec<Booking>, StoreError> {
        let mut bookings: Vec<Booking> =
            self.state.lock().await.bookings.values().cloned().collect();
        bookings.sort_by_key(|b| (b.booking_time, b.id));
        Ok(bookings)
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        let mut bookings: Vec<Booking> = self
            .state
            .lock()
            .await
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| (b.booking_time, b.id));
        Ok(bookings)
    }

    async fn user_has_booked_flight(
        &self,
        user_id: Uuid,
        flight_id: Uuid,
    ) -> Result<bool, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .bookings
            .values()
            .any(|b| b.user_id == user_id && b.flight_id == flight_id))
    }

    async fn reviews_for_flight(&self, flight_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let mut reviews: Vec<Review> = self
            .state
            .lock()
            .await
            .reviews
            .values()
            .filter(|r| r.flight_id == flight_id)
            .cloned()
            .collect();
        reviews.sort_by_key(|r| (r.created_at, r.id));
        Ok(reviews)
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn insert_airplane(&self, airplane: &Airplane) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state
            .airplanes
            .values()
            .any(|a| a.tail_number == airplane.tail_number)
        {
            return Err(StoreError::Conflict(format!(
                "tail number {} already registered",
                airplane.tail_number
            )));
        }
        state.airplanes.insert(airplane.id, airplane.clone());
        Ok(())
    }

    async fn update_airplane(&self, airplane: &Airplane) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state
            .airplanes
            .values()
            .any(|a| a.id != airplane.id && a.tail_number == airplane.tail_number)
        {
            return Err(StoreError::Conflict(format!(
                "tail number {} already registered",
                airplane.tail_number
            )));
        }
        state.airplanes.insert(airplane.id, airplane.clone());
        Ok(())
    }

    async fn delete_airplane(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.airplanes.remove(&id).is_some())
    }

    async fn airplane(&self, id: Uuid) -> Result<Option<Airplane>, StoreError> {
        Ok(self.state.lock().await.airplanes.get(&id).cloned())
    }

    async fn airplane_by_tail_number(&self, tail: &str) -> Result<Option<Airplane>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .airplanes
            .values()
            .find(|a| a.tail_number == tail)
            .cloned())
    }

    async fn airplanes(&self) -> Result<Vec<Airplane>, StoreError> {
        let mut airplanes: Vec<Airplane> =
            self.state.lock().await.airplanes.values().cloned().collect();
        airplanes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(airplanes)
    }

    async fn insert_airport(&self, airport: &Airport) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.airports.values().any(|a| a.code == airport.code) {
            return Err(StoreError::Conflict(format!(
                "airport code {} already registered",
                airport.code
            )));
        }
        state.airports.insert(airport.id, airport.clone());
        Ok(())
    }

    async fn update_airport(&self, airport: &Airport) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state
            .airports
            .values()
            .any(|a| a.id != airport.id && a.code == airport.code)
        {
            return Err(StoreError::Conflict(format!(
                "airport code {} already registered",
                airport.code
            )));
        }
        state.airports.insert(airport.id, airport.clone());
        Ok(())
    }

    async fn delete_airport(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.airports.remove(&id).is_some())
    }

    async fn airport(&self, id: Uuid) -> Result<Option<Airport>, StoreError> {
        Ok(self.state.lock().await.airports.get(&id).cloned())
    }

    async fn airport_by_code(&self, code: &str) -> Result<Option<Airport>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .airports
            .values()
            .find(|a| a.code == code)
            .cloned())
    }

    async fn airports(&self) -> Result<Vec<Airport>, StoreError> {
        let mut airports: Vec<Airport> =
            self.state.lock().await.airports.values().cloned().collect();
        airports.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(airports)
    }

    async fn insert_flight(&self, flight: &Flight) -> Result<(), StoreError> {
        self.state
            .lock()
            .await
            .flights
            .insert(flight.id, flight.clone());
        Ok(())
    }

    async fn update_flight(&self, flight: &Flight) -> Result<(), StoreError> {
        self.state
            .lock()
            .await
            .flights
            .insert(flight.id, flight.clone());
        Ok(())
    }

    async fn delete_flight(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let removed = state.flights.remove(&id).is_some();
        if removed {
            // Reviews are flight-scoped; bookings keep their flight id
            // for history.
            state.reviews.retain(|_, r| r.flight_id != id);
        }
        Ok(removed)
    }

    async fn flight(&self, id: Uuid) -> Result<Option<Flight>, StoreError> {
        Ok(self.state.lock().await.flights.get(&id).cloned())
    }

    async fn flights(&self) -> Result<Vec<Flight>, StoreError> {
        let mut flights: Vec<Flight> = self.state.lock().await.flights.values().cloned().collect();
        flights.sort_by_key(|f| (f.departure_time, f.id));
        Ok(flights)
    }

    async fn flights_by_route(
        &self,
        from_airport_id: Uuid,
        to_airport_id: Uuid,
    ) -> Result<Vec<Flight>, StoreError> {
        let mut flights: Vec<Flight> = self
            .state
            .lock()
            .await
            .flights
            .values()
            .filter(|f| f.from_airport_id == from_airport_id && f.to_airport_id == to_airport_id)
            .cloned()
            .collect();
        flights.sort_by_key(|f| (f.departure_time, f.id));
        Ok(flights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use skyfare_domain::{PassengerSpec, Role};

    fn sample_user(email: &str) -> User {
        User::new(
            "Ada".into(),
            email.into(),
            "hash".into(),
            "female".into(),
            Role::CUSTOMER,
        )
    }

    fn sample_booking(user_id: Uuid, flight_id: Uuid) -> Booking {
        Booking::create(
            user_id,
            flight_id,
            Decimal::new(10000, 2),
            vec![PassengerSpec {
                name: "Ada".into(),
                age: 36,
                gender: "female".into(),
            }],
        )
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let store = MemoryStore::new();
        let user = sample_user("ada@example.com");
        let wallet = Wallet::new(user.id);

        let mut tx = store.begin().await.unwrap();
        tx.insert_user(&user).await.unwrap();
        tx.save_wallet(&wallet).await.unwrap();
        tx.commit().await.unwrap();

        assert!(store.user(user.id).await.unwrap().is_some());
        let stored = store.wallet_for_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.balance(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_drop_without_commit_rolls_back() {
        let store = MemoryStore::new();
        let user = sample_user("ada@example.com");

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_user(&user).await.unwrap();
            // dropped here without commit
        }

        assert!(store.user(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_injected_fault_is_one_shot() {
        let store = MemoryStore::new();
        let booking = sample_booking(Uuid::new_v4(), Uuid::new_v4());

        store.fail_next(FaultPoint::InsertBooking);
        {
            let mut tx = store.begin().await.unwrap();
            let err = tx.insert_booking(&booking).await.unwrap_err();
            assert!(matches!(err, StoreError::Backend(_)));
        }
        assert!(store.booking(booking.id).await.unwrap().is_none());

        let mut tx = store.begin().await.unwrap();
        tx.insert_booking(&booking).await.unwrap();
        tx.commit().await.unwrap();
        assert!(store.booking(booking.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_commit_fault_discards_staged_writes() {
        let store = MemoryStore::new();
        let user = sample_user("ada@example.com");

        store.fail_next(FaultPoint::Commit);
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_user(&user).await.unwrap();
            let err = tx.commit().await.unwrap_err();
            assert!(matches!(err, StoreError::Backend(_)));
        }

        assert!(store.user(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let first = sample_user("ada@example.com");
        let second = sample_user("ada@example.com");

        let mut tx = store.begin().await.unwrap();
        tx.insert_user(&first).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let err = tx.insert_user(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let store = MemoryStore::new();
        let user = sample_user("ada@example.com");
        let wallet = Wallet::new(user.id);
        let booking = sample_booking(user.id, Uuid::new_v4());

        let mut tx = store.begin().await.unwrap();
        tx.insert_user(&user).await.unwrap();
        tx.save_wallet(&wallet).await.unwrap();
        tx.insert_booking(&booking).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.delete_user(user.id).await.unwrap());
        tx.commit().await.unwrap();

        assert!(store.user(user.id).await.unwrap().is_none());
        assert!(store.wallet_for_user(user.id).await.unwrap().is_none());
        assert!(store.bookings_for_user(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_airport_code_conflicts() {
        let store = MemoryStore::new();
        let airport = Airport {
            id: Uuid::new_v4(),
            code: "LHR".into(),
            name: "Heathrow".into(),
            city: "London".into(),
            state: "Greater London".into(),
            country: "United Kingdom".into(),
        };
        store.insert_airport(&airport).await.unwrap();

        let duplicate = Airport {
            id: Uuid::new_v4(),
            ..airport.clone()
        };
        let err = store.insert_airport(&duplicate).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_user_has_booked_flight() {
        let store = MemoryStore::new();
        let user = sample_user("ada@example.com");
        let flight_id = Uuid::new_v4();
        let booking = sample_booking(user.id, flight_id);

        let mut tx = store.begin().await.unwrap();
        tx.insert_user(&user).await.unwrap();
        tx.insert_booking(&booking).await.unwrap();
        tx.commit().await.unwrap();

        assert!(store
            .user_has_booked_flight(user.id, flight_id)
            .await
            .unwrap());
        assert!(!store
            .user_has_booked_flight(user.id, Uuid::new_v4())
            .await
            .unwrap());
    }
}
