use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use skyfare_domain::{Airplane, Airport, Booking, Flight, Review, Role, Ticket, User, Wallet};

use crate::repository::{DirectoryStore, LedgerStore, LedgerTx};
use crate::StoreError;

/// Postgres-backed store. Wallet and booking rows are locked with
/// `SELECT ... FOR UPDATE` inside the transaction, so concurrent units of
/// work touching the same wallet serialize at the database.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        info!("running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {}", e)))?;
        info!("migrations complete");
        Ok(())
    }
}

fn conflict_or(err: sqlx::Error, message: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) => {
            StoreError::Conflict(message.to_string())
        }
        _ => StoreError::Database(err),
    }
}

// ===== Row mapping =====

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    gender: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, StoreError> {
        let role = Role::parse(&self.role).ok_or_else(|| {
            StoreError::Backend(format!("unknown role in users row: {}", self.role))
        })?;
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            gender: self.gender,
            role,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct WalletRow {
    id: Uuid,
    user_id: Uuid,
    balance: Decimal,
    updated_at: DateTime<Utc>,
}

impl WalletRow {
    fn into_wallet(self) -> Wallet {
        Wallet::from_parts(self.id, self.user_id, self.balance, self.updated_at)
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    flight_id: Uuid,
    booking_time: DateTime<Utc>,
    total_amount: Decimal,
}

impl BookingRow {
    fn into_booking(self, tickets: Vec<Ticket>) -> Booking {
        Booking {
            id: self.id,
            user_id: self.user_id,
            flight_id: self.flight_id,
            booking_time: self.booking_time,
            total_amount: self.total_amount,
            tickets,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    passenger_name: String,
    passenger_age: i32,
    passenger_gender: String,
}

async fn tickets_for<'e, E>(executor: E, booking_id: Uuid) -> Result<Vec<Ticket>, StoreError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let rows: Vec<TicketRow> = sqlx::query_as::<_, TicketRow>(
        "SELECT passenger_name, passenger_age, passenger_gender \
         FROM tickets WHERE booking_id = $1 ORDER BY position",
    )
    .bind(booking_id)
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|t| Ticket {
            passenger_name: t.passenger_name,
            passenger_age: t.passenger_age,
            passenger_gender: t.passenger_gender,
        })
        .collect())
}

// ===== Unit of work =====

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgTx {
    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, gender, role, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.gender)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| conflict_or(e, "email already registered"))?;
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET name = $2, email = $3, password_hash = $4, gender = $5, role = $6 \
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.gender)
        .bind(user.role.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| conflict_or(e, "email already registered"))?;
        Ok(())
    }

    async fn delete_user(&mut self, user_id: Uuid) -> Result<bool, StoreError> {
        // Wallet, bookings, tickets, and reviews go with the user via
        // ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn wallet_for_update(&mut self, user_id: Uuid) -> Result<Option<Wallet>, StoreError> {
        let row = sqlx::query_as::<_, WalletRow>(
            "SELECT id, user_id, balance, updated_at FROM wallets \
             WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(WalletRow::into_wallet))
    }

    async fn save_wallet(&mut self, wallet: &Wallet) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO wallets (id, user_id, balance, updated_at) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id) DO UPDATE \
             SET balance = EXCLUDED.balance, updated_at = EXCLUDED.updated_at",
        )
        .bind(wallet.id)
        .bind(wallet.user_id)
        .bind(wallet.balance())
        .bind(wallet.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO bookings (id, user_id, flight_id, booking_time, total_amount) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.flight_id)
        .bind(booking.booking_time)
        .bind(booking.total_amount)
        .execute(&mut *self.tx)
        .await?;

        for (position, ticket) in booking.tickets.iter().enumerate() {
            sqlx::query(
                "INSERT INTO tickets (booking_id, position, passenger_name, passenger_age, passenger_gender) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(booking.id)
            .bind(position as i32)
            .bind(&ticket.passenger_name)
            .bind(ticket.passenger_age)
            .bind(&ticket.passenger_gender)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn booking_for_update(&mut self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(
            "SELECT id, user_id, flight_id, booking_time, total_amount FROM bookings \
             WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        match row {
            Some(row) => {
                let tickets = tickets_for(&mut *self.tx, id).await?;
                Ok(Some(row.into_booking(tickets)))
            }
            None => Ok(None),
        }
    }

    async fn delete_booking(&mut self, id: Uuid) -> Result<bool, StoreError> {
        // Tickets cascade with the booking row.
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_review(&mut self, review: &Review) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO reviews (id, user_id, flight_id, rating, text, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(review.id)
        .bind(review.user_id)
        .bind(review.flight_id)
        .bind(review.rating)
        .bind(&review.text)
        .bind(review.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx + '_>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, password_hash, gender, role, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, password_hash, gender, role, created_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, password_hash, gender, role, created_at \
             FROM users ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn wallet_for_user(&self, user_id: Uuid) -> Result<Option<Wallet>, StoreError> {
        let row = sqlx::query_as::<_, WalletRow>(
            "SELECT id, user_id, balance, updated_at FROM wallets WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(WalletRow::into_wallet))
    }

    async fn booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(
            "SELECT id, user_id, flight_id, booking_time, total_amount \
             FROM bookings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let tickets = tickets_for(&self.pool, id).await?;
                Ok(Some(row.into_booking(tickets)))
            }
            None => Ok(None),
        }
    }

    async fn bookings(&self) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            "SELECT id, user_id, flight_id, booking_time, total_amount \
             FROM bookings ORDER BY booking_time, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut bookings = Vec::with_capacity(rows.len());
        for row in rows {
            let tickets = tickets_for(&self.pool, row.id).await?;
            bookings.push(row.into_booking(tickets));
        }
        Ok(bookings)
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            "SELECT id, user_id, flight_id, booking_time, total_amount \
             FROM bookings WHERE user_id = $1 ORDER BY booking_time, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut bookings = Vec::with_capacity(rows.len());
        for row in rows {
            let tickets = tickets_for(&self.pool, row.id).await?;
            bookings.push(row.into_booking(tickets));
        }
        Ok(bookings)
    }

    async fn user_has_booked_flight(
        &self,
        user_id: Uuid,
        flight_id: Uuid,
    ) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE user_id = $1 AND flight_id = $2)",
        )
        .bind(user_id)
        .bind(flight_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn reviews_for_flight(&self, flight_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, user_id, flight_id, rating, text, created_at \
             FROM reviews WHERE flight_id = $1 ORDER BY created_at, id",
        )
        .bind(flight_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ReviewRow::into_review).collect())
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    user_id: Uuid,
    flight_id: Uuid,
    rating: f32,
    text: String,
    created_at: DateTime<Utc>,
}

impl ReviewRow {
    fn into_review(self) -> Review {
        Review {
            id: self.id,
            user_id: self.user_id,
            flight_id: self.flight_id,
            rating: self.rating,
            text: self.text,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    airline: String,
    airplane_id: Uuid,
    from_airport_id: Uuid,
    to_airport_id: Uuid,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    price: Decimal,
}

impl FlightRow {
    fn into_flight(self) -> Flight {
        Flight {
            id: self.id,
            airline: self.airline,
            airplane_id: self.airplane_id,
            from_airport_id: self.from_airport_id,
            to_airport_id: self.to_airport_id,
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            price: self.price,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AirportRow {
    id: Uuid,
    code: String,
    name: String,
    city: String,
    state: String,
    country: String,
}

impl AirportRow {
    fn into_airport(self) -> Airport {
        Airport {
            id: self.id,
            code: self.code,
            name: self.name,
            city: self.city,
            state: self.state,
            country: self.country,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AirplaneRow {
    id: Uuid,
    name: String,
    tail_number: String,
    model: String,
    manufacturer: String,
    capacity: i32,
}

impl AirplaneRow {
    fn into_airplane(self) -> Airplane {
        Airplane {
            id: self.id,
            name: self.name,
            tail_number: self.tail_number,
            model: self.model,
            manufacturer: self.manufacturer,
            capacity: self.capacity,
        }
    }
}

#[async_trait]
impl DirectoryStore for PgStore {
    async fn insert_airplane(&self, airplane: &Airplane) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO airplanes (id, name, tail_number, model, manufacturer, capacity) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(airplane.id)
        .bind(&airplane.name)
        .bind(&airplane.tail_number)
        .bind(&airplane.model)
        .bind(&airplane.manufacturer)
        .bind(airplane.capacity)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or(e, "tail number already registered"))?;
        Ok(())
    }

    async fn update_airplane(&self, airplane: &Airplane) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE airplanes SET name = $2, tail_number = $3, model = $4, manufacturer = $5, capacity = $6 \
             WHERE id = $1",
        )
        .bind(airplane.id)
        .bind(&airplane.name)
        .bind(&airplane.tail_number)
        .bind(&airplane.model)
        .bind(&airplane.manufacturer)
        .bind(airplane.capacity)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or(e, "tail number already registered"))?;
        Ok(())
    }

    async fn delete_airplane(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM airplanes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn airplane(&self, id: Uuid) -> Result<Option<Airplane>, StoreError> {
        let row = sqlx::query_as::<_, AirplaneRow>(
            "SELECT id, name, tail_number, model, manufacturer, capacity \
             FROM airplanes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(AirplaneRow::into_airplane))
    }

    async fn airplane_by_tail_number(&self, tail: &str) -> Result<Option<Airplane>, StoreError> {
        let row = sqlx::query_as::<_, AirplaneRow>(
            "SELECT id, name, tail_number, model, manufacturer, capacity \
             FROM airplanes WHERE tail_number = $1",
        )
        .bind(tail)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(AirplaneRow::into_airplane))
    }

    async fn airplanes(&self) -> Result<Vec<Airplane>, StoreError> {
        let rows = sqlx::query_as::<_, AirplaneRow>(
            "SELECT id, name, tail_number, model, manufacturer, capacity \
             FROM airplanes ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AirplaneRow::into_airplane).collect())
    }

    async fn insert_airport(&self, airport: &Airport) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO airports (id, code, name, city, state, country) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(airport.id)
        .bind(&airport.code)
        .bind(&airport.name)
        .bind(&airport.city)
        .bind(&airport.state)
        .bind(&airport.country)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or(e, "airport code already registered"))?;
        Ok(())
    }

    async fn update_airport(&self, airport: &Airport) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE airports SET code = $2, name = $3, city = $4, state = $5, country = $6 \
             WHERE id = $1",
        )
        .bind(airport.id)
        .bind(&airport.code)
        .bind(&airport.name)
        .bind(&airport.city)
        .bind(&airport.state)
        .bind(&airport.country)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or(e, "airport code already registered"))?;
        Ok(())
    }

    async fn delete_airport(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM airports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn airport(&self, id: Uuid) -> Result<Option<Airport>, StoreError> {
        let row = sqlx::query_as::<_, AirportRow>(
            "SELECT id, code, name, city, state, country FROM airports WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(AirportRow::into_airport))
    }

    async fn airport_by_code(&self, code: &str) -> Result<Option<Airport>, StoreError> {
        let row = sqlx::query_as::<_, AirportRow>(
            "SELECT id, code, name, city, state, country FROM airports WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(AirportRow::into_airport))
    }

    async fn airports(&self) -> Result<Vec<Airport>, StoreError> {
        let rows = sqlx::query_as::<_, AirportRow>(
            "SELECT id, code, name, city, state, country FROM airports ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AirportRow::into_airport).collect())
    }

    async fn insert_flight(&self, flight: &Flight) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO flights (id, airline, airplane_id, from_airport_id, to_airport_id, departure_time, arrival_time, price) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(flight.id)
        .bind(&flight.airline)
        .bind(flight.airplane_id)
        .bind(flight.from_airport_id)
        .bind(flight.to_airport_id)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.price)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_flight(&self, flight: &Flight) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE flights SET airline = $2, airplane_id = $3, from_airport_id = $4, to_airport_id = $5, \
             departure_time = $6, arrival_time = $7, price = $8 WHERE id = $1",
        )
        .bind(flight.id)
        .bind(&flight.airline)
        .bind(flight.airplane_id)
        .bind(flight.from_airport_id)
        .bind(flight.to_airport_id)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.price)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_flight(&self, id: Uuid) -> Result<bool, StoreError> {
        // Flight-scoped reviews cascade; historical bookings keep their
        // flight id.
        let result = sqlx::query("DELETE FROM flights WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn flight(&self, id: Uuid) -> Result<Option<Flight>, StoreError> {
        let row = sqlx::query_as::<_, FlightRow>(
            "SELECT id, airline, airplane_id, from_airport_id, to_airport_id, departure_time, arrival_time, price \
             FROM flights WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(FlightRow::into_flight))
    }

    async fn flights(&self) -> Result<Vec<Flight>, StoreError> {
        let rows = sqlx::query_as::<_, FlightRow>(
            "SELECT id, airline, airplane_id, from_airport_id, to_airport_id, departure_time, arrival_time, price \
             FROM flights ORDER BY departure_time, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(FlightRow::into_flight).collect())
    }

    async fn flights_by_route(
        &self,
        from_airport_id: Uuid,
        to_airport_id: Uuid,
    ) -> Result<Vec<Flight>, StoreError> {
        let rows = sqlx::query_as::<_, FlightRow>(
            "SELECT id, airline, airplane_id, from_airport_id, to_airport_id, departure_time, arrival_time, price \
             FROM flights WHERE from_airport_id = $1 AND to_airport_id = $2 ORDER BY departure_time, id",
        )
        .bind(from_airport_id)
        .bind(to_airport_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(FlightRow::into_flight).collect())
    }
}
