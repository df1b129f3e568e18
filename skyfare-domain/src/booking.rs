use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::DomainError;

/// One reservation event. The booking owns its tickets outright: tickets
/// are created here and removed only when the whole booking is deleted.
/// There is no independent ticket surface anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub booking_time: DateTime<Utc>,
    pub total_amount: Decimal,
    pub tickets: Vec<Ticket>,
}

impl Booking {
    /// Builds a booking with one ticket per passenger, preserving the
    /// input order. Callers are expected to have validated the manifest
    /// (see `BookingRequest::validate`) and priced `total_amount`.
    pub fn create(
        user_id: Uuid,
        flight_id: Uuid,
        total_amount: Decimal,
        passengers: Vec<PassengerSpec>,
    ) -> Self {
        let tickets = passengers
            .into_iter()
            .map(|p| Ticket {
                passenger_name: p.name,
                passenger_age: p.age,
                passenger_gender: p.gender,
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            user_id,
            flight_id,
            booking_time: Utc::now(),
            total_amount,
            tickets,
        }
    }
}

/// One passenger's seat record within a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub passenger_name: String,
    pub passenger_age: i32,
    pub passenger_gender: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub flight_id: Uuid,
    pub passengers: Vec<PassengerSpec>,
}

impl BookingRequest {
    /// Checks the passenger manifest without touching any stored state.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.passengers.is_empty() {
            return Err(DomainError::Validation(
                "at least one passenger is required".into(),
            ));
        }
        for passenger in &self.passengers {
            passenger.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PassengerSpec {
    pub name: String,
    pub age: i32,
    pub gender: String,
}

impl PassengerSpec {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation(
                "passenger name must not be blank".into(),
            ));
        }
        if self.age < 0 {
            return Err(DomainError::Validation(format!(
                "passenger age must not be negative, got {}",
                self.age
            )));
        }
        if self.gender.trim().is_empty() {
            return Err(DomainError::Validation(
                "passenger gender must not be blank".into(),
            ));
        }
        Ok(())
    }
}
