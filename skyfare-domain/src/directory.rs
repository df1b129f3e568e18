use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airport {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airplane {
    pub id: Uuid,
    pub name: String,
    pub tail_number: String,
    pub model: String,
    pub manufacturer: String,
    pub capacity: i32,
}

/// Scheduled flight. Booking treats this as read-only reference data and
/// never copies it; bookings point at it by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub airline: String,
    pub airplane_id: Uuid,
    pub from_airport_id: Uuid,
    pub to_airport_id: Uuid,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price: Decimal,
}

impl Flight {
    pub fn has_departed(&self, now: DateTime<Utc>) -> bool {
        self.departure_time <= now
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirportSpec {
    pub code: String,
    pub name: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

impl AirportSpec {
    pub fn validate(&self) -> Result<(), DomainError> {
        for (field, value) in [
            ("code", &self.code),
            ("name", &self.name),
            ("city", &self.city),
            ("state", &self.state),
            ("country", &self.country),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::Validation(format!(
                    "airport {} must not be blank",
                    field
                )));
            }
        }
        Ok(())
    }

    /// Codes are matched case-insensitively; stored form is uppercase.
    pub fn normalized_code(&self) -> String {
        self.code.trim().to_uppercase()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirplaneSpec {
    pub name: String,
    pub tail_number: String,
    pub model: String,
    pub manufacturer: String,
    pub capacity: i32,
}

impl AirplaneSpec {
    pub fn validate(&self) -> Result<(), DomainError> {
        for (field, value) in [
            ("name", &self.name),
            ("tail_number", &self.tail_number),
            ("model", &self.model),
            ("manufacturer", &self.manufacturer),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::Validation(format!(
                    "airplane {} must not be blank",
                    field
                )));
            }
        }
        if self.capacity < 1 {
            return Err(DomainError::Validation(format!(
                "airplane capacity must be at least 1, got {}",
                self.capacity
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlightSpec {
    pub airline: String,
    pub airplane_id: Uuid,
    pub from_airport_id: Uuid,
    pub to_airport_id: Uuid,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price: Decimal,
}

impl FlightSpec {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.airline.trim().is_empty() {
            return Err(DomainError::Validation("airline must not be blank".into()));
        }
        if self.price <= Decimal::ZERO {
            return Err(DomainError::Validation(format!(
                "flight price must be positive, got {}",
                self.price
            )));
        }
        if self.departure_time >= self.arrival_time {
            return Err(DomainError::Validation(
                "departure must be before arrival".into(),
            ));
        }
        if self.from_airport_id == self.to_airport_id {
            return Err(DomainError::Validation(
                "departure and arrival airports must differ".into(),
            ));
        }
        Ok(())
    }
}
