use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use skyfare_domain::{Airplane, AirplaneSpec, Airport, AirportSpec, Flight, FlightSpec};
use skyfare_store::DirectoryStore;

use crate::DirectoryError;

/// Management and lookup of reference data: airplanes, airports, and the
/// flight schedule. Customers only ever see flights that have not yet
/// departed; mutations are for administrators and are gated upstream.
pub struct DirectoryService {
    store: Arc<dyn DirectoryStore>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    // ===== Airplanes =====

    pub async fn add_airplane(&self, spec: AirplaneSpec) -> Result<Airplane, DirectoryError> {
        spec.validate()?;
        let airplane = Airplane {
            id: Uuid::new_v4(),
            name: spec.name,
            tail_number: spec.tail_number.trim().to_string(),
            model: spec.model,
            manufacturer: spec.manufacturer,
            capacity: spec.capacity,
        };
        self.store.insert_airplane(&airplane).await?;
        info!("registered airplane {} ({})", airplane.id, airplane.tail_number);
        Ok(airplane)
    }

    pub async fn update_airplane(
        &self,
        id: Uuid,
        spec: AirplaneSpec,
    ) -> Result<Airplane, DirectoryError> {
        spec.validate()?;
        if self.store.airplane(id).await?.is_none() {
            return Err(DirectoryError::NotFound("airplane"));
        }
        let airplane = Airplane {
            id,
            name: spec.name,
            tail_number: spec.tail_number.trim().to_string(),
            model: spec.model,
            manufacturer: spec.manufacturer,
            capacity: spec.capacity,
        };
        self.store.update_airplane(&airplane).await?;
        Ok(airplane)
    }

    pub async fn remove_airplane(&self, id: Uuid) -> Result<(), DirectoryError> {
        if !self.store.delete_airplane(id).await? {
            return Err(DirectoryError::NotFound("airplane"));
        }
        Ok(())
    }

    pub async fn airplane(&self, id: Uuid) -> Result<Airplane, DirectoryError> {
        self.store
            .airplane(id)
            .await?
            .ok_or(DirectoryError::NotFound("airplane"))
    }

    pub async fn airplanes(&self) -> Result<Vec<Airplane>, DirectoryError> {
        Ok(self.store.airplanes().await?)
    }

    // ===== Airports =====

    pub async fn add_airport(&self, spec: AirportSpec) -> Result<Airport, DirectoryError> {
        spec.validate()?;
        let airport = Airport {
            id: Uuid::new_v4(),
            code: spec.normalized_code(),
            name: spec.name,
            city: spec.city,
            state: spec.state,
            country: spec.country,
        };
        self.store.insert_airport(&airport).await?;
        info!("registered airport {} ({})", airport.id, airport.code);
        Ok(airport)
    }

    pub async fn update_airport(
        &self,
        id: Uuid,
        spec: AirportSpec,
    ) -> Result<Airport, DirectoryError> {
        spec.validate()?;
        if self.store.airport(id).await?.is_none() {
            return Err(DirectoryError::NotFound("airport"));
        }
        let airport = Airport {
            id,
            code: spec.normalized_code(),
            name: spec.name,
            city: spec.city,
            state: spec.state,
            country: spec.country,
        };
        self.store.update_airport(&airport).await?;
        Ok(airport)
    }

    pub async fn remove_airport(&self, id: Uuid) -> Result<(), DirectoryError> {
        if !self.store.delete_airport(id).await? {
            return Err(DirectoryError::NotFound("airport"));
        }
        Ok(())
    }

    pub async fn airport(&self, id: Uuid) -> Result<Airport, DirectoryError> {
        self.store
            .airport(id)
            .await?
            .ok_or(DirectoryError::NotFound("airport"))
    }

    pub async fn airports(&self) -> Result<Vec<Airport>, DirectoryError> {
        Ok(self.store.airports().await?)
    }

    // ===== Flights =====

    pub async fn add_flight(&self, spec: FlightSpec) -> Result<Flight, DirectoryError> {
        spec.validate()?;
        self.resolve_references(&spec).await?;
        let flight = Flight {
            id: Uuid::new_v4(),
            airline: spec.airline,
            airplane_id: spec.airplane_id,
            from_airport_id: spec.from_airport_id,
            to_airport_id: spec.to_airport_id,
            departure_time: spec.departure_time,
            arrival_time: spec.arrival_time,
            price: spec.price,
        };
        self.store.insert_flight(&flight).await?;
        info!(
            "scheduled flight {} from {} to {}",
            flight.id, flight.from_airport_id, flight.to_airport_id
        );
        Ok(flight)
    }

    pub async fn update_flight(&self, id: Uuid, spec: FlightSpec) -> Result<Flight, DirectoryError> {
        spec.validate()?;
        if self.store.flight(id).await?.is_none() {
            return Err(DirectoryError::NotFound("flight"));
        }
        self.resolve_references(&spec).await?;
        let flight = Flight {
            id,
            airline: spec.airline,
            airplane_id: spec.airplane_id,
            from_airport_id: spec.from_airport_id,
            to_airport_id: spec.to_airport_id,
            departure_time: spec.departure_time,
            arrival_time: spec.arrival_time,
            price: spec.price,
        };
        self.store.update_flight(&flight).await?;
        Ok(flight)
    }

    pub async fn remove_flight(&self, id: Uuid) -> Result<(), DirectoryError> {
        if !self.store.delete_flight(id).await? {
            return Err(DirectoryError::NotFound("flight"));
        }
        Ok(())
    }

    /// Flight by id. A flight whose departure time has passed is reported
    /// as departed rather than returned.
    pub async fn flight(&self, id: Uuid) -> Result<Flight, DirectoryError> {
        let flight = self.flight_record(id).await?;
        if flight.has_departed(Utc::now()) {
            return Err(DirectoryError::FlightDeparted(id));
        }
        Ok(flight)
    }

    /// Flight lookup without the departure cutoff. Review surfaces still
    /// reference flights that have already flown.
    pub async fn flight_record(&self, id: Uuid) -> Result<Flight, DirectoryError> {
        self.store
            .flight(id)
            .await?
            .ok_or(DirectoryError::NotFound("flight"))
    }

    /// All flights that have not yet departed, soonest first.
    pub async fn upcoming_flights(&self) -> Result<Vec<Flight>, DirectoryError> {
        let now = Utc::now();
        Ok(self
            .store
            .flights()
            .await?
            .into_iter()
            .filter(|f| !f.has_departed(now))
            .collect())
    }

    /// Future flights between two airports, optionally narrowed to a
    /// departure date.
    pub async fn search(
        &self,
        from_airport_id: Uuid,
        to_airport_id: Uuid,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Flight>, DirectoryError> {
        if self.store.airport(from_airport_id).await?.is_none()
            || self.store.airport(to_airport_id).await?.is_none()
        {
            return Err(DirectoryError::NotFound("airport"));
        }

        let now = Utc::now();
        Ok(self
            .store
            .flights_by_route(from_airport_id, to_airport_id)
            .await?
            .into_iter()
            .filter(|f| !f.has_departed(now))
            .filter(|f| date.map_or(true, |d| f.departure_time.date_naive() == d))
            .collect())
    }

    async fn resolve_references(&self, spec: &FlightSpec) -> Result<(), DirectoryError> {
        if self.store.airplane(spec.airplane_id).await?.is_none() {
            return Err(DirectoryError::NotFound("airplane"));
        }
        if self.store.airport(spec.from_airport_id).await?.is_none()
            || self.store.airport(spec.to_airport_id).await?.is_none()
        {
            return Err(DirectoryError::NotFound("airport"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use skyfare_store::MemoryStore;

    fn setup() -> DirectoryService {
        DirectoryService::new(Arc::new(MemoryStore::new()))
    }

    fn airplane_spec(tail: &str) -> AirplaneSpec {
        AirplaneSpec {
            name: "City Hopper".into(),
            tail_number: tail.into(),
            model: "A220-300".into(),
            manufacturer: "Airbus".into(),
            capacity: 140,
        }
    }

    fn airport_spec(code: &str, city: &str) -> AirportSpec {
        AirportSpec {
            code: code.into(),
            name: format!("{} International", city),
            city: city.into(),
            state: city.into(),
            country: "Testland".into(),
        }
    }

    fn flight_spec(airplane: &Airplane, from: &Airport, to: &Airport, hours_ahead: i64) -> FlightSpec {
        let departure = Utc::now() + Duration::hours(hours_ahead);
        FlightSpec {
            airline: "Skyfare Air".into(),
            airplane_id: airplane.id,
            from_airport_id: from.id,
            to_airport_id: to.id,
            departure_time: departure,
            arrival_time: departure + Duration::hours(2),
            price: Decimal::new(10000, 2),
        }
    }

    async fn seed_route(service: &DirectoryService) -> (Airplane, Airport, Airport) {
        let airplane = service.add_airplane(airplane_spec("N100SF")).await.unwrap();
        let from = service.add_airport(airport_spec("AAA", "Alpha")).await.unwrap();
        let to = service.add_airport(airport_spec("BBB", "Beta")).await.unwrap();
        (airplane, from, to)
    }

    #[tokio::test]
    async fn test_airplane_lifecycle() {
        let service = setup();

        let airplane = service.add_airplane(airplane_spec("N100SF")).await.unwrap();
        assert_eq!(service.airplane(airplane.id).await.unwrap().tail_number, "N100SF");
        assert_eq!(service.airplanes().await.unwrap().len(), 1);

        let mut updated = airplane_spec("N100SF");
        updated.capacity = 160;
        let airplane = service.update_airplane(airplane.id, updated).await.unwrap();
        assert_eq!(airplane.capacity, 160);

        service.remove_airplane(airplane.id).await.unwrap();
        assert!(matches!(
            service.remove_airplane(airplane.id).await.unwrap_err(),
            DirectoryError::NotFound("airplane")
        ));
    }

    #[tokio::test]
    async fn test_duplicate_tail_number_conflicts() {
        let service = setup();
        service.add_airplane(airplane_spec("N100SF")).await.unwrap();

        let err = service.add_airplane(airplane_spec("N100SF")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_airplane_spec_validation() {
        let service = setup();

        let mut bad = airplane_spec("N100SF");
        bad.capacity = 0;
        assert!(matches!(
            service.add_airplane(bad).await.unwrap_err(),
            DirectoryError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_airport_codes_normalize_and_conflict() {
        let service = setup();

        let airport = service.add_airport(airport_spec(" lhr ", "London")).await.unwrap();
        assert_eq!(airport.code, "LHR");

        // Same code in different case still collides.
        let err = service.add_airport(airport_spec("Lhr", "London")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_flight_requires_known_references() {
        let service = setup();
        let (airplane, from, to) = seed_route(&service).await;

        let mut ghost_plane = flight_spec(&airplane, &from, &to, 48);
        ghost_plane.airplane_id = Uuid::new_v4();
        assert!(matches!(
            service.add_flight(ghost_plane).await.unwrap_err(),
            DirectoryError::NotFound("airplane")
        ));

        let mut ghost_airport = flight_spec(&airplane, &from, &to, 48);
        ghost_airport.to_airport_id = Uuid::new_v4();
        assert!(matches!(
            service.add_flight(ghost_airport).await.unwrap_err(),
            DirectoryError::NotFound("airport")
        ));

        assert!(service.add_flight(flight_spec(&airplane, &from, &to, 48)).await.is_ok());
    }

    #[tokio::test]
    async fn test_upcoming_flights_hide_departed() {
        let service = setup();
        let (airplane, from, to) = seed_route(&service).await;

        let future = service
            .add_flight(flight_spec(&airplane, &from, &to, 48))
            .await
            .unwrap();
        let departed = service
            .add_flight(flight_spec(&airplane, &from, &to, -3))
            .await
            .unwrap();

        let upcoming = service.upcoming_flights().await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, future.id);

        assert!(service.flight(future.id).await.is_ok());
        assert!(matches!(
            service.flight(departed.id).await.unwrap_err(),
            DirectoryError::FlightDeparted(id) if id == departed.id
        ));
    }

    #[tokio::test]
    async fn test_search_by_route_and_date() {
        let service = setup();
        let (airplane, from, to) = seed_route(&service).await;
        let elsewhere = service.add_airport(airport_spec("CCC", "Gamma")).await.unwrap();

        let target = service
            .add_flight(flight_spec(&airplane, &from, &to, 72))
            .await
            .unwrap();
        // Same route, but already departed; other route entirely.
        service
            .add_flight(flight_spec(&airplane, &from, &to, -3))
            .await
            .unwrap();
        service
            .add_flight(flight_spec(&airplane, &from, &elsewhere, 72))
            .await
            .unwrap();

        let hits = service.search(from.id, to.id, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, target.id);

        let date = target.departure_time.date_naive();
        let dated = service.search(from.id, to.id, Some(date)).await.unwrap();
        assert_eq!(dated.len(), 1);

        let wrong_date = date + Duration::days(30);
        assert!(service
            .search(from.id, to.id, Some(wrong_date))
            .await
            .unwrap()
            .is_empty());

        assert!(matches!(
            service.search(Uuid::new_v4(), to.id, None).await.unwrap_err(),
            DirectoryError::NotFound("airport")
        ));
    }
}
