//! OpenSky Network data access.
//!
//! This module defines the records returned by the three upstream endpoints
//! the pipeline uses (bulk state vectors, per-aircraft metadata, flights by
//! aircraft) and the [`FlightDataSource`] seam the pipeline talks through.

mod client;
mod types;

pub use client::{Credentials, OpenSkyClient, DEFAULT_API_BASE_URL};
pub use types::{AircraftRecord, FlightRecord, StateVector};

use async_trait::async_trait;

use crate::error::FetchError;

/// Remote source of flight data.
///
/// [`OpenSkyClient`] is the production implementation. `Ok(None)` and empty
/// vectors mean the upstream answered but had nothing for the aircraft.
#[async_trait]
pub trait FlightDataSource: Send + Sync + std::fmt::Debug {
    /// Fetch every current state vector.
    async fn fetch_states(&self) -> Result<Vec<StateVector>, FetchError>;

    /// Fetch registry metadata for one aircraft.
    async fn fetch_aircraft(&self, icao24: &str) -> Result<Option<AircraftRecord>, FetchError>;

    /// Fetch flights flown by one aircraft in the `[begin, end)` Unix-time window.
    async fn fetch_flights(&self, icao24: &str, begin: i64, end: i64) -> Result<Vec<FlightRecord>, FetchError>;
}
