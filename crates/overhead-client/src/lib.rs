// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Overhead flight client: which aircraft are flying near home right now.
//!
//! This library polls the OpenSky Network bulk state endpoint, keeps the
//! aircraft within a fixed radius of a home location, and enriches each one
//! with airline, flight number, aircraft type, and a destination label. It is
//! organised in layers that can be used on their own:
//!
//! - **Geo layer** ([`geo`]): haversine distance and the inclusive radius test
//! - **Cache layer** ([`cache`], [`gate`]): TTL cache with single-flight fetches,
//!   and the minimum-interval gate for bulk requests
//! - **Resolver layer** ([`resolver`]): best-effort metadata and route lookups
//! - **Source layer** ([`opensky`]): the REST client behind [`FlightDataSource`]
//! - **Pipeline** ([`pipeline`]): wires everything together per refresh
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use overhead_client::{OpenSkyClient, Pipeline, PipelineConfig, Trigger, DEFAULT_API_BASE_URL};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenSkyClient::new(DEFAULT_API_BASE_URL, None, Duration::from_secs(10))?;
//!     let pipeline = Pipeline::new(PipelineConfig::default(), Arc::new(client))?;
//!
//!     let snapshot = pipeline.run(Trigger::Scheduled).await;
//!     for record in &snapshot.records {
//!         println!("{} | {} {}", record.label, record.airline, record.flight_designator());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Using Individual Layers
//!
//! ```
//! use overhead_client::geo;
//! use overhead_client::resolver::{resolve_airline, resolve_flight_number};
//!
//! assert!(geo::is_within(37.3997, -121.9626, Some(37.40), Some(-121.96), 3.2));
//! assert_eq!(resolve_airline("UAL123"), "United Airlines");
//! assert_eq!(resolve_flight_number("UAL123"), "123");
//! ```

pub mod cache;
pub mod clock;
pub mod error;
pub mod gate;
pub mod geo;
pub mod opensky;
pub mod pipeline;
pub mod resolver;
pub mod tables;

#[cfg(test)]
mod testing;

pub use cache::TtlCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, FetchError};
pub use gate::{should_fetch, FetchGate, GateDecision, GateState, RateLimitAdvisory};
pub use opensky::{
    AircraftRecord, Credentials, FlightDataSource, FlightRecord, OpenSkyClient, StateVector,
    DEFAULT_API_BASE_URL,
};
pub use pipeline::{DisplayRecord, Pipeline, PipelineConfig, Snapshot, Trigger, DEFAULT_HOME, DEFAULT_RADIUS_KM};
pub use resolver::{MetadataResolver, Route, RouteResolver};
