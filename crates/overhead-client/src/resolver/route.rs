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

//! Best-effort destination labels from recent flight history.
//!
//! The flights-by-aircraft endpoint is queried over a trailing window. The
//! last returned flight is taken as the current one; its estimated airports
//! are mapped through the city table. Label preference:
//!
//! 1. arrival city, `"To <city>"`
//! 2. departure city, `"From <city>"`, also used when an arrival code exists
//!    but is not in the city table
//! 3. the trimmed callsign, when neither code maps to a city
//! 4. [`UNKNOWN_FLIGHT`]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, warn};

use crate::cache::TtlCache;
use crate::clock::Clock;
use crate::error::FetchError;
use crate::opensky::{FlightDataSource, FlightRecord};
use crate::tables;

/// Label used when neither route data nor a callsign is available.
pub const UNKNOWN_FLIGHT: &str = "Unknown Flight";

/// Estimated airports of an aircraft's most recent flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    pub arrival: Option<String>,
    pub departure: Option<String>,
}

impl Route {
    /// Route of the last (most recent) flight in a chronological list.
    #[must_use]
    pub fn from_flights(flights: &[FlightRecord]) -> Self {
        let Some(latest) = flights.last() else {
            return Self::default();
        };

        Self {
            arrival: non_blank(latest.est_arrival_airport.as_deref()),
            departure: non_blank(latest.est_departure_airport.as_deref()),
        }
    }
}

fn non_blank(code: Option<&str>) -> Option<String> {
    code.map(str::trim).filter(|c| !c.is_empty()).map(ToString::to_string)
}

/// Display label for a route, falling back to the callsign.
#[must_use]
pub fn route_label(route: &Route, callsign: &str) -> String {
    if let Some(city) = route.arrival.as_deref().and_then(tables::city_name) {
        return format!("To {city}");
    }
    if let Some(city) = route.departure.as_deref().and_then(tables::city_name) {
        return format!("From {city}");
    }

    let callsign = callsign.trim();
    if callsign.is_empty() {
        UNKNOWN_FLIGHT.to_string()
    } else {
        callsign.to_string()
    }
}

/// Route lookup with a per-aircraft cache.
pub struct RouteResolver {
    source: Arc<dyn FlightDataSource>,
    cache: TtlCache<String, Route>,
    window: Duration,
}

impl std::fmt::Debug for RouteResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteResolver")
            .field("cache", &self.cache)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl RouteResolver {
    /// Create a resolver querying the last `window` of flights.
    ///
    /// Entries live at least as long as the window; a shorter `cache_ttl` is
    /// raised to it.
    #[must_use]
    pub fn new(
        source: Arc<dyn FlightDataSource>,
        window: Duration,
        cache_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            cache: TtlCache::new(cache_ttl.max(window), clock),
            window,
        }
    }

    /// Look up the route for an aircraft. Failures yield an empty route.
    pub async fn resolve_route(&self, icao24: &str) -> Route {
        let key = icao24.trim().to_lowercase();
        if key.is_empty() {
            return Route::default();
        }

        let result = self
            .cache
            .get_or_try_fetch(&key, || async {
                let end = Utc::now().timestamp();
                let begin = end - i64::try_from(self.window.as_secs()).unwrap_or(i64::MAX);
                let flights = self.source.fetch_flights(&key, begin, end).await?;
                Ok::<_, FetchError>(Route::from_flights(&flights))
            })
            .await;

        result.unwrap_or_else(|e| {
            if e.is_timeout() {
                warn!("Route lookup for {} timed out", key);
            } else {
                debug!("Route unavailable for {}: {}", key, e);
            }
            Route::default()
        })
    }

    /// Resolve the display label for an aircraft.
    pub async fn resolve_label(&self, icao24: &str, callsign: &str) -> String {
        let route = self.resolve_route(icao24).await;
        route_label(&route, callsign)
    }

    /// Drop expired cache entries.
    pub fn purge_expired(&self) -> usize {
        self.cache.invalidate_expired()
    }
}
