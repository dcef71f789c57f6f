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

//! Airline, flight number, and aircraft type resolution.
//!
//! Airline and flight number come straight from the callsign. Aircraft type
//! tries the static type table first and falls back to the upstream metadata
//! endpoint, cached per ICAO24 address. Remote failures never reach the
//! caller; they degrade to [`UNKNOWN_TYPE`].

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::cache::TtlCache;
use crate::clock::Clock;
use crate::opensky::FlightDataSource;
use crate::tables;

/// Airline shown when the carrier prefix is not in the table.
pub const PRIVATE_AIRLINE: &str = "Private";
/// Flight number shown when the callsign has nothing after the prefix.
pub const UNKNOWN_FLIGHT_NUMBER: &str = "Unknown";
/// Aircraft type shown when neither lookup tier resolves.
pub const UNKNOWN_TYPE: &str = "Unknown Type";

const CARRIER_CODE_LEN: usize = 3;

/// Carrier prefix: the first three characters of the trimmed callsign.
#[must_use]
pub fn airline_code(callsign: &str) -> String {
    callsign.trim().chars().take(CARRIER_CODE_LEN).collect()
}

/// Airline name for a callsign, or [`PRIVATE_AIRLINE`].
#[must_use]
pub fn resolve_airline(callsign: &str) -> &'static str {
    tables::airline_name(&airline_code(callsign)).unwrap_or(PRIVATE_AIRLINE)
}

/// Everything after the carrier prefix, or [`UNKNOWN_FLIGHT_NUMBER`].
#[must_use]
pub fn resolve_flight_number(callsign: &str) -> String {
    let number: String = callsign.trim().chars().skip(CARRIER_CODE_LEN).collect();
    let number = number.trim();

    if number.is_empty() {
        UNKNOWN_FLIGHT_NUMBER.to_string()
    } else {
        number.to_string()
    }
}

/// Static tier of aircraft type resolution.
#[must_use]
pub fn static_aircraft_type(callsign: &str) -> Option<&'static str> {
    tables::aircraft_type_in(callsign.trim())
}

/// Aircraft type resolver with a cached remote fallback.
pub struct MetadataResolver {
    source: Arc<dyn FlightDataSource>,
    // icao24 -> type name; `None` caches "upstream knows nothing"
    cache: TtlCache<String, Option<String>>,
    static_lookup: bool,
    remote_lookup: bool,
}

impl std::fmt::Debug for MetadataResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataResolver")
            .field("cache", &self.cache)
            .field("static_lookup", &self.static_lookup)
            .field("remote_lookup", &self.remote_lookup)
            .finish_non_exhaustive()
    }
}

impl MetadataResolver {
    #[must_use]
    pub fn new(
        source: Arc<dyn FlightDataSource>,
        cache_ttl: Duration,
        clock: Arc<dyn Clock>,
        static_lookup: bool,
        remote_lookup: bool,
    ) -> Self {
        Self {
            source,
            cache: TtlCache::new(cache_ttl, clock),
            static_lookup,
            remote_lookup,
        }
    }

    /// Resolve an aircraft type name. Never fails.
    pub async fn resolve_aircraft_type(&self, callsign: &str, icao24: &str) -> String {
        if self.static_lookup {
            if let Some(name) = static_aircraft_type(callsign) {
                return name.to_string();
            }
        }

        if self.remote_lookup {
            if let Some(name) = self.fetch_remote_type(icao24).await {
                return name;
            }
        }

        UNKNOWN_TYPE.to_string()
    }

    async fn fetch_remote_type(&self, icao24: &str) -> Option<String> {
        let key = icao24.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }

        let result = self
            .cache
            .get_or_try_fetch(&key, || async {
                let record = self.source.fetch_aircraft(&key).await?;
                Ok::<_, crate::error::FetchError>(record.and_then(|r| r.type_name()))
            })
            .await;

        match result {
            Ok(name) => name,
            Err(e) => {
                if e.is_timeout() {
                    warn!("Aircraft metadata lookup for {} timed out", key);
                } else {
                    debug!("Aircraft metadata unavailable for {}: {}", key, e);
                }
                None
            }
        }
    }

    /// Drop expired cache entries.
    pub fn purge_expired(&self) -> usize {
        self.cache.invalidate_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::testing::FakeSource;
    use crate::opensky::AircraftRecord;

    fn resolver(source: Arc<FakeSource>, static_lookup: bool) -> MetadataResolver {
        MetadataResolver::new(
            source,
            Duration::from_secs(3600),
            Arc::new(ManualClock::new()),
            static_lookup,
            true,
        )
    }

    #[test]
    fn test_resolve_airline() {
        assert_eq!(resolve_airline("UAL123"), "United Airlines");
        assert_eq!(resolve_airline("  SWA2241 "), "Southwest");
        assert_eq!(resolve_airline("ZZZ1"), "Private");
        assert_eq!(resolve_airline(""), "Private");
    }

    #[test]
    fn test_resolve_flight_number() {
        assert_eq!(resolve_flight_number("UAL123"), "123");
        assert_eq!(resolve_flight_number("UAL123   "), "123");
        assert_eq!(resolve_flight_number("UAL"), "Unknown");
        assert_eq!(resolve_flight_number(""), "Unknown");
    }

    #[test]
    fn test_airline_code_handles_multibyte() {
        assert_eq!(airline_code("ÄBCD1"), "ÄBC");
        assert_eq!(airline_code("Y4"), "Y4");
    }

    #[tokio::test]
    async fn test_static_match_skips_remote() {
        let source = Arc::new(FakeSource::default());
        let resolver = resolver(source.clone(), true);

        let name = resolver.resolve_aircraft_type("N738B738", "a1b2c3").await;
        assert_eq!(name, "Boeing 737-800");
        assert_eq!(source.aircraft_calls(), 0);
    }

    #[tokio::test]
    async fn test_remote_fallback_is_cached() {
        let source = Arc::new(FakeSource::default().with_aircraft(
            "a1b2c3",
            AircraftRecord {
                model: Some("Boeing 737 MAX 8".to_string()),
                type_code: Some("B38M".to_string()),
            },
        ));
        let resolver = resolver(source.clone(), true);

        assert_eq!(resolver.resolve_aircraft_type("UAL123", "A1B2C3").await, "Boeing 737 MAX 8");
        assert_eq!(resolver.resolve_aircraft_type("UAL123", "a1b2c3").await, "Boeing 737 MAX 8");
        assert_eq!(source.aircraft_calls(), 1);
    }

    #[tokio::test]
    async fn test_static_lookup_can_be_bypassed() {
        let source = Arc::new(FakeSource::default().with_aircraft(
            "a1b2c3",
            AircraftRecord {
                model: None,
                type_code: Some("A320".to_string()),
            },
        ));
        let resolver = resolver(source.clone(), false);

        assert_eq!(resolver.resolve_aircraft_type("N738B738", "a1b2c3").await, "A320");
        assert_eq!(source.aircraft_calls(), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_degrades() {
        let source = Arc::new(FakeSource::default().failing_lookups());
        let resolver = resolver(source.clone(), true);

        assert_eq!(resolver.resolve_aircraft_type("UAL123", "a1b2c3").await, UNKNOWN_TYPE);
        // Failures are not cached, so the next cycle retries
        assert_eq!(resolver.resolve_aircraft_type("UAL123", "a1b2c3").await, UNKNOWN_TYPE);
        assert_eq!(source.aircraft_calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_aircraft_is_unknown_type() {
        let source = Arc::new(FakeSource::default());
        let resolver = resolver(source, true);
        assert_eq!(resolver.resolve_aircraft_type("ZZZ1", "ffffff").await, UNKNOWN_TYPE);
    }
}
