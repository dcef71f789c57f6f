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

//! Proximity filtering and enrichment pipeline.
//!
//! One [`Pipeline::run`] per refresh trigger:
//!
//! 1. obtain bulk state vectors, gated by [`FetchGate`] and cached in a [`TtlCache`]
//! 2. keep the ones within the configured radius of home
//! 3. resolve aircraft type and route label for each survivor, concurrently
//! 4. return [`DisplayRecord`]s in upstream order
//!
//! An empty record list with no error means clear skies. A bulk fetch failure
//! is reported in [`Snapshot::error`] and yields no records for that cycle.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, Semaphore};
use tokio::task::JoinSet;

use crate::cache::TtlCache;
use crate::clock::{Clock, SystemClock};
use crate::error::{ConfigError, FetchError};
use crate::gate::{FetchGate, GateDecision, GateState, RateLimitAdvisory};
use crate::geo;
use crate::opensky::{FlightDataSource, StateVector};
use crate::resolver::{
    airline_code, resolve_airline, resolve_flight_number, MetadataResolver, RouteResolver,
    UNKNOWN_FLIGHT_NUMBER,
};

/// Home location used when none is configured (near San Jose airport).
pub const DEFAULT_HOME: (f64, f64) = (37.399_746, -121.962_585);
/// Two statute miles.
pub const DEFAULT_RADIUS_KM: f64 = 3.2;

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Home latitude in degrees.
    pub home_latitude: f64,
    /// Home longitude in degrees.
    pub home_longitude: f64,
    /// Inclusion radius around home in kilometres.
    pub radius_km: f64,
    /// How long a bulk state snapshot is served before refetching.
    pub state_ttl: Duration,
    /// Minimum spacing between successful bulk fetches.
    pub min_refetch_interval: Duration,
    /// How long remote aircraft type answers are kept.
    pub metadata_ttl: Duration,
    /// Trailing window queried for route data.
    pub route_window: Duration,
    /// How long route answers are kept (never shorter than the window).
    pub route_ttl: Duration,
    /// Try the static aircraft type table before the remote lookup.
    pub static_type_lookup: bool,
    /// Query the remote metadata endpoint when the static table misses.
    pub remote_metadata: bool,
    /// Upper bound on aircraft enriched at the same time.
    pub max_concurrent_lookups: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            home_latitude: DEFAULT_HOME.0,
            home_longitude: DEFAULT_HOME.1,
            radius_km: DEFAULT_RADIUS_KM,
            state_ttl: Duration::from_secs(15),
            min_refetch_interval: Duration::from_secs(15),
            metadata_ttl: Duration::from_secs(3600 * 24),
            route_window: Duration::from_secs(3600 * 2),
            route_ttl: Duration::from_secs(3600 * 2),
            static_type_lookup: true,
            remote_metadata: true,
            max_concurrent_lookups: 8,
        }
    }
}

impl PipelineConfig {
    /// Check the configuration and normalise dependent values.
    ///
    /// The bulk state TTL is raised to the minimum refetch interval so that a
    /// Fresh gate always has a live snapshot to serve.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        let (lat, lon) = (self.home_latitude, self.home_longitude);
        if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
            return Err(ConfigError::InvalidCoordinate {
                latitude: lat,
                longitude: lon,
            });
        }

        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            return Err(ConfigError::InvalidRadius(self.radius_km));
        }

        if self.route_window.is_zero() {
            return Err(ConfigError::ZeroDuration("route window"));
        }

        if self.state_ttl < self.min_refetch_interval {
            warn!(
                "State TTL {}s is shorter than the minimum refetch interval, using {}s",
                self.state_ttl.as_secs(),
                self.min_refetch_interval.as_secs()
            );
            self.state_ttl = self.min_refetch_interval;
        }

        self.route_ttl = self.route_ttl.max(self.route_window);
        self.max_concurrent_lookups = self.max_concurrent_lookups.max(1);

        Ok(self)
    }
}

/// What caused a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Periodic timer tick.
    Scheduled,
    /// Explicit user request to refresh now.
    Forced,
}

/// One aircraft near home, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRecord {
    /// Destination label, e.g. "To San Jose".
    pub label: String,
    pub airline: String,
    pub airline_code: String,
    pub flight_number: String,
    pub aircraft_type: String,
    pub icao24: String,
    /// Trimmed callsign.
    pub callsign: String,
    pub distance_km: f64,
    pub on_ground: bool,
}

impl DisplayRecord {
    fn new(state: &StateVector, distance_km: f64, label: String, aircraft_type: String) -> Self {
        Self {
            label,
            airline: resolve_airline(&state.callsign).to_string(),
            airline_code: airline_code(&state.callsign),
            flight_number: resolve_flight_number(&state.callsign),
            aircraft_type,
            icao24: state.icao24.clone(),
            callsign: state.callsign.trim().to_string(),
            distance_km,
            on_ground: state.on_ground,
        }
    }

    /// Carrier code and number, e.g. "UAL123".
    #[must_use]
    pub fn flight_designator(&self) -> String {
        if self.flight_number == UNKNOWN_FLIGHT_NUMBER {
            UNKNOWN_FLIGHT_NUMBER.to_string()
        } else {
            format!("{}{}", self.airline_code, self.flight_number)
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Aircraft near home, in upstream order.
    pub records: Vec<DisplayRecord>,
    /// Bulk fetch failure for this cycle.
    pub error: Option<FetchError>,
    /// Set when a forced refresh was refused by the fetch gate.
    pub advisory: Option<RateLimitAdvisory>,
    /// When the bulk state behind these records was fetched.
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// No nearby aircraft and no error.
    #[must_use]
    pub fn is_clear_skies(&self) -> bool {
        self.records.is_empty() && self.error.is_none()
    }
}

#[derive(Debug, Clone)]
struct StateBatch {
    states: Arc<Vec<StateVector>>,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct BulkOutcome {
    batch: Option<StateBatch>,
    error: Option<FetchError>,
    advisory: Option<RateLimitAdvisory>,
}

/// The proximity pipeline. Owns its caches and fetch gate for the process lifetime.
pub struct Pipeline {
    config: PipelineConfig,
    source: Arc<dyn FlightDataSource>,
    gate: FetchGate,
    states: TtlCache<(), StateBatch>,
    // Serialises gate check + bulk fetch across concurrent runs
    bulk_lock: AsyncMutex<()>,
    metadata: Arc<MetadataResolver>,
    routes: Arc<RouteResolver>,
    lookup_permits: Arc<Semaphore>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("gate", &self.gate)
            .field("metadata", &self.metadata)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create a pipeline on the system clock.
    pub fn new(config: PipelineConfig, source: Arc<dyn FlightDataSource>) -> Result<Self, ConfigError> {
        Self::with_clock(config, source, Arc::new(SystemClock))
    }

    /// Create a pipeline reading time from `clock`.
    pub fn with_clock(
        config: PipelineConfig,
        source: Arc<dyn FlightDataSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;

        let metadata = MetadataResolver::new(
            Arc::clone(&source),
            config.metadata_ttl,
            Arc::clone(&clock),
            config.static_type_lookup,
            config.remote_metadata,
        );
        let routes = RouteResolver::new(
            Arc::clone(&source),
            config.route_window,
            config.route_ttl,
            Arc::clone(&clock),
        );

        Ok(Self {
            gate: FetchGate::new(config.min_refetch_interval, Arc::clone(&clock)),
            states: TtlCache::new(config.state_ttl, clock),
            bulk_lock: AsyncMutex::new(()),
            metadata: Arc::new(metadata),
            routes: Arc::new(routes),
            lookup_permits: Arc::new(Semaphore::new(config.max_concurrent_lookups)),
            source,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    /// Run one refresh cycle.
    pub async fn run(&self, trigger: Trigger) -> Snapshot {
        let bulk = self.bulk_states(trigger).await;

        let Some(batch) = bulk.batch else {
            return Snapshot {
                records: Vec::new(),
                error: bulk.error,
                advisory: bulk.advisory,
                fetched_at: None,
            };
        };

        let nearby: Vec<(StateVector, f64)> = batch
            .states
            .iter()
            .filter_map(|sv| {
                geo::distance_within(
                    self.config.home_latitude,
                    self.config.home_longitude,
                    sv.latitude,
                    sv.longitude,
                    self.config.radius_km,
                )
                .map(|d| (sv.clone(), d))
            })
            .collect();

        info!(
            "{} of {} aircraft within {:.1} km of home",
            nearby.len(),
            batch.states.len(),
            self.config.radius_km
        );

        Snapshot {
            records: self.enrich(nearby).await,
            error: bulk.error,
            advisory: bulk.advisory,
            fetched_at: Some(batch.fetched_at),
        }
    }

    /// Drop expired entries from every cache. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.states.invalidate_expired() + self.metadata.purge_expired() + self.routes.purge_expired()
    }

    async fn bulk_states(&self, trigger: Trigger) -> BulkOutcome {
        let force = trigger == Trigger::Forced;
        let _guard = self.bulk_lock.lock().await;

        if !force {
            if let Some(batch) = self.states.get(&()) {
                return BulkOutcome {
                    batch: Some(batch),
                    ..Default::default()
                };
            }
        }

        match self.gate.check(force) {
            GateDecision::UseCached => BulkOutcome {
                batch: self.states.get(&()),
                ..Default::default()
            },
            GateDecision::Deferred(advisory) => {
                info!("Forced refresh deferred: {}", advisory);
                BulkOutcome {
                    batch: self.states.get(&()),
                    advisory: Some(advisory),
                    ..Default::default()
                }
            }
            GateDecision::Fetch => {
                let started_at = self.gate.now();
                match self.source.fetch_states().await {
                    Ok(states) => {
                        self.gate.record_success(started_at);
                        let batch = StateBatch {
                            states: Arc::new(states),
                            fetched_at: Utc::now(),
                        };
                        self.states.put((), batch.clone());
                        BulkOutcome {
                            batch: Some(batch),
                            ..Default::default()
                        }
                    }
                    Err(e) => {
                        error!("Error fetching flight data: {}", e);
                        BulkOutcome {
                            error: Some(e),
                            ..Default::default()
                        }
                    }
                }
            }
        }
    }

    async fn enrich(&self, nearby: Vec<(StateVector, f64)>) -> Vec<DisplayRecord> {
        let mut tasks = JoinSet::new();

        for (index, (state, distance_km)) in nearby.into_iter().enumerate() {
            let metadata = Arc::clone(&self.metadata);
            let routes = Arc::clone(&self.routes);
            let permits = Arc::clone(&self.lookup_permits);

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let (aircraft_type, label) = tokio::join!(
                    metadata.resolve_aircraft_type(&state.callsign, &state.icao24),
                    routes.resolve_label(&state.icao24, &state.callsign),
                );
                (index, DisplayRecord::new(&state, distance_km, label, aircraft_type))
            });
        }

        let mut enriched = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(record) => enriched.push(record),
                Err(e) => error!("Enrichment task failed: {}", e),
            }
        }

        enriched.sort_by_key(|(index, _)| *index);
        enriched.into_iter().map(|(_, record)| record).collect()
    }
}
