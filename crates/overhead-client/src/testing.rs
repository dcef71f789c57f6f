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

//! In-memory flight data source for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::opensky::{AircraftRecord, FlightDataSource, FlightRecord, StateVector};

#[derive(Debug, Default)]
pub(crate) struct FakeSource {
    states: Mutex<Vec<StateVector>>,
    aircraft: HashMap<String, AircraftRecord>,
    flights: HashMap<String, Vec<FlightRecord>>,
    fail_states: AtomicBool,
    fail_lookups: bool,
    state_calls: AtomicUsize,
    aircraft_calls: AtomicUsize,
    flight_calls: AtomicUsize,
    last_window: Mutex<Option<(i64, i64)>>,
}

impl FakeSource {
    pub fn with_states(self, states: Vec<StateVector>) -> Self {
        self.set_states(states);
        self
    }

    pub fn with_aircraft(mut self, icao24: &str, record: AircraftRecord) -> Self {
        self.aircraft.insert(icao24.to_string(), record);
        self
    }

    pub fn with_flights(mut self, icao24: &str, flights: Vec<FlightRecord>) -> Self {
        self.flights.insert(icao24.to_string(), flights);
        self
    }

    /// Make every per-aircraft lookup time out.
    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    pub fn set_states(&self, states: Vec<StateVector>) {
        *self.states.lock().unwrap() = states;
    }

    /// Make bulk state requests time out (or succeed again).
    pub fn set_states_failing(&self, failing: bool) {
        self.fail_states.store(failing, Ordering::SeqCst);
    }

    pub fn state_calls(&self) -> usize {
        self.state_calls.load(Ordering::SeqCst)
    }

    pub fn aircraft_calls(&self) -> usize {
        self.aircraft_calls.load(Ordering::SeqCst)
    }

    pub fn flight_calls(&self) -> usize {
        self.flight_calls.load(Ordering::SeqCst)
    }

    pub fn last_window(&self) -> Option<(i64, i64)> {
        *self.last_window.lock().unwrap()
    }

    fn timeout(endpoint: &str) -> FetchError {
        FetchError::Timeout {
            url: format!("https://opensky.test/api{endpoint}"),
        }
    }
}

#[async_trait]
impl FlightDataSource for FakeSource {
    async fn fetch_states(&self) -> Result<Vec<StateVector>, FetchError> {
        self.state_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_states.load(Ordering::SeqCst) {
            return Err(Self::timeout("/states/all"));
        }
        Ok(self.states.lock().unwrap().clone())
    }

    async fn fetch_aircraft(&self, icao24: &str) -> Result<Option<AircraftRecord>, FetchError> {
        self.aircraft_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups {
            return Err(Self::timeout("/metadata/aircraft/icao"));
        }
        Ok(self.aircraft.get(icao24).cloned())
    }

    async fn fetch_flights(&self, icao24: &str, begin: i64, end: i64) -> Result<Vec<FlightRecord>, FetchError> {
        self.flight_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_window.lock().unwrap() = Some((begin, end));
        if self.fail_lookups {
            return Err(Self::timeout("/flights/aircraft"));
        }
        Ok(self.flights.get(icao24).cloned().unwrap_or_default())
    }
}

/// State vector at the given position.
pub(crate) fn state(icao24: &str, callsign: &str, lat: f64, lon: f64) -> StateVector {
    StateVector {
        icao24: icao24.to_string(),
        callsign: callsign.to_string(),
        longitude: Some(lon),
        latitude: Some(lat),
        on_ground: false,
    }
}
