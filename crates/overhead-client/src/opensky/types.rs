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

//! Wire records for the OpenSky REST API.
//!
//! Bulk state vectors arrive as positional JSON arrays. The fields consumed are:
//!
//! ```text
//! [0] icao24   [1] callsign   [5] longitude   [6] latitude   [8] on_ground
//! ```

use serde::Deserialize;
use serde_json::Value;

const IDX_ICAO24: usize = 0;
const IDX_CALLSIGN: usize = 1;
const IDX_LONGITUDE: usize = 5;
const IDX_LATITUDE: usize = 6;
const IDX_ON_GROUND: usize = 8;

/// One aircraft's position/identity snapshot from the bulk endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    /// ICAO 24-bit address (hex string, e.g., "a1b2c3").
    pub icao24: String,
    /// Callsign as broadcast, possibly blank or space-padded.
    pub callsign: String,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    pub on_ground: bool,
}

impl StateVector {
    /// Build a state vector from one positional row.
    ///
    /// Returns `None` when the row has no usable ICAO24 address. Missing or
    /// null optional fields become `None`/blank rather than failing the row.
    #[must_use]
    pub fn from_row(row: &[Value]) -> Option<Self> {
        let icao24 = row
            .get(IDX_ICAO24)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())?
            .to_lowercase();

        let callsign = row
            .get(IDX_CALLSIGN)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Some(Self {
            icao24,
            callsign,
            longitude: row.get(IDX_LONGITUDE).and_then(Value::as_f64),
            latitude: row.get(IDX_LATITUDE).and_then(Value::as_f64),
            on_ground: row.get(IDX_ON_GROUND).and_then(Value::as_bool).unwrap_or(false),
        })
    }
}

/// Body of `GET /states/all`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StatesResponse {
    pub time: Option<i64>,
    pub states: Option<Vec<Vec<Value>>>,
}

impl StatesResponse {
    /// Convert every well-formed row, preserving upstream order.
    pub fn into_state_vectors(self) -> Vec<StateVector> {
        self.states
            .unwrap_or_default()
            .iter()
            .filter_map(|row| StateVector::from_row(row))
            .collect()
    }
}

/// Body of `GET /metadata/aircraft/icao/{icao24}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AircraftRecord {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, rename = "typecode", alias = "type")]
    pub type_code: Option<String>,
}

impl AircraftRecord {
    /// Best available type description: model name first, then type code.
    #[must_use]
    pub fn type_name(&self) -> Option<String> {
        [self.model.as_deref(), self.type_code.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(ToString::to_string)
    }
}

/// One element of `GET /flights/aircraft`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightRecord {
    #[serde(default)]
    pub est_departure_airport: Option<String>,
    #[serde(default)]
    pub est_arrival_airport: Option<String>,
}
