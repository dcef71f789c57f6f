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

//! Terminal rendering of pipeline snapshots.
//!
//! One card per aircraft, a "clear skies" line when nothing is nearby, and
//! banners for fetch errors and deferred refreshes. `--json` switches to a
//! machine-readable snapshot instead.

use chrono::Local;
use overhead_client::{DisplayRecord, Snapshot};
use serde_json::json;

/// How snapshots are written to stdout.
#[derive(Debug, Clone, Copy)]
pub struct View {
    pub json: bool,
}

impl View {
    pub fn render(&self, snapshot: &Snapshot) {
        if self.json {
            println!("{}", snapshot_json(snapshot));
        } else {
            print!("{}", format_snapshot(snapshot));
        }
    }
}

fn format_card(record: &DisplayRecord) -> String {
    let mut details = format!("{} | {:.1} km", record.aircraft_type, record.distance_km);
    if record.on_ground {
        details.push_str(" | on ground");
    }

    format!(
        "  {}\n    {} | {}\n    {}\n",
        record.label,
        record.airline,
        record.flight_designator(),
        details
    )
}

/// Human-readable rendering of one refresh.
pub fn format_snapshot(snapshot: &Snapshot) -> String {
    let mut out = format!("\nFlights Overhead | {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"));

    if let Some(e) = &snapshot.error {
        out.push_str(&format!("  Error fetching flight data: {e}\n"));
    }
    if let Some(advisory) = &snapshot.advisory {
        out.push_str(&format!("  Warning: {advisory}\n"));
    }

    if snapshot.is_clear_skies() {
        out.push_str("  Clear skies above!\n");
    }

    for record in &snapshot.records {
        out.push('\n');
        out.push_str(&format_card(record));
    }

    out
}

/// JSON rendering of one refresh.
pub fn snapshot_json(snapshot: &Snapshot) -> serde_json::Value {
    json!({
        "fetched_at": snapshot.fetched_at,
        "clear_skies": snapshot.is_clear_skies(),
        "error": snapshot.error.as_ref().map(ToString::to_string),
        "advisory": snapshot.advisory.map(|a| a.to_string()),
        "records": snapshot.records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use overhead_client::{FetchError, RateLimitAdvisory};
    use std::time::Duration;

    fn record() -> DisplayRecord {
        DisplayRecord {
            label: "To San Jose".to_string(),
            airline: "United Airlines".to_string(),
            airline_code: "UAL".to_string(),
            flight_number: "123".to_string(),
            aircraft_type: "Airbus A320".to_string(),
            icao24: "a1b2c3".to_string(),
            callsign: "UAL123".to_string(),
            distance_km: 1.24,
            on_ground: false,
        }
    }

    #[test]
    fn test_card_contents() {
        let snapshot = Snapshot {
            records: vec![record()],
            ..Default::default()
        };
        let text = format_snapshot(&snapshot);
        assert!(text.contains("To San Jose"));
        assert!(text.contains("United Airlines | UAL123"));
        assert!(text.contains("Airbus A320 | 1.2 km"));
        assert!(!text.contains("Clear skies"));
    }

    #[test]
    fn test_clear_skies_and_error_are_different() {
        let clear = format_snapshot(&Snapshot::default());
        assert!(clear.contains("Clear skies above!"));

        let failed = format_snapshot(&Snapshot {
            error: Some(FetchError::Timeout {
                url: "https://opensky-network.org/api/states/all".to_string(),
            }),
            ..Default::default()
        });
        assert!(failed.contains("Error fetching flight data"));
        assert!(!failed.contains("Clear skies"));
    }

    #[test]
    fn test_advisory_banner() {
        let text = format_snapshot(&Snapshot {
            advisory: Some(RateLimitAdvisory {
                retry_in: Duration::from_secs(7),
            }),
            ..Default::default()
        });
        assert!(text.contains("Warning: Too soon to refresh, retry in 7 seconds"));
    }

    #[test]
    fn test_json_snapshot() {
        let value = snapshot_json(&Snapshot {
            records: vec![record()],
            ..Default::default()
        });
        assert_eq!(value["clear_skies"], false);
        assert_eq!(value["records"][0]["airline"], "United Airlines");
        assert!(value["error"].is_null());
    }
}
