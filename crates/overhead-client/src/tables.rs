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

//! Static lookup tables, loaded once and read-only for the process lifetime.

use std::collections::HashMap;

use lazy_static::lazy_static;

/// Callsign carrier prefix to airline name.
const AIRLINES: &[(&str, &str)] = &[
    ("UAL", "United Airlines"),
    ("SWA", "Southwest"),
    ("DAL", "Delta"),
    ("ASA", "Alaska"),
    ("AAL", "American Airlines"),
    ("JBU", "JetBlue"),
    ("FFT", "Frontier"),
    ("SKW", "SkyWest"),
    ("NKS", "Spirit"),
    ("HXA", "Hawaiian Airlines"),
    ("HAL", "Hawaiian Airlines"),
    ("QXE", "Horizon Air"),
    ("ANA", "All Nippon Airways"),
    ("JAL", "Japan Airlines"),
    ("BAW", "British Airways"),
    ("DLH", "Lufthansa"),
    ("AFR", "Air France"),
    ("ACA", "Air Canada"),
    ("VOI", "Volaris"),
    ("TZP", "ZIPAIR"),
    ("Y4", "Volaris"),
    ("ZG", "ZIPAIR"),
];

/// Aircraft type code to display name.
///
/// Matching scans this slice in order and the first code found inside the
/// callsign wins, so the order here is part of the lookup's behaviour.
pub const AIRCRAFT_TYPES: &[(&str, &str)] = &[
    ("A319", "Airbus A319"),
    ("A320", "Airbus A320"),
    ("A20N", "Airbus A320neo"),
    ("A332", "Airbus A330-200"),
    ("A343", "Airbus A340-300"),
    ("B712", "Boeing 717-200"),
    ("B734", "Boeing 737-400"),
    ("B737", "Boeing 737-700"),
    ("B738", "Boeing 737-800"),
    ("B739", "Boeing 737-900"),
    ("B763", "Boeing 767-300"),
    ("B788", "Boeing 787-8"),
    ("B789", "Boeing 787-9"),
    ("CRJ2", "Bombardier CRJ-200"),
    ("CRJ7", "Bombardier CRJ-700"),
    ("CRJ9", "Bombardier CRJ-900"),
    ("E75L", "Embraer ERJ-175"),
    ("MD90", "McDonnell Douglas MD-90"),
];

/// ICAO airport code to city label.
const CITIES: &[(&str, &str)] = &[
    ("KSJC", "San Jose"),
    ("KSFO", "San Francisco"),
    ("KOAK", "Oakland"),
    ("KSMF", "Sacramento"),
    ("KLAX", "Los Angeles"),
    ("KBUR", "Burbank"),
    ("KLGB", "Long Beach"),
    ("KSNA", "Santa Ana"),
    ("KONT", "Ontario"),
    ("KPSP", "Palm Springs"),
    ("KSAN", "San Diego"),
    ("KSEA", "Seattle/Tacoma"),
    ("KPDX", "Portland"),
    ("KBOI", "Boise"),
    ("KLAS", "Las Vegas"),
    ("KPHX", "Phoenix"),
    ("KSLC", "Salt Lake City"),
    ("KDEN", "Denver"),
    ("KDFW", "Dallas/Fort Worth"),
    ("KAUS", "Austin"),
    ("KIAH", "Houston"),
    ("KORD", "Chicago"),
    ("KMSP", "Minneapolis"),
    ("KDTW", "Detroit"),
    ("KATL", "Atlanta"),
    ("KJFK", "New York"),
    ("KEWR", "Newark"),
    ("KBOS", "Boston"),
    ("PHNL", "Honolulu"),
    ("PHOG", "Kahului"),
    ("MMGL", "Guadalajara"),
    ("MMMX", "Mexico City"),
    ("RJAA", "Tokyo/Narita"),
    ("RJTT", "Tokyo/Haneda"),
];

lazy_static! {
    static ref AIRLINE_TABLE: HashMap<&'static str, &'static str> = AIRLINES.iter().copied().collect();
    static ref CITY_TABLE: HashMap<&'static str, &'static str> = CITIES.iter().copied().collect();
}

/// Airline name for a carrier prefix.
#[must_use]
pub fn airline_name(code: &str) -> Option<&'static str> {
    AIRLINE_TABLE.get(code).copied()
}

/// City label for an ICAO airport code (case-insensitive).
#[must_use]
pub fn city_name(icao: &str) -> Option<&'static str> {
    CITY_TABLE.get(icao.trim().to_uppercase().as_str()).copied()
}

/// First aircraft type whose code appears in `haystack`, in table order.
#[must_use]
pub fn aircraft_type_in(haystack: &str) -> Option<&'static str> {
    AIRCRAFT_TYPES
        .iter()
        .find(|(code, _)| haystack.contains(code))
        .map(|(_, name)| *name)
}
