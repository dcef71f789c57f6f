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

//! Application configuration management.
//!
//! Settings persist as TOML through `confy`. Every field has a serde default
//! so older or hand-edited files keep loading. Upstream credentials resolve
//! from the environment first, then the config file.

use std::time::Duration;

use overhead_client::{Credentials, PipelineConfig, DEFAULT_API_BASE_URL, DEFAULT_HOME, DEFAULT_RADIUS_KM};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "flights-overhead";
const CONFIG_NAME: &str = "config";

pub const USERNAME_ENV: &str = "OPENSKY_USERNAME";
pub const PASSWORD_ENV: &str = "OPENSKY_PASSWORD";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Home latitude in degrees
    #[serde(default = "default_home_latitude")]
    pub home_latitude: f64,

    /// Home longitude in degrees
    #[serde(default = "default_home_longitude")]
    pub home_longitude: f64,

    /// Radius around home in kilometres
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,

    /// Seconds between scheduled refreshes
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Seconds a bulk state snapshot is reused
    #[serde(default = "default_state_ttl_secs")]
    pub state_ttl_secs: u64,

    /// Minimum seconds between upstream bulk fetches
    #[serde(default = "default_min_refetch_interval_secs")]
    pub min_refetch_interval_secs: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Hours of flight history searched for route data
    #[serde(default = "default_route_window_hours")]
    pub route_window_hours: u64,

    /// Seconds aircraft type answers are cached
    #[serde(default = "default_metadata_ttl_secs")]
    pub metadata_ttl_secs: u64,

    /// Match aircraft type codes in the callsign before asking upstream
    #[serde(default = "default_true")]
    pub static_type_lookup: bool,

    /// Query the upstream metadata endpoint for aircraft types
    #[serde(default = "default_true")]
    pub remote_metadata: bool,

    /// Aircraft enriched concurrently
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,

    /// OpenSky API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// OpenSky username (optional, env var takes precedence)
    #[serde(default)]
    pub opensky_username: Option<String>,

    /// OpenSky password (optional, env var takes precedence)
    #[serde(default)]
    pub opensky_password: Option<String>,
}

// Default value functions for serde
fn default_home_latitude() -> f64 {
    DEFAULT_HOME.0
}

fn default_home_longitude() -> f64 {
    DEFAULT_HOME.1
}

fn default_radius_km() -> f64 {
    DEFAULT_RADIUS_KM
}

fn default_refresh_interval_secs() -> u64 {
    30
}

fn default_state_ttl_secs() -> u64 {
    15
}

fn default_min_refetch_interval_secs() -> u64 {
    15
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_route_window_hours() -> u64 {
    2
}

fn default_metadata_ttl_secs() -> u64 {
    3600 * 24
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_lookups() -> usize {
    8
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            home_latitude: default_home_latitude(),
            home_longitude: default_home_longitude(),
            radius_km: default_radius_km(),
            refresh_interval_secs: default_refresh_interval_secs(),
            state_ttl_secs: default_state_ttl_secs(),
            min_refetch_interval_secs: default_min_refetch_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            route_window_hours: default_route_window_hours(),
            metadata_ttl_secs: default_metadata_ttl_secs(),
            static_type_lookup: true,
            remote_metadata: true,
            max_concurrent_lookups: default_max_concurrent_lookups(),
            api_base_url: default_api_base_url(),
            opensky_username: None,
            opensky_password: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating it with defaults on first run
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Pipeline settings derived from this configuration
    pub fn pipeline_config(&self) -> PipelineConfig {
        let route_window = Duration::from_secs(self.route_window_hours * 3600);
        PipelineConfig {
            home_latitude: self.home_latitude,
            home_longitude: self.home_longitude,
            radius_km: self.radius_km,
            state_ttl: Duration::from_secs(self.state_ttl_secs),
            min_refetch_interval: Duration::from_secs(self.min_refetch_interval_secs),
            metadata_ttl: Duration::from_secs(self.metadata_ttl_secs),
            route_window,
            route_ttl: route_window,
            static_type_lookup: self.static_type_lookup,
            remote_metadata: self.remote_metadata,
            max_concurrent_lookups: self.max_concurrent_lookups,
        }
    }

    /// Resolve upstream credentials from environment variables or config
    pub fn credentials(&self) -> Option<Credentials> {
        resolve_credentials(
            std::env::var(USERNAME_ENV).ok(),
            std::env::var(PASSWORD_ENV).ok(),
            self.opensky_username.as_deref(),
            self.opensky_password.as_deref(),
        )
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Environment credentials win when both parts are set; otherwise fall back
/// to the config file. Anonymous access when neither is complete.
fn resolve_credentials(
    env_username: Option<String>,
    env_password: Option<String>,
    config_username: Option<&str>,
    config_password: Option<&str>,
) -> Option<Credentials> {
    if let (Some(username), Some(password)) = (non_empty(env_username), non_empty(env_password)) {
        return Some(Credentials { username, password });
    }

    let username = non_empty(config_username.map(ToString::to_string))?;
    let password = non_empty(config_password.map(ToString::to_string))?;
    Some(Credentials { username, password })
}
