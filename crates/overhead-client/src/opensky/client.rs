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

//! HTTP client for the OpenSky Network REST API.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::types::StatesResponse;
use super::{AircraftRecord, FlightDataSource, FlightRecord, StateVector};
use crate::error::FetchError;

/// Public OpenSky REST endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://opensky-network.org/api";

/// OpenSky sends this on 429 responses.
const RETRY_AFTER_HEADER: &str = "X-Rate-Limit-Retry-After-Seconds";

/// Basic-auth credentials passed through to the upstream.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// OpenSky REST client with a per-request timeout.
#[derive(Debug, Clone)]
pub struct OpenSkyClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl OpenSkyClient {
    /// Create a client. Every request gives up after `timeout`.
    pub fn new(
        base_url: impl Into<String>,
        credentials: Option<Credentials>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = Self::http_builder(timeout).build()?;
        Ok(Self::with_http(base_url, credentials, http))
    }

    fn http_builder(timeout: Duration) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("overhead-client/", env!("CARGO_PKG_VERSION")))
    }

    fn with_http(base_url: impl Into<String>, credentials: Option<Credentials>, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// GET a JSON document. A 404 means "no data" for the per-aircraft
    /// endpoints and comes back as `Ok(None)`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, FetchError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.http.get(&url).query(query);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            return Err(FetchError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        Ok(Some(response.json().await?))
    }
}

#[async_trait]
impl FlightDataSource for OpenSkyClient {
    async fn fetch_states(&self) -> Result<Vec<StateVector>, FetchError> {
        let response: StatesResponse = self
            .get_json("/states/all", &[])
            .await?
            .ok_or_else(|| FetchError::Decode("state vector endpoint returned 404".to_string()))?;

        debug!("Received state vectors (upstream time {:?})", response.time);
        Ok(response.into_state_vectors())
    }

    async fn fetch_aircraft(&self, icao24: &str) -> Result<Option<AircraftRecord>, FetchError> {
        let path = format!("/metadata/aircraft/icao/{}", icao24.to_lowercase());
        self.get_json(&path, &[]).await
    }

    async fn fetch_flights(&self, icao24: &str, begin: i64, end: i64) -> Result<Vec<FlightRecord>, FetchError> {
        let query = [
            ("icao24", icao24.to_lowercase()),
            ("begin", begin.to_string()),
            ("end", end.to_string()),
        ];
        let flights: Option<Vec<FlightRecord>> = self.get_json("/flights/aircraft", &query).await?;
        Ok(flights.unwrap_or_default())
    }
}
