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

//! Error types for upstream requests and pipeline configuration.

use thiserror::Error;

/// Errors from a single upstream HTTP request.
///
/// Only bulk-state failures reach the caller; the resolvers log and discard
/// these and fall back to their placeholder strings.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("HTTP error {status} from {url}")]
    Status { status: u16, url: String },

    #[error("upstream rate limit exceeded{}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("malformed response: {0}")]
    Decode(String),
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    retry_after_secs
        .map(|secs| format!(", retry in {secs} seconds"))
        .unwrap_or_default()
}

impl FetchError {
    /// Whether the request gave up waiting for the upstream.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: err.url().map(ToString::to_string).unwrap_or_default(),
            }
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}

/// Rejected pipeline configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid home coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("radius must be a positive number of kilometres, got {0}")]
    InvalidRadius(f64),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_distinguishable() {
        let err = FetchError::Timeout {
            url: "https://opensky-network.org/api/states/all".to_string(),
        };
        assert!(err.is_timeout());
        assert!(!FetchError::Decode("bad".to_string()).is_timeout());
    }

    #[test]
    fn test_rate_limited_message() {
        let err = FetchError::RateLimited { retry_after_secs: Some(12) };
        assert_eq!(err.to_string(), "upstream rate limit exceeded, retry in 12 seconds");

        let err = FetchError::RateLimited { retry_after_secs: None };
        assert_eq!(err.to_string(), "upstream rate limit exceeded");
    }
}
