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

//! Minimum-interval guard for bulk state requests.
//!
//! The gate has two states. While **Fresh** (the last successful fetch is
//! younger than the minimum interval) no upstream request may be issued: a
//! scheduled refresh reuses the cached snapshot and a forced refresh is
//! deferred with a [`RateLimitAdvisory`]. Once **Stale**, any request fetches.
//! Only successful fetches move the gate back to Fresh.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::clock::Clock;

/// Freshness of the last successful bulk fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Fresh,
    Stale,
}

/// What a refresh request is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Issue an upstream request.
    Fetch,
    /// Serve the cached snapshot without a network call.
    UseCached,
    /// A forced refresh arrived too soon. Serve the cache and tell the user.
    Deferred(RateLimitAdvisory),
}

/// User-visible notice that a forced refresh was refused by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitAdvisory {
    pub retry_in: Duration,
}

impl RateLimitAdvisory {
    /// Seconds until a forced refresh will be accepted, rounded up.
    #[must_use]
    pub fn retry_in_secs(&self) -> u64 {
        let secs = self.retry_in.as_secs();
        if self.retry_in.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

impl fmt::Display for RateLimitAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Too soon to refresh, retry in {} seconds", self.retry_in_secs())
    }
}

/// Decide whether a refresh request may reach the upstream.
///
/// `last_fetch` is `None` until the first successful fetch, which is never
/// gated.
#[must_use]
pub fn should_fetch(
    force: bool,
    last_fetch: Option<Instant>,
    now: Instant,
    min_interval: Duration,
) -> GateDecision {
    let Some(last) = last_fetch else {
        return GateDecision::Fetch;
    };

    let age = now.saturating_duration_since(last);
    if age >= min_interval {
        GateDecision::Fetch
    } else if force {
        GateDecision::Deferred(RateLimitAdvisory {
            retry_in: min_interval - age,
        })
    } else {
        GateDecision::UseCached
    }
}

/// Stateful wrapper around [`should_fetch`] holding the last success time.
pub struct FetchGate {
    min_interval: Duration,
    last_fetch: Mutex<Option<Instant>>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for FetchGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchGate")
            .field("min_interval", &self.min_interval)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl FetchGate {
    #[must_use]
    pub fn new(min_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            min_interval,
            last_fetch: Mutex::new(None),
            clock,
        }
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Instant of the last successful fetch, if any.
    #[must_use]
    pub fn last_fetch(&self) -> Option<Instant> {
        self.last_fetch.lock().ok().and_then(|last| *last)
    }

    #[must_use]
    pub fn state(&self) -> GateState {
        match self.last_fetch() {
            Some(last) if self.clock.now().saturating_duration_since(last) < self.min_interval => {
                GateState::Fresh
            }
            _ => GateState::Stale,
        }
    }

    /// Evaluate a request against the current time.
    #[must_use]
    pub fn check(&self, force: bool) -> GateDecision {
        should_fetch(force, self.last_fetch(), self.clock.now(), self.min_interval)
    }

    /// The instant a request started, for passing to [`FetchGate::record_success`].
    #[must_use]
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Record a successful fetch that started at `started_at`.
    ///
    /// An older completion never overwrites a newer one.
    pub fn record_success(&self, started_at: Instant) {
        if let Ok(mut last) = self.last_fetch.lock() {
            if last.map_or(true, |prev| started_at > prev) {
                *last = Some(started_at);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const MIN_INTERVAL: Duration = Duration::from_secs(15);

    #[test]
    fn test_first_fetch_is_never_gated() {
        let now = Instant::now();
        assert_eq!(should_fetch(false, None, now, MIN_INTERVAL), GateDecision::Fetch);
        assert_eq!(should_fetch(true, None, now, MIN_INTERVAL), GateDecision::Fetch);
    }

    #[test]
    fn test_fresh_gate_serves_cache() {
        let last = Instant::now();
        let now = last + Duration::from_secs(5);
        assert_eq!(should_fetch(false, Some(last), now, MIN_INTERVAL), GateDecision::UseCached);
    }

    #[test]
    fn test_forced_request_inside_interval_is_deferred() {
        let last = Instant::now();
        let now = last + Duration::from_millis(5500);
        let decision = should_fetch(true, Some(last), now, MIN_INTERVAL);

        let GateDecision::Deferred(advisory) = decision else {
            panic!("expected deferral, got {decision:?}");
        };
        assert_eq!(advisory.retry_in, Duration::from_millis(9500));
        assert_eq!(advisory.retry_in_secs(), 10);
        assert_eq!(advisory.to_string(), "Too soon to refresh, retry in 10 seconds");
    }

    #[test]
    fn test_stale_gate_fetches_forced_or_not() {
        let last = Instant::now();
        let now = last + MIN_INTERVAL;
        assert_eq!(should_fetch(false, Some(last), now, MIN_INTERVAL), GateDecision::Fetch);
        assert_eq!(should_fetch(true, Some(last), now, MIN_INTERVAL), GateDecision::Fetch);
    }

    #[test]
    fn test_gate_state_transitions() {
        let clock = Arc::new(ManualClock::new());
        let gate = FetchGate::new(MIN_INTERVAL, clock.clone());
        assert_eq!(gate.state(), GateState::Stale);

        gate.record_success(gate.now());
        assert_eq!(gate.state(), GateState::Fresh);

        clock.advance(MIN_INTERVAL);
        assert_eq!(gate.state(), GateState::Stale);
    }

    #[test]
    fn test_older_completion_does_not_win() {
        let clock = Arc::new(ManualClock::new());
        let gate = FetchGate::new(MIN_INTERVAL, clock.clone());

        let early = gate.now();
        clock.advance(Duration::from_secs(3));
        let late = gate.now();

        gate.record_success(late);
        gate.record_success(early);
        assert_eq!(gate.last_fetch(), Some(late));
    }
}
