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

//! Trigger-driven refresh loop.
//!
//! Refreshes run on a timer tick or when the user types a command on stdin.
//! A forced refresh restarts the timer. The loop ends on `q`, Ctrl-C, or
//! cancellation of the shared token.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use overhead_client::{Pipeline, Trigger};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::display::View;

/// Commands accepted on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Refresh,
    Quit,
}

impl Command {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "r" | "refresh" => Some(Self::Refresh),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

pub async fn run_loop(pipeline: Arc<Pipeline>, interval: Duration, view: View, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut commands = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    info!(
        "Refreshing every {} seconds. Type 'r' + Enter to refresh now, 'q' to quit",
        interval.as_secs()
    );

    loop {
        let trigger = tokio::select! {
            _ = ticker.tick() => Trigger::Scheduled,

            line = commands.next_line(), if stdin_open => match line {
                Ok(Some(input)) => match Command::parse(&input) {
                    Some(Command::Refresh) => {
                        ticker.reset();
                        Trigger::Forced
                    }
                    Some(Command::Quit) => {
                        cancel_token.cancel();
                        return;
                    }
                    None => continue,
                },
                Ok(None) | Err(_) => {
                    debug!("stdin closed, manual refresh disabled");
                    stdin_open = false;
                    continue;
                }
            },

            () = cancel_token.cancelled() => {
                info!("Refresh loop cancelled");
                return;
            }
        };

        let snapshot = pipeline.run(trigger).await;
        view.render(&snapshot);

        let purged = pipeline.purge_expired();
        if purged > 0 {
            debug!("Purged {} expired cache entries", purged);
        }
    }
}
