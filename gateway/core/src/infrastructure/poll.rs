// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0
//! Bounded cooperative polling.
//!
//! Replaces the sleep-in-a-loop idiom with an explicit primitive: a
//! [`PollPolicy`] carries two distinctly typed durations (overall budget and
//! per-attempt interval), and a [`PollTimer`] enforces the budget and honors
//! a cancellation token between attempts. The calling task sleeps without
//! blocking others.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Timeout budget and poll interval for a wait loop.
///
/// Both fields are `Duration`s, so "60 seconds" and "300 milliseconds" can
/// never be confused by sharing a bare numeric scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Total time the status may remain pending before the wait fails.
    #[serde(with = "humantime_serde")]
    pub budget: Duration,

    /// Sleep between consecutive status probes.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            budget: Duration::from_secs(60),
            interval: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("poll budget exhausted after {elapsed:?}")]
    TimedOut { elapsed: Duration },

    #[error("poll cancelled")]
    Cancelled,
}

/// Tracks one wait loop: call [`tick`](Self::tick) after every pending probe.
pub struct PollTimer {
    policy: PollPolicy,
    cancel: CancellationToken,
    started: Instant,
}

impl PollTimer {
    pub fn start(policy: PollPolicy, cancel: CancellationToken) -> Self {
        Self {
            policy,
            cancel,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Sleeps one interval, failing when the budget is spent or the token is
    /// cancelled. The budget check happens before the sleep, so a zero
    /// budget still permits exactly one probe.
    pub async fn tick(&self) -> Result<(), PollError> {
        let elapsed = self.elapsed();
        if elapsed >= self.policy.budget {
            return Err(PollError::TimedOut { elapsed });
        }
        tokio::select! {
            _ = self.cancel.cancelled() => Err(PollError::Cancelled),
            _ = tokio::time::sleep(self.policy.interval) => Ok(()),
        }
    }
}
