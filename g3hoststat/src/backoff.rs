/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::time::{Duration, Instant};

pub const DEFAULT_PAUSE: Duration = Duration::from_secs(300);

/// A fixed cool-down after a failure of some external dependency.
///
/// Every failure restarts the pause, there is no growth and no probing
/// before the deadline.
#[derive(Debug, Default, Clone)]
pub struct BackoffGuard {
    pause_until: Option<Instant>,
}

impl BackoffGuard {
    pub fn should_run(&self, now: Instant) -> bool {
        match self.pause_until {
            Some(deadline) => now >= deadline,
            None => true,
        }
    }

    pub fn record_failure(&mut self, now: Instant, pause: Duration) {
        self.pause_until = Some(now + pause);
    }

    pub fn paused_until(&self) -> Option<Instant> {
        self.pause_until
    }
}
