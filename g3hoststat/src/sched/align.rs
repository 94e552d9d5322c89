/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Time to wait from `now` until the next wall clock instant that is a whole
/// multiple of `quantum`. Zero if `now` is already on such an instant.
pub fn delay_until_aligned(now: SystemTime, quantum: Duration) -> Duration {
    let quantum = quantum.as_nanos();
    if quantum == 0 {
        return Duration::ZERO;
    }
    let since_epoch = now
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    match since_epoch % quantum {
        0 => Duration::ZERO,
        rem => Duration::from_nanos(u64::try_from(quantum - rem).unwrap_or(u64::MAX)),
    }
}

/// The first wall clock instant at or after `now` aligned to `quantum`.
pub fn next_aligned(now: SystemTime, quantum: Duration) -> SystemTime {
    now + delay_until_aligned(now, quantum)
}
