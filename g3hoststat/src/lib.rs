/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

pub mod backoff;
pub mod build;
pub mod config;
pub mod glob;
pub mod log;
pub mod opts;
pub mod sched;
pub mod source;
pub mod stat;
