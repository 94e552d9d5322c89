/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2026 ByteDance and/or its affiliates.
 */

mod sink;
use sink::StatsdMetricsSink;

mod client;
pub use client::{MetricFormatter, StatsdClient};

mod tag;
pub use tag::StatsdTagGroup;

mod value;
pub use value::MetricValue;

mod config;
pub use config::{StatsdBackend, StatsdClientConfig};
