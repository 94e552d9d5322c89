/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

pub use g3_statsd_client::MetricValue;

mod console;
mod statsd;

mod pool;
pub use pool::StatsPool;
#[cfg(test)]
pub(crate) use pool::tests::SharedBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricType {
    Gauge,
    Count,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Gauge => "Gauge",
            MetricType::Count => "Count",
        }
    }
}

/// A metric handle bound to a fixed tag set.
pub trait MetricClient: Send + Sync {
    fn emit(&self, metric_type: MetricType, name: &str, value: MetricValue);
}

pub type ArcMetricClient = Arc<dyn MetricClient>;

impl dyn MetricClient {
    #[inline]
    pub fn gauge<V: Into<MetricValue>>(&self, name: &str, value: V) {
        self.emit(MetricType::Gauge, name, value.into());
    }

    #[inline]
    pub fn count<V: Into<MetricValue>>(&self, name: &str, value: V) {
        self.emit(MetricType::Count, name, value.into());
    }
}
