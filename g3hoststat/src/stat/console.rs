/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use g3_statsd_client::MetricValue;

use super::{MetricClient, MetricType};

pub(super) type ConsoleSink = Arc<Mutex<Box<dyn Write + Send>>>;

pub(super) fn stdout_sink() -> ConsoleSink {
    Arc::new(Mutex::new(Box::new(io::stdout())))
}

/// Prints each metric as a human readable line instead of sending it.
pub(super) struct ConsoleMetricClient {
    tags: String,
    sink: ConsoleSink,
}

impl ConsoleMetricClient {
    pub(super) fn new(sink: &ConsoleSink, tags: &[(&str, &str)]) -> Self {
        let mut s = String::new();
        for (k, v) in tags {
            if !s.is_empty() {
                s.push(',');
            }
            s.push_str(k);
            s.push('=');
            s.push_str(v);
        }
        ConsoleMetricClient {
            tags: s,
            sink: Arc::clone(sink),
        }
    }
}

impl MetricClient for ConsoleMetricClient {
    fn emit(&self, metric_type: MetricType, name: &str, value: MetricValue) {
        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(
            sink,
            "{}: {name}{{{}}}={value}",
            metric_type.as_str(),
            self.tags
        );
    }
}
