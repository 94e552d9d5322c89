/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2026 ByteDance and/or its affiliates.
 */

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use log::warn;

use crate::{StatsdMetricsSink, StatsdTagGroup};

mod formatter;
pub use formatter::MetricFormatter;

struct SharedSink {
    prefix: String,
    sink: Mutex<StatsdMetricsSink>,

    create_instant: Instant,
    last_error_report: AtomicU64,
}

impl SharedSink {
    fn lock(&self) -> MutexGuard<'_, StatsdMetricsSink> {
        self.sink.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn handle_emit_error(&self, e: io::Error) {
        let time_slice = self.create_instant.elapsed().as_secs().rotate_right(6); // every 64s
        if self.last_error_report.swap(time_slice, Ordering::Relaxed) != time_slice {
            warn!("sending metrics error: {e:?}");
        }
    }
}

/// A statsd client bound to a fixed set of tags.
///
/// Clones share the same socket and send buffer, so deriving a client for a
/// new tag set never opens another network handle.
#[derive(Clone)]
pub struct StatsdClient {
    shared: Arc<SharedSink>,
    tags: StatsdTagGroup,
}

impl StatsdClient {
    pub(crate) fn new(prefix: &str, sink: StatsdMetricsSink) -> Self {
        StatsdClient {
            shared: Arc::new(SharedSink {
                prefix: prefix.to_string(),
                sink: Mutex::new(sink),
                create_instant: Instant::now(),
                last_error_report: AtomicU64::new(0),
            }),
            tags: StatsdTagGroup::default(),
        }
    }

    pub fn with_tag<T: AsRef<str>>(mut self, key: &str, value: T) -> Self {
        self.tags.add_tag(key, value);
        self
    }

    pub fn with_tag_value<T: AsRef<str>>(mut self, value: T) -> Self {
        self.tags.add_tag_value(value);
        self
    }

    #[inline]
    pub fn tags(&self) -> &StatsdTagGroup {
        &self.tags
    }

    pub fn flush_sink(&self) {
        let r = self.shared.lock().flush();
        if let Err(e) = r {
            self.shared.handle_emit_error(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetricValue;

    fn new_client(prefix: &str, max_segment_size: usize) -> (StatsdClient, Arc<Mutex<Vec<Vec<u8>>>>) {
        let packets = Arc::new(Mutex::new(Vec::new()));
        let sink = StatsdMetricsSink::buf_with_capacity(packets.clone(), 4096, max_segment_size);
        (StatsdClient::new(prefix, sink), packets)
    }

    #[test]
    fn count_simple() {
        let (client, packets) = new_client("test", 1024);
        client.count("count", 20).send();
        client.flush_sink();

        let packets = packets.lock().unwrap();
        assert_eq!(packets.as_slice(), &[b"test.count:20|c".to_vec()]);
    }

    #[test]
    fn gauge_float() {
        let (client, packets) = new_client("test", 1024);
        client.gauge("gauge", 1.5f64).send();
        client.gauge("gauge", MetricValue::Signed(-2)).send();
        client.flush_sink();

        let packets = packets.lock().unwrap();
        assert_eq!(
            packets.as_slice(),
            &[b"test.gauge:1.5|g\ntest.gauge:-2|g".to_vec()]
        );
    }

    #[test]
    fn gauge_with_tags_no_prefix() {
        let (client, packets) = new_client("", 1024);
        client.gauge("gauge", 20u8).with_tag("t", "v").send();
        client.flush_sink();

        let packets = packets.lock().unwrap();
        assert_eq!(packets.as_slice(), &[b"gauge:20|g|#t:v".to_vec()]);
    }

    #[test]
    fn derived_clients_share_sink() {
        let (client, packets) = new_client("test", 1024);
        let sda = client.clone().with_tag("device", "sda");
        let sdb = client.clone().with_tag("device", "sdb");
        sda.count("count", 1).with_tag("op", "read").send();
        sdb.gauge("gauge", 2).send();
        client.flush_sink();

        let packets = packets.lock().unwrap();
        assert_eq!(
            packets.as_slice(),
            &[b"test.count:1|c|#device:sda,op:read\ntest.gauge:2|g|#device:sdb".to_vec()]
        );
    }

    #[test]
    fn flush_split_segments() {
        let (client, packets) = new_client("test", 16);
        client.count("count", 20).send();
        client.count("count", 30).send();
        client.flush_sink();

        let packets = packets.lock().unwrap();
        assert_eq!(
            packets.as_slice(),
            &[b"test.count:20|c".to_vec(), b"test.count:30|c".to_vec()]
        );
    }
}
