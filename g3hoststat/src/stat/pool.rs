/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::collections::HashMap;
#[cfg(test)]
use std::io::Write;
use std::sync::{Arc, Mutex};

use foldhash::fast::FixedState;

use g3_statsd_client::StatsdClient;

use super::console::{self, ConsoleMetricClient, ConsoleSink};
use super::statsd::StatsdMetricClient;
use super::ArcMetricClient;

const TAG_KEY_HOST: &str = "host";

enum PoolBackend {
    Statsd(StatsdClient),
    Console(ConsoleSink),
}

impl PoolBackend {
    fn new_client(&self, tags: &[(&str, &str)]) -> ArcMetricClient {
        match self {
            PoolBackend::Statsd(base) => Arc::new(StatsdMetricClient::new(base, tags)),
            PoolBackend::Console(sink) => Arc::new(ConsoleMetricClient::new(sink, tags)),
        }
    }
}

/// Hands out tag bound metric clients, at most one per distinct tag sequence.
///
/// All statsd clients derive from the same base client and so share a single
/// socket and send buffer.
pub struct StatsPool {
    host_name: String,
    backend: PoolBackend,
    clients: Mutex<HashMap<String, ArcMetricClient, FixedState>>,
}

impl StatsPool {
    fn with_backend(host_name: &str, backend: PoolBackend) -> Self {
        StatsPool {
            host_name: host_name.to_string(),
            backend,
            clients: Mutex::new(HashMap::with_hasher(FixedState::with_seed(0))),
        }
    }

    pub fn new_statsd(host_name: &str, client: StatsdClient) -> Self {
        StatsPool::with_backend(host_name, PoolBackend::Statsd(client))
    }

    pub fn new_console(host_name: &str) -> Self {
        StatsPool::with_backend(host_name, PoolBackend::Console(console::stdout_sink()))
    }

    #[cfg(test)]
    pub(crate) fn new_console_with_writer<W: Write + Send + 'static>(
        host_name: &str,
        writer: W,
    ) -> Self {
        let sink: ConsoleSink = Arc::new(Mutex::new(Box::new(writer)));
        StatsPool::with_backend(host_name, PoolBackend::Console(sink))
    }

    #[inline]
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Get the client for the given tags with the host tag prepended.
    pub fn host(&self, tags: &[(&str, &str)]) -> ArcMetricClient {
        let mut all_tags = Vec::with_capacity(tags.len() + 1);
        all_tags.push((TAG_KEY_HOST, self.host_name.as_str()));
        all_tags.extend_from_slice(tags);
        self.global(&all_tags)
    }

    /// Get the client for exactly the given tags.
    pub fn global(&self, tags: &[(&str, &str)]) -> ArcMetricClient {
        let key = cache_key(tags);
        let mut ht = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        ht.entry(key)
            .or_insert_with(|| self.backend.new_client(tags))
            .clone()
    }

    pub fn flush(&self) {
        match &self.backend {
            PoolBackend::Statsd(client) => client.flush_sink(),
            PoolBackend::Console(sink) => {
                let mut sink = sink.lock().unwrap_or_else(|e| e.into_inner());
                let _ = sink.flush();
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn cached_count(&self) -> usize {
        self.clients.lock().unwrap().len()
    }
}

fn cache_key(tags: &[(&str, &str)]) -> String {
    let len = tags.iter().map(|(k, v)| k.len() + v.len() + 2).sum();
    let mut key = String::with_capacity(len);
    for (k, v) in tags {
        if !key.is_empty() {
            key.push('\0');
        }
        key.push_str(k);
        key.push('\0');
        key.push_str(v);
    }
    key
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io;

    #[derive(Clone, Default)]
    pub(crate) struct SharedBuf(pub(crate) Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        pub(crate) fn lines(&self) -> Vec<String> {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf)
                .lines()
                .map(|s| s.to_string())
                .collect()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn key() {
        assert_eq!(cache_key(&[]), "");
        assert_eq!(cache_key(&[("k", "v")]), "k\0v");
        assert_ne!(cache_key(&[("k", "v,a")]), cache_key(&[("k", "v"), ("a", "")]));
    }

    #[test]
    fn same_tags_same_client() {
        let pool = StatsPool::new_console_with_writer("node1", SharedBuf::default());
        let a = pool.global(&[("k", "v")]);
        let b = pool.global(&[("k", "v")]);
        let c = pool.global(&[("k", "v2")]);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(pool.cached_count(), 2);

        let h1 = pool.host(&[("k", "v")]);
        let h2 = pool.host(&[("k", "v")]);
        assert!(Arc::ptr_eq(&h1, &h2));
        assert!(!Arc::ptr_eq(&h1, &a));
        assert_eq!(pool.cached_count(), 3);
    }

    #[test]
    fn tag_order_matters() {
        let pool = StatsPool::new_console_with_writer("node1", SharedBuf::default());
        let a = pool.global(&[("a", "1"), ("b", "2")]);
        let b = pool.global(&[("b", "2"), ("a", "1")]);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn host_tag() {
        let buf = SharedBuf::default();
        let pool = StatsPool::new_console_with_writer("node1", buf.clone());
        pool.host(&[("device", "sda")]).gauge("blockstat.read.requests", 3u64);
        pool.host(&[]).count("meminfo.mem_free", 1i32);
        pool.global(&[("device", "sda")]).gauge("blockstat.read.requests", 1.5f64);
        pool.flush();

        assert_eq!(
            buf.lines(),
            vec![
                "Gauge: blockstat.read.requests{host=node1,device=sda}=3".to_string(),
                "Count: meminfo.mem_free{host=node1}=1".to_string(),
                "Gauge: blockstat.read.requests{device=sda}=1.5".to_string(),
            ]
        );
    }

    #[test]
    fn concurrent_first_use() {
        let pool = Arc::new(StatsPool::new_console_with_writer(
            "node1",
            SharedBuf::default(),
        ));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || pool.host(&[("interface", "eth0")]))
            })
            .collect();
        let clients: Vec<ArcMetricClient> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        for c in &clients[1..] {
            assert!(Arc::ptr_eq(&clients[0], c));
        }
        assert_eq!(pool.cached_count(), 1);
    }
}
