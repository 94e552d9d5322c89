/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use slog::{Logger, slog_warn};

use super::{BoxEmitter, Emitter};
use crate::config::source::procnetdev::ProcNetDevConfig;
use crate::config::source::{AnySourceConfig, OptionProvider};
use crate::glob::Acl;
use crate::stat::StatsPool;

pub const SOURCE_NAME: &str = "procnetdev";

const PROC_NET_DEV_PATH: &str = "/proc/net/dev";

#[derive(Debug, PartialEq, Eq)]
struct InterfaceStats<'a> {
    name: &'a str,
    rx_bytes: u64,
    rx_packets: u64,
    tx_bytes: u64,
    tx_packets: u64,
}

impl<'a> InterfaceStats<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let (name, fields) = line.split_once(':')?;
        let mut values = [0u64; 16];
        let mut iter = fields.split_ascii_whitespace();
        for v in values.iter_mut() {
            *v = u64::from_str(iter.next()?).ok()?;
        }
        Some(InterfaceStats {
            name: name.trim(),
            rx_bytes: values[0],
            rx_packets: values[1],
            tx_bytes: values[8],
            tx_packets: values[9],
        })
    }
}

struct ProcNetDevEmitter {
    logger: Logger,
    pool: Arc<StatsPool>,
    interface: Acl,
}

pub(super) fn new_emitter(
    logger: &Logger,
    pool: &Arc<StatsPool>,
    options: &OptionProvider,
) -> Option<BoxEmitter> {
    let interface = match options.get(SOURCE_NAME) {
        Some(AnySourceConfig::ProcNetDev(c)) => c.interface.build(),
        _ => ProcNetDevConfig::default().interface.build(),
    };
    Some(Box::new(ProcNetDevEmitter {
        logger: logger.clone(),
        pool: Arc::clone(pool),
        interface,
    }))
}

impl ProcNetDevEmitter {
    fn emit_content(&self, content: &str) {
        // the first two lines are table headers
        for line in content.lines().skip(2) {
            let Some(stats) = InterfaceStats::parse(line) else {
                slog_warn!(self.logger, "invalid line in {PROC_NET_DEV_PATH}: {line}");
                continue;
            };
            if !self.interface.allows(stats.name) {
                continue;
            }

            let client = self.pool.host(&[("interface", stats.name)]);
            client.gauge("net.host.rx.bytes", stats.rx_bytes);
            client.gauge("net.host.rx.packets", stats.rx_packets);
            client.gauge("net.host.tx.bytes", stats.tx_bytes);
            client.gauge("net.host.tx.packets", stats.tx_packets);
        }
    }
}

#[async_trait]
impl Emitter for ProcNetDevEmitter {
    async fn emit(&mut self) {
        match std::fs::read_to_string(PROC_NET_DEV_PATH) {
            Ok(content) => self.emit_content(&content),
            Err(e) => slog_warn!(self.logger, "failed to read {PROC_NET_DEV_PATH}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stat::SharedBuf;

    const NET_DEV: &str = "Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 4096      40    0    0    0     0          0         0     4096      40    0    0    0     0       0          0
  eth0: 123456789 98765 0    2    0     0          0        12  87654321   54321    0    0    0     0       0          0
docker0:    0       0    0    0    0     0          0         0        0       0    0    0    0     0       0          0
";

    #[test]
    fn parse_line() {
        let stats = InterfaceStats::parse(
            "  eth0: 123456789 98765 0 2 0 0 0 12 87654321 54321 0 0 0 0 0 0",
        )
        .unwrap();
        assert_eq!(stats.name, "eth0");
        assert_eq!(stats.rx_bytes, 123456789);
        assert_eq!(stats.rx_packets, 98765);
        assert_eq!(stats.tx_bytes, 87654321);
        assert_eq!(stats.tx_packets, 54321);

        assert!(InterfaceStats::parse("eth0 1 2 3").is_none());
        assert!(InterfaceStats::parse("eth0: 1 2 3").is_none());
    }

    #[test]
    fn emit() {
        let buf = SharedBuf::default();
        let pool = Arc::new(StatsPool::new_console_with_writer("node1", buf.clone()));
        let emitter = ProcNetDevEmitter {
            logger: Logger::root(slog::Discard, slog::o!()),
            pool,
            interface: Acl::new(&[] as &[&str], &["lo", "docker*"], true),
        };
        emitter.emit_content(NET_DEV);

        assert_eq!(
            buf.lines(),
            vec![
                "Gauge: net.host.rx.bytes{host=node1,interface=eth0}=123456789",
                "Gauge: net.host.rx.packets{host=node1,interface=eth0}=98765",
                "Gauge: net.host.tx.bytes{host=node1,interface=eth0}=87654321",
                "Gauge: net.host.tx.packets{host=node1,interface=eth0}=54321",
            ]
        );
    }
}
