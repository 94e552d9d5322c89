/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use slog::{Logger, slog_debug, slog_warn};
use thiserror::Error;

use super::{BoxEmitter, Emitter};
use crate::config::source::blockstat::BlockStatConfig;
use crate::config::source::{AnySourceConfig, OptionProvider};
use crate::glob::Acl;
use crate::stat::{ArcMetricClient, StatsPool};

pub const SOURCE_NAME: &str = "blockstat";

const SYS_BLOCK_DIR: &str = "/sys/block";

#[derive(Debug, Error, PartialEq, Eq)]
enum ParseError {
    #[error("unsupported field count {0}")]
    UnsupportedLayout(usize),
    #[error("invalid number {0}")]
    InvalidNumber(String),
}

#[derive(Debug, Default, PartialEq, Eq)]
struct IoStat {
    requests: u64,
    merges: u64,
    sectors: u64,
    ticks: u64,
}

impl IoStat {
    fn emit(&self, client: &ArcMetricClient, op: &str) {
        client.gauge(&format!("blockstat.{op}.requests"), self.requests);
        client.gauge(&format!("blockstat.{op}.merges"), self.merges);
        client.gauge(&format!("blockstat.{op}.sectors"), self.sectors);
        client.gauge(&format!("blockstat.{op}.ticks"), self.ticks);
    }
}

/// Content of `/sys/block/<dev>/stat`.
///
/// Kernels before 4.18 report 11 fields, discard stats come with 4.18 and
/// flush stats with 5.5.
#[derive(Debug, Default, PartialEq, Eq)]
struct BlockStat {
    read: IoStat,
    write: IoStat,
    in_flight: u64,
    io_ticks: u64,
    time_in_queue: u64,
    discard: Option<IoStat>,
    flush: Option<(u64, u64)>,
}

impl FromStr for BlockStat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split_ascii_whitespace()
            .map(|v| u64::from_str(v).map_err(|_| ParseError::InvalidNumber(v.to_string())))
            .collect::<Result<Vec<u64>, _>>()?;
        if !matches!(values.len(), 11 | 15 | 17) {
            return Err(ParseError::UnsupportedLayout(values.len()));
        }

        let io_stat = |i: usize| IoStat {
            requests: values[i],
            merges: values[i + 1],
            sectors: values[i + 2],
            ticks: values[i + 3],
        };
        Ok(BlockStat {
            read: io_stat(0),
            write: io_stat(4),
            in_flight: values[8],
            io_ticks: values[9],
            time_in_queue: values[10],
            discard: (values.len() >= 15).then(|| io_stat(11)),
            flush: (values.len() == 17).then(|| (values[15], values[16])),
        })
    }
}

impl BlockStat {
    fn is_idle(&self) -> bool {
        self.read.requests == 0 && self.write.requests == 0
    }

    fn emit(&self, client: &ArcMetricClient) {
        self.read.emit(client, "read");
        self.write.emit(client, "write");
        client.gauge("blockstat.inflight", self.in_flight);
        client.gauge("blockstat.ioticks", self.io_ticks);
        client.gauge("blockstat.timeinqueue", self.time_in_queue);
        if let Some(discard) = &self.discard {
            discard.emit(client, "discard");
        }
        if let Some((requests, ticks)) = self.flush {
            client.gauge("blockstat.flush.requests", requests);
            client.gauge("blockstat.flush.ticks", ticks);
        }
    }
}

struct BlockStatEmitter {
    logger: Logger,
    pool: Arc<StatsPool>,
    device: Acl,
}

pub(super) fn new_emitter(
    logger: &Logger,
    pool: &Arc<StatsPool>,
    options: &OptionProvider,
) -> Option<BoxEmitter> {
    let device = match options.get(SOURCE_NAME) {
        Some(AnySourceConfig::BlockStat(c)) => c.device.build(),
        _ => BlockStatConfig::default().device.build(),
    };
    Some(Box::new(BlockStatEmitter {
        logger: logger.clone(),
        pool: Arc::clone(pool),
        device,
    }))
}

impl BlockStatEmitter {
    fn emit_device(&self, device: &str, content: &str) {
        if !self.device.allows(device) {
            return;
        }
        match BlockStat::from_str(content) {
            Ok(stat) if stat.is_idle() => {}
            Ok(stat) => stat.emit(&self.pool.host(&[("device", device)])),
            Err(e) => slog_warn!(self.logger, "invalid stat of block device {device}: {e}"),
        }
    }

    fn emit_dir(&self, dir: &Path) {
        let entries = match std::fs::read_dir(dir) {
            Ok(d) => d,
            Err(e) => {
                slog_warn!(self.logger, "failed to read dir {}: {e}", dir.display());
                return;
            }
        };
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(device) = file_name.to_str() else {
                continue;
            };
            let path = entry.path().join("stat");
            match std::fs::read_to_string(&path) {
                Ok(content) => self.emit_device(device, &content),
                Err(e) => slog_debug!(self.logger, "failed to read {}: {e}", path.display()),
            }
        }
    }
}

#[async_trait]
impl Emitter for BlockStatEmitter {
    async fn emit(&mut self) {
        self.emit_dir(Path::new(SYS_BLOCK_DIR));
    }
}
