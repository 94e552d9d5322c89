/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use slog::{Logger, slog_warn};

use super::{BoxEmitter, Emitter};
use crate::config::source::OptionProvider;
use crate::stat::{ArcMetricClient, StatsPool};

pub const SOURCE_NAME: &str = "meminfo";

const MEMINFO_PATH: &str = "/proc/meminfo";

const TRACKED_FIELDS: &[(&str, &str)] = &[
    ("procmeminfo.mem_total", "MemTotal"),
    ("procmeminfo.mem_free", "MemFree"),
    ("procmeminfo.mem_available", "MemAvailable"),
    ("procmeminfo.buffers", "Buffers"),
    ("procmeminfo.cached", "Cached"),
    ("procmeminfo.slab", "Slab"),
];

struct MemInfoEmitter {
    logger: Logger,
    client: ArcMetricClient,
}

pub(super) fn new_emitter(
    logger: &Logger,
    pool: &Arc<StatsPool>,
    _options: &OptionProvider,
) -> Option<BoxEmitter> {
    Some(Box::new(MemInfoEmitter {
        logger: logger.clone(),
        client: pool.host(&[]),
    }))
}

/// Parse `/proc/meminfo`, with `kB` values converted to bytes.
fn parse(content: &str) -> HashMap<&str, u64> {
    let mut map = HashMap::new();
    for line in content.lines() {
        let mut iter = line.split_ascii_whitespace();
        let Some(name) = iter.next() else {
            continue;
        };
        let Some(Ok(value)) = iter.next().map(u64::from_str) else {
            continue;
        };
        let value = match iter.next() {
            Some("kB") => value.saturating_mul(1024),
            _ => value,
        };
        map.insert(name.trim_end_matches(':'), value);
    }
    map
}

impl MemInfoEmitter {
    fn emit_content(&self, content: &str) {
        let values = parse(content);
        for (metric, field) in TRACKED_FIELDS {
            match values.get(field) {
                Some(v) => self.client.gauge(metric, *v),
                None => slog_warn!(self.logger, "field {field} not found in {MEMINFO_PATH}"),
            }
        }
    }
}

#[async_trait]
impl Emitter for MemInfoEmitter {
    async fn emit(&mut self) {
        match std::fs::read_to_string(MEMINFO_PATH) {
            Ok(content) => self.emit_content(&content),
            Err(e) => slog_warn!(self.logger, "failed to read {MEMINFO_PATH}: {e}"),
        }
    }
}
