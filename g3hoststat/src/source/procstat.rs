/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use slog::{Logger, slog_debug, slog_warn};

use super::{BoxEmitter, Emitter};
use crate::config::source::OptionProvider;
use crate::stat::{ArcMetricClient, StatsPool};

pub const SOURCE_NAME: &str = "procstat";

const PROC_STAT_PATH: &str = "/proc/stat";

#[derive(Debug, Default, PartialEq, Eq)]
struct CpuTimes {
    user: u64,
    nice: u64,
    system: u64,
    idle: u64,
    iowait: u64,
    irq: u64,
    softirq: u64,
    steal: u64,
    guest: u64,
    guest_nice: u64,
}

impl CpuTimes {
    fn parse(fields: &str) -> Option<Self> {
        let mut values = [0u64; 10];
        let mut iter = fields.split_ascii_whitespace();
        for v in values.iter_mut() {
            *v = u64::from_str(iter.next()?).ok()?;
        }
        let [user, nice, system, idle, iowait, irq, softirq, steal, guest, guest_nice] = values;
        Some(CpuTimes {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
            guest,
            guest_nice,
        })
    }

    fn active(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
            + self.guest
            + self.guest_nice
    }

    fn emit(&self, client: &ArcMetricClient, scope: &str) {
        let name = |field: &str| format!("procstat.cpu.{scope}.{field}");
        client.gauge(&name("user"), self.user);
        client.gauge(&name("nice"), self.nice);
        client.gauge(&name("system"), self.system);
        client.gauge(&name("idle"), self.idle);
        client.gauge(&name("iowait"), self.iowait);
        client.gauge(&name("irq"), self.irq);
        client.gauge(&name("softirq"), self.softirq);
        client.gauge(&name("steal"), self.steal);
        client.gauge(&name("guest"), self.guest);
        client.gauge(&name("guestnice"), self.guest_nice);

        let active = self.active();
        client.gauge(&name("active"), active);
        client.gauge(&name("total"), active + self.idle);
    }
}

#[derive(Default)]
struct ProcStat<'a> {
    total: Option<CpuTimes>,
    per_cpu: Vec<(&'a str, CpuTimes)>,
}

fn parse<'a>(logger: &Logger, content: &'a str) -> ProcStat<'a> {
    let mut stat = ProcStat::default();
    for line in content.lines() {
        let Some((key, fields)) = line.split_once(' ') else {
            continue;
        };
        let Some(id) = key.strip_prefix("cpu") else {
            continue;
        };
        let Some(times) = CpuTimes::parse(fields) else {
            slog_warn!(logger, "invalid cpu line in {PROC_STAT_PATH}: {line}");
            continue;
        };
        if id.is_empty() {
            stat.total = Some(times);
        } else if id.bytes().all(|c| c.is_ascii_digit()) {
            stat.per_cpu.push((id, times));
        } else {
            slog_debug!(logger, "unknown cpu id {id}");
        }
    }
    stat
}

struct ProcStatEmitter {
    logger: Logger,
    pool: Arc<StatsPool>,
}

pub(super) fn new_emitter(
    logger: &Logger,
    pool: &Arc<StatsPool>,
    _options: &OptionProvider,
) -> Option<BoxEmitter> {
    Some(Box::new(ProcStatEmitter {
        logger: logger.clone(),
        pool: Arc::clone(pool),
    }))
}

impl ProcStatEmitter {
    fn emit_content(&self, content: &str) {
        let stat = parse(&self.logger, content);
        if let Some(total) = &stat.total {
            total.emit(&self.pool.host(&[]), "total");
        }
        for (id, times) in &stat.per_cpu {
            times.emit(&self.pool.host(&[("cpu", *id)]), "per");
        }
    }
}

#[async_trait]
impl Emitter for ProcStatEmitter {
    async fn emit(&mut self) {
        match std::fs::read_to_string(PROC_STAT_PATH) {
            Ok(content) => self.emit_content(&content),
            Err(e) => slog_warn!(self.logger, "failed to read {PROC_STAT_PATH}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stat::SharedBuf;

    const PROC_STAT: &str = "cpu  10 1 20 300 4 0 5 0 0 0
cpu0 6 1 10 150 2 0 3 0 0 0
cpu1 4 0 10 150 2 0 2 0 0 0
intr 1000 0 0
ctxt 5000
btime 1700000000
processes 100
procs_running 2
procs_blocked 0
softirq 10 1 2 3 4 5 6 7 8 9 10
";

    #[test]
    fn parse_cpu() {
        let logger = Logger::root(slog::Discard, slog::o!());
        let stat = parse(&logger, PROC_STAT);
        let total = stat.total.unwrap();
        assert_eq!(total.user, 10);
        assert_eq!(total.active(), 40);
        assert_eq!(stat.per_cpu.len(), 2);
        assert_eq!(stat.per_cpu[1].0, "1");

        assert!(CpuTimes::parse("1 2 3").is_none());
        assert!(CpuTimes::parse("1 2 3 4 5 6 7 8 9 x").is_none());
    }

    #[test]
    fn emit() {
        let buf = SharedBuf::default();
        let pool = Arc::new(StatsPool::new_console_with_writer("node1", buf.clone()));
        let logger = Logger::root(slog::Discard, slog::o!());
        let emitter = ProcStatEmitter {
            logger,
            pool: Arc::clone(&pool),
        };
        emitter.emit_content(PROC_STAT);

        let lines = buf.lines();
        assert_eq!(lines.len(), 36);
        assert_eq!(lines[0], "Gauge: procstat.cpu.total.user{host=node1}=10");
        assert_eq!(lines[11], "Gauge: procstat.cpu.total.total{host=node1}=340");
        assert_eq!(lines[12], "Gauge: procstat.cpu.per.user{host=node1,cpu=0}=6");
        assert_eq!(lines[35], "Gauge: procstat.cpu.per.total{host=node1,cpu=1}=168");
    }
}
