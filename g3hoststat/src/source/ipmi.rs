/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use slog::{Logger, slog_debug, slog_warn};
use thiserror::Error;

use super::exec::{self, ExecError};
use super::{BoxEmitter, Emitter};
use crate::backoff::{BackoffGuard, DEFAULT_PAUSE};
use crate::config::source::ipmi::IpmiConfig;
use crate::config::source::{AnySourceConfig, OptionProvider};
use crate::glob::Acl;
use crate::stat::StatsPool;

pub const SOURCE_NAME: &str = "ipmi";

const IPMI_SENSORS_PATH: &str = "/usr/sbin/ipmi-sensors";
const NO_READING: &str = "N/A";

#[derive(Debug, Error)]
enum IpmiError {
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("no {0} column found in output header")]
    MissingColumn(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SensorKind {
    Temperature,
    Voltage,
    Fan,
    PhysicalSecurity,
    Unknown(String),
}

impl From<&str> for SensorKind {
    fn from(s: &str) -> Self {
        match s {
            "Temperature" => SensorKind::Temperature,
            "Voltage" => SensorKind::Voltage,
            "Fan" => SensorKind::Fan,
            "Physical Security" => SensorKind::PhysicalSecurity,
            _ => SensorKind::Unknown(s.to_string()),
        }
    }
}

#[derive(Debug, PartialEq)]
struct SensorReading<'a> {
    name: &'a str,
    kind: SensorKind,
    reading: &'a str,
    unit: &'a str,
}

#[derive(Clone, Copy)]
struct ColumnIndex {
    name: usize,
    kind: usize,
    reading: usize,
    unit: usize,
}

impl ColumnIndex {
    fn parse(header: &str) -> Result<Self, IpmiError> {
        let columns: Vec<&str> = header.split(',').map(str::trim).collect();
        let find = |col: &'static str| {
            columns
                .iter()
                .position(|c| *c == col)
                .ok_or(IpmiError::MissingColumn(col))
        };
        Ok(ColumnIndex {
            name: find("Name")?,
            kind: find("Type")?,
            reading: find("Reading")?,
            unit: find("Units")?,
        })
    }
}

/// Parse the csv output of `ipmi-sensors`, the first line being the header.
///
/// Lines with too few columns are dropped.
fn parse(output: &str) -> Result<Vec<SensorReading<'_>>, IpmiError> {
    let mut lines = output.lines();
    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };
    let index = ColumnIndex::parse(header)?;

    let mut readings = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let (Some(name), Some(kind), Some(reading), Some(unit)) = (
            fields.get(index.name),
            fields.get(index.kind),
            fields.get(index.reading),
            fields.get(index.unit),
        ) else {
            continue;
        };
        readings.push(SensorReading {
            name: *name,
            kind: SensorKind::from(*kind),
            reading: *reading,
            unit: *unit,
        });
    }
    Ok(readings)
}

struct IpmiEmitter {
    logger: Logger,
    pool: Arc<StatsPool>,
    sensor: Acl,
    command_timeout: Duration,
    backoff: BackoffGuard,
}

pub(super) fn new_emitter(
    logger: &Logger,
    pool: &Arc<StatsPool>,
    options: &OptionProvider,
) -> Option<BoxEmitter> {
    let config = match options.get(SOURCE_NAME) {
        Some(AnySourceConfig::Ipmi(c)) => c.clone(),
        _ => IpmiConfig::default(),
    };
    Some(Box::new(IpmiEmitter {
        logger: logger.clone(),
        pool: Arc::clone(pool),
        sensor: config.sensor.build(),
        command_timeout: config.command_timeout,
        backoff: BackoffGuard::default(),
    }))
}

impl IpmiEmitter {
    fn emit_readings(&self, readings: &[SensorReading<'_>]) {
        for r in readings {
            if !self.sensor.allows(r.name) {
                continue;
            }
            let metric = match (&r.kind, r.unit) {
                (SensorKind::Temperature, "C") => "ipmi.temperature",
                (SensorKind::Voltage, "V") => "ipmi.voltage",
                (SensorKind::Temperature | SensorKind::Voltage, unit) => {
                    slog_debug!(self.logger, "sensor {} has unexpected unit {unit}", r.name);
                    continue;
                }
                (SensorKind::Fan | SensorKind::PhysicalSecurity, _) => continue,
                (SensorKind::Unknown(kind), _) => {
                    slog_warn!(self.logger, "sensor {} has unknown type {kind}", r.name);
                    continue;
                }
            };
            if r.reading == NO_READING {
                continue;
            }
            let Ok(value) = f64::from_str(r.reading) else {
                slog_warn!(
                    self.logger,
                    "failed to parse reading {} of sensor {}",
                    r.reading,
                    r.name
                );
                continue;
            };
            self.pool.host(&[("sensor", r.name)]).gauge(metric, value);
        }
    }

    async fn collect(&self) -> Result<(), IpmiError> {
        let output = exec::run(
            IPMI_SENSORS_PATH,
            &["--comma-separated-output"],
            self.command_timeout,
        )
        .await?;
        let output = String::from_utf8_lossy(&output);
        let readings = parse(&output)?;
        self.emit_readings(&readings);
        Ok(())
    }
}

#[async_trait]
impl Emitter for IpmiEmitter {
    async fn emit(&mut self) {
        let now = Instant::now();
        if !self.backoff.should_run(now) {
            return;
        }
        if let Err(e) = self.collect().await {
            slog_warn!(self.logger, "collect failed, will retry after {DEFAULT_PAUSE:?}: {e}");
            self.backoff.record_failure(now, DEFAULT_PAUSE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slog::Drain;

    use crate::log::StdioDrain;
    use crate::stat::SharedBuf;

    const SENSORS_OUTPUT: &str = "\
ID,Name,Type,Reading,Units,Event
1,CPU1 Temp,Temperature,45.00,C,'OK'
2,CPU2 Temp,Temperature,N/A,C,N/A
3,FAN1,Fan,3600.00,RPM,'OK'
4,12V,Voltage,12.10,V,'OK'
5,Chassis Intru,Physical Security,N/A,N/A,'OK'
6,PS1 Status,Power Supply,N/A,N/A,'Presence detected'
7,Inlet Temp,Temperature,77.00,F,'OK'
8,PCH Temp,Temperature,fault,C,'OK'
9,broken
";

    #[test]
    fn kind() {
        assert_eq!(SensorKind::from("Fan"), SensorKind::Fan);
        assert_eq!(
            SensorKind::from("Physical Security"),
            SensorKind::PhysicalSecurity
        );
        assert_eq!(
            SensorKind::from("Power Supply"),
            SensorKind::Unknown("Power Supply".to_string())
        );
    }

    #[test]
    fn parse_output() {
        let readings = parse(SENSORS_OUTPUT).unwrap();
        assert_eq!(readings.len(), 8);
        assert_eq!(
            readings[0],
            SensorReading {
                name: "CPU1 Temp",
                kind: SensorKind::Temperature,
                reading: "45.00",
                unit: "C",
            }
        );
        assert_eq!(readings[1].reading, "N/A");

        // columns are located by the header
        let readings = parse("Units,Reading,Type,Name\nV,1.5,Voltage,VBAT\n").unwrap();
        assert_eq!(readings[0].name, "VBAT");
        assert_eq!(readings[0].reading, "1.5");

        assert!(matches!(
            parse("ID,Name,Reading,Units\n"),
            Err(IpmiError::MissingColumn("Type"))
        ));
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn emit_readings() {
        let buf = SharedBuf::default();
        let emitter = IpmiEmitter {
            logger: Logger::root(slog::Discard, slog::o!()),
            pool: Arc::new(StatsPool::new_console_with_writer("node1", buf.clone())),
            sensor: Acl::new(&[] as &[&str], ["CPU2*"], true),
            command_timeout: exec::DEFAULT_TIMEOUT,
            backoff: BackoffGuard::default(),
        };
        let readings = parse(SENSORS_OUTPUT).unwrap();
        emitter.emit_readings(&readings);
        assert_eq!(
            buf.lines(),
            vec![
                "Gauge: ipmi.temperature{host=node1,sensor=CPU1 Temp}=45.0",
                "Gauge: ipmi.voltage{host=node1,sensor=12V}=12.1",
            ]
        );
    }

    #[test]
    fn unparsable_reading() {
        let buf = SharedBuf::default();
        let log_buf = SharedBuf::default();
        let drain = StdioDrain::with_plain(log_buf.clone(), false);
        let emitter = IpmiEmitter {
            logger: Logger::root(drain.fuse(), slog::o!()),
            pool: Arc::new(StatsPool::new_console_with_writer("node1", buf.clone())),
            sensor: Acl::new(["PCH*", "CPU2*"], &[] as &[&str], true),
            command_timeout: exec::DEFAULT_TIMEOUT,
            backoff: BackoffGuard::default(),
        };
        let readings = parse(SENSORS_OUTPUT).unwrap();
        emitter.emit_readings(&readings);
        assert!(buf.lines().is_empty());

        // N/A is skipped quietly
        let logs = log_buf.lines();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].ends_with(" WARN failed to parse reading fault of sensor PCH Temp"));
    }
}
