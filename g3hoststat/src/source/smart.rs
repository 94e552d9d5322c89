/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::Regex;
use slog::{Logger, slog_debug, slog_error, slog_warn};
use thiserror::Error;

use super::exec::{self, ExecError};
use super::{BoxEmitter, Emitter};
use crate::backoff::{BackoffGuard, DEFAULT_PAUSE};
use crate::config::source::smart::SmartConfig;
use crate::config::source::{AnySourceConfig, OptionProvider};
use crate::glob::Acl;
use crate::stat::StatsPool;

pub const SOURCE_NAME: &str = "smart";

const SMARTCTL_PATH: &str = "/usr/sbin/smartctl";

const INFO_SECTION_HEADER: &str = "=== START OF INFORMATION SECTION ===";
const ATTRIBUTE_TABLE_HEADER: &str = "ID#";
const SERIAL_NUMBER_KEY: &str = "Serial Number";

const SCAN_REGEX: &str = r"^(/[0-9a-zA-Z/_\-]+).*$";
const ATTRIBUTE_REGEX: &str = r"\s*([0-9]+)\s([^\s]+)\s+(0x[0-9a-fA-F]{4})\s+(\d+)\s+(\d+)\s+(\d+)\s+([a-zA-Z_\-]+)\s+([a-zA-Z_\-]+)\s+([a-zA-Z_\-]+)\s+(.*)";

#[derive(Debug, Error)]
enum SmartError {
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("no serial number found for device {0}")]
    NoSerialNumber(String),
}

#[derive(Debug, PartialEq, Eq)]
struct Attribute<'a> {
    name: &'a str,
    raw_value: u64,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct DeviceReport<'a> {
    serial_number: Option<&'a str>,
    attributes: Vec<Attribute<'a>>,
}

#[derive(Clone, Copy)]
enum Section {
    Other,
    Information,
    Attributes,
}

struct OutputParser {
    scan: Regex,
    attribute: Regex,
}

impl OutputParser {
    fn new() -> Result<Self, regex::Error> {
        Ok(OutputParser {
            scan: Regex::new(SCAN_REGEX)?,
            attribute: Regex::new(ATTRIBUTE_REGEX)?,
        })
    }

    /// Get device paths from the output of `smartctl --scan`.
    fn parse_scan<'a>(&self, output: &'a str) -> Vec<&'a str> {
        output
            .lines()
            .filter_map(|line| self.scan.captures(line))
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .collect()
    }

    /// Parse the output of `smartctl --attributes --info <device>`.
    fn parse_report<'a>(&self, output: &'a str) -> DeviceReport<'a> {
        let mut report = DeviceReport::default();
        let mut section = Section::Other;
        for line in output.lines() {
            if line.is_empty() {
                section = Section::Other;
                continue;
            }
            if line == INFO_SECTION_HEADER {
                section = Section::Information;
                continue;
            }
            if line.starts_with(ATTRIBUTE_TABLE_HEADER) {
                section = Section::Attributes;
                continue;
            }

            match section {
                Section::Information => {
                    if let Some((k, v)) = line.split_once(':')
                        && k.trim() == SERIAL_NUMBER_KEY
                    {
                        report.serial_number = Some(v.trim());
                    }
                }
                Section::Attributes => {
                    let Some(c) = self.attribute.captures(line) else {
                        continue;
                    };
                    let (Some(name), Some(raw)) = (c.get(2), c.get(10)) else {
                        continue;
                    };
                    // raw values may carry details, like "33 (Min/Max 18/48)"
                    let raw = raw.as_str().split(' ').next().unwrap_or_default();
                    if let Ok(raw_value) = u64::from_str(raw) {
                        report.attributes.push(Attribute {
                            name: name.as_str(),
                            raw_value,
                        });
                    }
                }
                Section::Other => {}
            }
        }
        report
    }
}

struct SmartEmitter {
    logger: Logger,
    pool: Arc<StatsPool>,
    device: Acl,
    command_timeout: Duration,
    parser: OutputParser,
    backoff: BackoffGuard,
}

pub(super) fn new_emitter(
    logger: &Logger,
    pool: &Arc<StatsPool>,
    options: &OptionProvider,
) -> Option<BoxEmitter> {
    let config = match options.get(SOURCE_NAME) {
        Some(AnySourceConfig::Smart(c)) => c.clone(),
        _ => SmartConfig::default(),
    };
    let parser = match OutputParser::new() {
        Ok(p) => p,
        Err(e) => {
            slog_error!(logger, "failed to build output parser: {e}");
            return None;
        }
    };
    Some(Box::new(SmartEmitter {
        logger: logger.clone(),
        pool: Arc::clone(pool),
        device: config.device.build(),
        command_timeout: config.command_timeout,
        parser,
        backoff: BackoffGuard::default(),
    }))
}

impl SmartEmitter {
    async fn smartctl(&self, args: &[&str]) -> Result<String, ExecError> {
        let output = exec::run(SMARTCTL_PATH, args, self.command_timeout).await?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    async fn device_report(&self, device: &str) -> Result<String, ExecError> {
        self.smartctl(&["--attributes", "--info", device]).await
    }

    fn emit_report(&self, device: &str, report: &DeviceReport<'_>) -> Result<(), SmartError> {
        let serial_number = report
            .serial_number
            .ok_or_else(|| SmartError::NoSerialNumber(device.to_string()))?;
        for attr in &report.attributes {
            self.pool
                .host(&[("serial", serial_number), ("attribute", attr.name)])
                .gauge("smart.attribute", attr.raw_value);
        }
        Ok(())
    }

    /// Emit all allowed devices, returning the last command failure if any.
    ///
    /// A failed or unidentified device does not stop the others.
    async fn collect_devices<'a, F, Fut>(
        &self,
        devices: &[&'a str],
        fetch: F,
    ) -> Option<ExecError>
    where
        F: Fn(&'a str) -> Fut,
        Fut: Future<Output = Result<String, ExecError>>,
    {
        let mut failure = None;
        for &device in devices {
            if !self.device.allows(device) {
                slog_debug!(self.logger, "device {device} skipped");
                continue;
            }
            let output = match fetch(device).await {
                Ok(output) => output,
                Err(e) => {
                    slog_warn!(self.logger, "failed to query device {device}: {e}");
                    failure = Some(e);
                    continue;
                }
            };
            let report = self.parser.parse_report(&output);
            if let Err(e) = self.emit_report(device, &report) {
                slog_warn!(self.logger, "device {device} skipped: {e}");
            }
        }
        failure
    }

    async fn collect(&self) -> Result<(), SmartError> {
        let scan = self.smartctl(&["--scan"]).await?;
        let devices = self.parser.parse_scan(&scan);
        match self
            .collect_devices(&devices, |device| self.device_report(device))
            .await
        {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Emitter for SmartEmitter {
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
    use crate::stat::SharedBuf;

    const SCAN_OUTPUT: &str = "\
/dev/sda -d scsi # /dev/sda, SCSI device
/dev/bus/0 -d megaraid,0 # /dev/bus/0 [megaraid_disk_00], SCSI device
/dev/nvme0 -d nvme # /dev/nvme0, NVMe device
# no more devices
";

    const REPORT_OUTPUT: &str = "\
smartctl 7.2 2020-12-30 r5155 [x86_64-linux-5.15.0] (local build)
Copyright (C) 2002-20, Bruce Allen, Christian Franke, www.smartmontools.org

=== START OF INFORMATION SECTION ===
Model Family:     Samsung based SSDs
Device Model:     Samsung SSD 860 EVO 500GB
Serial Number:    S3Z1NB0K123456A
LU WWN Device Id: 5 002538 e40a1b2c3
Firmware Version: RVT02B6Q
User Capacity:    500,107,862,016 bytes [500 GB]

=== START OF READ SMART DATA SECTION ===
SMART Attributes Data Structure revision number: 1
Vendor Specific SMART Attributes with Thresholds:
ID# ATTRIBUTE_NAME          FLAG     VALUE WORST THRESH TYPE      UPDATED  WHEN_FAILED RAW_VALUE
  5 Reallocated_Sector_Ct   0x0033   100   100   010    Pre-fail  Always       -       0
  9 Power_On_Hours          0x0032   095   095   000    Old_age   Always       -       23456
194 Temperature_Celsius     0x0022   067   052   000    Old_age   Always       -       33 (Min/Max 18/48)
241 Total_LBAs_Written      0x0032   099   099   000    Old_age   Always       -       12/34

";

    #[test]
    fn parse_scan() {
        let parser = OutputParser::new().unwrap();
        assert_eq!(
            parser.parse_scan(SCAN_OUTPUT),
            vec!["/dev/sda", "/dev/bus/0", "/dev/nvme0"]
        );
    }

    #[test]
    fn parse_report() {
        let parser = OutputParser::new().unwrap();
        let report = parser.parse_report(REPORT_OUTPUT);
        assert_eq!(report.serial_number, Some("S3Z1NB0K123456A"));
        assert_eq!(
            report.attributes,
            vec![
                Attribute {
                    name: "Reallocated_Sector_Ct",
                    raw_value: 0
                },
                Attribute {
                    name: "Power_On_Hours",
                    raw_value: 23456
                },
                Attribute {
                    name: "Temperature_Celsius",
                    raw_value: 33
                },
            ]
        );

        // the serial number line outside of the information section
        let report = parser.parse_report("Serial Number: X\n");
        assert!(report.serial_number.is_none());
    }

    fn test_emitter(buf: &SharedBuf) -> SmartEmitter {
        SmartEmitter {
            logger: Logger::root(slog::Discard, slog::o!()),
            pool: Arc::new(StatsPool::new_console_with_writer("node1", buf.clone())),
            device: Acl::default(),
            command_timeout: exec::DEFAULT_TIMEOUT,
            parser: OutputParser::new().unwrap(),
            backoff: BackoffGuard::default(),
        }
    }

    #[test]
    fn emit_report() {
        let buf = SharedBuf::default();
        let emitter = test_emitter(&buf);
        let report = emitter.parser.parse_report(REPORT_OUTPUT);
        emitter.emit_report("/dev/sda", &report).unwrap();
        assert_eq!(
            buf.lines()[2],
            "Gauge: smart.attribute{host=node1,serial=S3Z1NB0K123456A,attribute=Temperature_Celsius}=33"
        );

        let report = DeviceReport::default();
        assert!(matches!(
            emitter.emit_report("/dev/sdb", &report),
            Err(SmartError::NoSerialNumber(_))
        ));
    }

    const NO_SERIAL_OUTPUT: &str = "\
ID# ATTRIBUTE_NAME          FLAG     VALUE WORST THRESH TYPE      UPDATED  WHEN_FAILED RAW_VALUE
  9 Power_On_Hours          0x0032   095   095   000    Old_age   Always       -       100
";

    async fn fake_smartctl(device: &str) -> Result<String, ExecError> {
        match device {
            "/dev/sda" => Ok(REPORT_OUTPUT.to_string()),
            "/dev/bus/0" => Ok(NO_SERIAL_OUTPUT.to_string()),
            _ => Err(ExecError::Timeout(
                SMARTCTL_PATH.to_string(),
                exec::DEFAULT_TIMEOUT,
            )),
        }
    }

    #[tokio::test]
    async fn device_without_serial_number() {
        let buf = SharedBuf::default();
        let emitter = test_emitter(&buf);
        let failure = emitter
            .collect_devices(&["/dev/bus/0", "/dev/sda"], fake_smartctl)
            .await;
        assert!(failure.is_none());
        let lines = buf.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.contains("serial=S3Z1NB0K123456A")));
    }

    #[tokio::test]
    async fn failed_device_does_not_stop_cycle() {
        let buf = SharedBuf::default();
        let emitter = test_emitter(&buf);
        let failure = emitter
            .collect_devices(&["/dev/nvme0", "/dev/sda"], fake_smartctl)
            .await;
        assert!(matches!(failure, Some(ExecError::Timeout(..))));
        assert_eq!(buf.lines().len(), 3);
    }
}
