/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use slog::{Logger, slog_info, slog_warn};
use thiserror::Error;

use super::exec::{self, ExecError};
use super::{BoxEmitter, Emitter};
use crate::backoff::{BackoffGuard, DEFAULT_PAUSE};
use crate::config::source::OptionProvider;
use crate::stat::{ArcMetricClient, StatsPool};

pub const SOURCE_NAME: &str = "systemd";

/// Exists only if the host was booted with systemd, see sd_booted(3).
const SYSTEMD_RUNTIME_DIR: &str = "/run/systemd/system";
const SYSTEMCTL_PATHS: &[&str] = &["/usr/bin/systemctl", "/bin/systemctl"];

#[derive(Debug, Error)]
enum SystemdError {
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("invalid NFailedUnits value: {0}")]
    InvalidValue(String),
}

fn parse_failed_units(output: &str) -> Result<u64, SystemdError> {
    let s = output.trim();
    u64::from_str(s).map_err(|_| SystemdError::InvalidValue(s.to_string()))
}

struct SystemdEmitter {
    logger: Logger,
    client: ArcMetricClient,
    systemctl: &'static str,
    backoff: BackoffGuard,
}

pub(super) fn new_emitter(
    logger: &Logger,
    pool: &Arc<StatsPool>,
    _options: &OptionProvider,
) -> Option<BoxEmitter> {
    if !Path::new(SYSTEMD_RUNTIME_DIR).is_dir() {
        slog_info!(logger, "host not booted with systemd");
        return None;
    }
    let Some(systemctl) = SYSTEMCTL_PATHS
        .iter()
        .copied()
        .find(|p| Path::new(p).is_file())
    else {
        slog_info!(logger, "no systemctl found");
        return None;
    };
    Some(Box::new(SystemdEmitter {
        logger: logger.clone(),
        client: pool.host(&[]),
        systemctl,
        backoff: BackoffGuard::default(),
    }))
}

impl SystemdEmitter {
    async fn collect(&self) -> Result<(), SystemdError> {
        let output = exec::run(
            self.systemctl,
            &["show", "--property=NFailedUnits", "--value"],
            exec::DEFAULT_TIMEOUT,
        )
        .await?;
        let failed = parse_failed_units(&String::from_utf8_lossy(&output))?;
        self.client.gauge("systemd.failed_units", failed);
        Ok(())
    }
}

#[async_trait]
impl Emitter for SystemdEmitter {
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

    #[test]
    fn parse() {
        assert_eq!(parse_failed_units("0\n").unwrap(), 0);
        assert_eq!(parse_failed_units("3").unwrap(), 3);
        assert!(matches!(
            parse_failed_units("\n"),
            Err(SystemdError::InvalidValue(_))
        ));
    }

    #[tokio::test]
    async fn failure_pauses() {
        let buf = SharedBuf::default();
        let pool = StatsPool::new_console_with_writer("node1", buf.clone());
        let mut emitter = SystemdEmitter {
            logger: Logger::root(slog::Discard, slog::o!()),
            client: pool.host(&[]),
            systemctl: "/nonexistent/systemctl",
            backoff: BackoffGuard::default(),
        };
        emitter.emit().await;
        let until = emitter.backoff.paused_until().unwrap();
        assert!(until > Instant::now());

        // still paused, no new attempt
        emitter.emit().await;
        assert_eq!(emitter.backoff.paused_until(), Some(until));
        assert!(buf.lines().is_empty());
    }

    #[tokio::test]
    async fn invalid_output() {
        let buf = SharedBuf::default();
        let pool = StatsPool::new_console_with_writer("node1", buf.clone());
        let mut emitter = SystemdEmitter {
            logger: Logger::root(slog::Discard, slog::o!()),
            client: pool.host(&[]),
            // prints the arguments, which is not a number
            systemctl: "echo",
            backoff: BackoffGuard::default(),
        };
        emitter.emit().await;
        assert!(emitter.backoff.paused_until().is_some());
    }
}
