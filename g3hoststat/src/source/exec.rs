/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn {0}: {1}")]
    Spawn(String, io::Error),
    #[error("failed to wait {0}: {1}")]
    Wait(String, io::Error),
    #[error("{0} not finished in {1:?}")]
    Timeout(String, Duration),
    #[error("{0} exited with {1}")]
    Status(String, ExitStatus),
}

/// Run a command and return its stdout.
///
/// The child is killed if it is still running when the timeout expires.
pub async fn run(program: &str, args: &[&str], timeout: Duration) -> Result<Vec<u8>, ExecError> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ExecError::Spawn(program.to_string(), e))?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            if output.status.success() {
                Ok(output.stdout)
            } else {
                Err(ExecError::Status(program.to_string(), output.status))
            }
        }
        Ok(Err(e)) => Err(ExecError::Wait(program.to_string(), e)),
        Err(_) => Err(ExecError::Timeout(program.to_string(), timeout)),
    }
}
