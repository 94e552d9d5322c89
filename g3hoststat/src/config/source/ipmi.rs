/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use anyhow::anyhow;
use yaml_rust::Yaml;

use super::{AclConfig, SourceConfig};
use crate::config::yaml;

#[derive(Clone, Debug)]
pub struct IpmiConfig {
    pub sensor: AclConfig,
    pub command_timeout: Duration,
}

impl Default for IpmiConfig {
    fn default() -> Self {
        IpmiConfig {
            sensor: AclConfig::default(),
            command_timeout: crate::source::exec::DEFAULT_TIMEOUT,
        }
    }
}

impl SourceConfig for IpmiConfig {
    fn source_name(&self) -> &'static str {
        crate::source::ipmi::SOURCE_NAME
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match yaml::normalize_key(k).as_str() {
            "include_sensor" => self.sensor.add_include(v),
            "exclude_sensor" => self.sensor.add_exclude(v),
            "command_timeout" => {
                self.command_timeout = yaml::as_duration(v)?;
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        }
    }

    fn validate(&mut self) -> Vec<String> {
        let mut errors = Vec::new();
        self.sensor.normalize();
        if self.command_timeout.is_zero() {
            errors.push("command timeout should not be zero".to_string());
        }
        errors
    }
}
