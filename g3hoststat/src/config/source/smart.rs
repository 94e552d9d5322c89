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
pub struct SmartConfig {
    pub device: AclConfig,
    pub command_timeout: Duration,
}

impl Default for SmartConfig {
    fn default() -> Self {
        SmartConfig {
            device: AclConfig::default(),
            command_timeout: crate::source::exec::DEFAULT_TIMEOUT,
        }
    }
}

impl SourceConfig for SmartConfig {
    fn source_name(&self) -> &'static str {
        crate::source::smart::SOURCE_NAME
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match yaml::normalize_key(k).as_str() {
            "include_device" => self.device.add_include(v),
            "exclude_device" => self.device.add_exclude(v),
            "command_timeout" => {
                self.command_timeout = yaml::as_duration(v)?;
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        }
    }

    fn validate(&mut self) -> Vec<String> {
        let mut errors = Vec::new();
        self.device.normalize();
        if self.command_timeout.is_zero() {
            errors.push("command timeout should not be zero".to_string());
        }
        errors
    }
}
