/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use anyhow::anyhow;
use yaml_rust::Yaml;

use super::{AclConfig, SourceConfig};
use crate::config::yaml;

#[derive(Clone, Debug, Default)]
pub struct BlockStatConfig {
    pub device: AclConfig,
}

impl SourceConfig for BlockStatConfig {
    fn source_name(&self) -> &'static str {
        crate::source::blockstat::SOURCE_NAME
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match yaml::normalize_key(k).as_str() {
            "include_device" => self.device.add_include(v),
            "exclude_device" => self.device.add_exclude(v),
            _ => Err(anyhow!("invalid key {k}")),
        }
    }

    fn validate(&mut self) -> Vec<String> {
        self.device.normalize();
        Vec::new()
    }
}
