/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use anyhow::anyhow;
use yaml_rust::Yaml;

use super::{AclConfig, SourceConfig};
use crate::config::yaml;

#[derive(Clone, Debug, Default)]
pub struct ProcNetDevConfig {
    pub interface: AclConfig,
}

impl SourceConfig for ProcNetDevConfig {
    fn source_name(&self) -> &'static str {
        crate::source::procnetdev::SOURCE_NAME
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match yaml::normalize_key(k).as_str() {
            "include_interface" => self.interface.add_include(v),
            "exclude_interface" => self.interface.add_exclude(v),
            _ => Err(anyhow!("invalid key {k}")),
        }
    }

    fn validate(&mut self) -> Vec<String> {
        self.interface.normalize();
        Vec::new()
    }
}
