/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use anyhow::anyhow;
use yaml_rust::{Yaml, yaml};

mod acl;
pub use acl::AclConfig;

pub mod blockstat;
pub mod diskfree;
pub mod ipmi;
pub mod procnetdev;
pub mod smart;

pub trait SourceConfig {
    fn source_name(&self) -> &'static str;

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()>;

    /// Normalize the settings and report every problem found.
    fn validate(&mut self) -> Vec<String>;
}

#[derive(Clone, Debug)]
pub enum AnySourceConfig {
    BlockStat(blockstat::BlockStatConfig),
    DiskFree(diskfree::DiskFreeConfig),
    Ipmi(ipmi::IpmiConfig),
    ProcNetDev(procnetdev::ProcNetDevConfig),
    Smart(smart::SmartConfig),
}

macro_rules! impl_dispatch {
    ($self:ident, $c:ident => $e:expr) => {
        match $self {
            AnySourceConfig::BlockStat($c) => $e,
            AnySourceConfig::DiskFree($c) => $e,
            AnySourceConfig::Ipmi($c) => $e,
            AnySourceConfig::ProcNetDev($c) => $e,
            AnySourceConfig::Smart($c) => $e,
        }
    };
}

impl SourceConfig for AnySourceConfig {
    fn source_name(&self) -> &'static str {
        impl_dispatch!(self, c => c.source_name())
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        impl_dispatch!(self, c => c.set(k, v))
    }

    fn validate(&mut self) -> Vec<String> {
        impl_dispatch!(self, c => c.validate())
    }
}

/// Validated per source settings, looked up by source name.
#[derive(Clone, Debug)]
pub struct OptionProvider {
    sections: Vec<AnySourceConfig>,
}

impl Default for OptionProvider {
    fn default() -> Self {
        OptionProvider {
            sections: vec![
                AnySourceConfig::BlockStat(Default::default()),
                AnySourceConfig::DiskFree(Default::default()),
                AnySourceConfig::Ipmi(Default::default()),
                AnySourceConfig::ProcNetDev(Default::default()),
                AnySourceConfig::Smart(Default::default()),
            ],
        }
    }
}

impl OptionProvider {
    pub fn get(&self, source: &str) -> Option<&AnySourceConfig> {
        self.sections.iter().find(|c| c.source_name() == source)
    }

    fn get_mut(&mut self, source: &str) -> anyhow::Result<&mut AnySourceConfig> {
        self.sections
            .iter_mut()
            .find(|c| c.source_name() == source)
            .ok_or_else(|| anyhow!("source {source} has no options"))
    }

    pub fn set(&mut self, source: &str, k: &str, v: &Yaml) -> anyhow::Result<()> {
        self.get_mut(source)?.set(k, v)
    }

    /// Load the `source` map of the config file.
    pub(crate) fn parse_yaml(&mut self, v: &Yaml) -> anyhow::Result<()> {
        let Yaml::Hash(map) = v else {
            return Err(anyhow!("yaml value type for 'source' should be 'map'"));
        };
        super::yaml::foreach_kv(map, |source, v| match v {
            Yaml::Hash(section) => self.parse_section(source, section),
            Yaml::Null => Ok(()),
            _ => Err(anyhow!("yaml value type for source {source} should be 'map'")),
        })
    }

    fn parse_section(&mut self, source: &str, map: &yaml::Hash) -> anyhow::Result<()> {
        let config = self.get_mut(source)?;
        super::yaml::foreach_kv(map, |k, v| config.set(k, v))
    }

    /// Apply one `<source>.<key>=<value>` command line option.
    pub fn parse_option(&mut self, s: &str) -> anyhow::Result<()> {
        let (path, value) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("no '=' found in option {s}"))?;
        let (source, key) = path
            .split_once('.')
            .ok_or_else(|| anyhow!("option name {path} should be in <source>.<key> form"))?;
        self.set(source, key, &Yaml::String(value.to_string()))
            .map_err(|e| anyhow!("invalid option {path}: {e:#}"))
    }

    /// Validate all sections, failing with every error found.
    pub fn validate(&mut self) -> anyhow::Result<()> {
        let mut errors = Vec::new();
        for section in &mut self.sections {
            let name = section.source_name();
            for e in section.validate() {
                errors.push(format!("{name}: {e}"));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(
                "invalid source options:\n  {}",
                errors.join("\n  ")
            ))
        }
    }
}
