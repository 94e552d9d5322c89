/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2026 ByteDance and/or its affiliates.
 */

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use g3_statsd_client::StatsdClientConfig;

pub(crate) mod yaml;

mod selection;
pub use selection::{SelectionMode, SelectionResult, SourceSelection};

pub mod source;

mod statsd;
pub(crate) use statsd::parse_target;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_ALIGN: Duration = Duration::from_secs(1);

/// Split every value on commas, dropping empty names.
pub fn flatten<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values
        .iter()
        .flat_map(|s| s.as_ref().split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    statsd: Option<StatsdClientConfig>,
    host_name: Option<String>,
    interval: Duration,
    align: Duration,
    enable: Vec<String>,
    disable: Vec<String>,
    options: source::OptionProvider,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            statsd: None,
            host_name: None,
            interval: DEFAULT_INTERVAL,
            align: DEFAULT_ALIGN,
            enable: Vec::new(),
            disable: Vec::new(),
            options: source::OptionProvider::default(),
        }
    }
}

impl AgentConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = AgentConfig::default();
        // allow multiple docs, and treat them as the same
        yaml::foreach_doc(path, |doc| match doc {
            Yaml::Hash(map) => config.load_doc(map),
            Yaml::Null => Ok(()),
            _ => Err(anyhow!("yaml doc root should be hash")),
        })?;
        Ok(config)
    }

    fn load_doc(&mut self, map: &yaml_rust::yaml::Hash) -> anyhow::Result<()> {
        yaml::foreach_kv(map, |k, v| self.set(k, v))
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match yaml::normalize_key(k).as_str() {
            "target" | "statsd" => {
                let config = statsd::as_statsd_client_config(v)?;
                self.statsd = Some(config);
                Ok(())
            }
            "host" | "host_name" => {
                self.host_name = Some(yaml::as_string(v)?);
                Ok(())
            }
            "interval" => {
                self.interval = yaml::as_duration(v)?;
                Ok(())
            }
            "align" => {
                self.align = yaml::as_duration(v)?;
                Ok(())
            }
            "enable" => {
                self.enable.extend(yaml::as_name_list(v)?);
                Ok(())
            }
            "disable" => {
                self.disable.extend(yaml::as_name_list(v)?);
                Ok(())
            }
            "source" => self.options.parse_yaml(v),
            _ => Err(anyhow!("invalid key {k} in main conf")),
        }
    }

    pub fn set_target(&mut self, target: &str) -> anyhow::Result<()> {
        let backend = parse_target(target)?;
        self.statsd
            .get_or_insert_with(StatsdClientConfig::default)
            .set_backend(backend);
        Ok(())
    }

    pub fn set_host_name(&mut self, name: &str) {
        self.host_name = Some(name.to_string());
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn set_align(&mut self, align: Duration) {
        self.align = align;
    }

    /// Command line selection replaces the one from the config file.
    pub fn set_selection(&mut self, enable: Vec<String>, disable: Vec<String>) {
        if !enable.is_empty() || !disable.is_empty() {
            self.enable = enable;
            self.disable = disable;
        }
    }

    #[inline]
    pub fn options_mut(&mut self) -> &mut source::OptionProvider {
        &mut self.options
    }

    #[inline]
    pub fn options(&self) -> &source::OptionProvider {
        &self.options
    }

    #[inline]
    pub fn statsd(&self) -> Option<&StatsdClientConfig> {
        self.statsd.as_ref()
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[inline]
    pub fn align(&self) -> Duration {
        self.align
    }

    /// The configured host name, or the kernel node name.
    pub fn host_name(&self) -> String {
        match &self.host_name {
            Some(name) => name.clone(),
            None => {
                let uname = rustix::system::uname();
                uname.nodename().to_string_lossy().into_owned()
            }
        }
    }

    pub fn selection(&self) -> anyhow::Result<SourceSelection> {
        SourceSelection::new(&self.enable, &self.disable)
    }

    /// Check everything before the scheduler starts.
    pub fn check(&mut self, dry_run: bool) -> anyhow::Result<()> {
        if self.interval.is_zero() {
            return Err(anyhow!("interval should not be zero"));
        }
        if self.align.is_zero() {
            return Err(anyhow!("align should not be zero"));
        }
        if !dry_run && self.statsd.is_none() {
            return Err(anyhow!("no statsd target set"));
        }
        if let Some(name) = &self.host_name
            && name.is_empty()
        {
            return Err(anyhow!("host name should not be empty"));
        }
        self.selection().context("invalid source selection")?;
        self.options.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yaml_rust::YamlLoader;

    fn load_str(s: &str) -> anyhow::Result<AgentConfig> {
        let mut config = AgentConfig::default();
        for doc in YamlLoader::load_from_str(s).unwrap() {
            let Yaml::Hash(map) = doc else {
                panic!("not a map");
            };
            config.load_doc(&map)?;
        }
        Ok(config)
    }

    #[test]
    fn flatten_names() {
        assert_eq!(
            flatten(&["a,b", "c", "", " d ,"]),
            vec!["a", "b", "c", "d"]
        );
        assert!(flatten::<&str>(&[]).is_empty());
    }

    #[test]
    fn full() {
        let mut config = load_str(
            r#"
target: 127.0.0.1:8125
host: node1
interval: 10s
align: 10
enable: [meminfo, "procstat,blockstat"]
source:
  blockstat:
    exclude-device: "loop*"
"#,
        )
        .unwrap();
        config.check(false).unwrap();
        assert_eq!(config.host_name(), "node1");
        assert_eq!(config.interval(), Duration::from_secs(10));
        assert_eq!(config.align(), Duration::from_secs(10));
        let selection = config.selection().unwrap();
        assert_eq!(selection.mode(), Some(SelectionMode::Enable));
        assert!(config.statsd().is_some());
    }

    #[test]
    fn invalid() {
        assert!(load_str("unknown: 1").is_err());
        assert!(load_str("interval: abc").is_err());

        let mut config = load_str("enable: meminfo\ndisable: procstat").unwrap();
        assert!(config.check(true).is_err());

        let mut config = load_str("interval: 0").unwrap();
        assert!(config.check(true).is_err());

        let mut config = AgentConfig::default();
        assert!(config.check(false).is_err());
        assert!(config.check(true).is_ok());
    }

    #[test]
    fn cli_override() {
        let mut config = load_str("enable: meminfo").unwrap();
        config.set_selection(Vec::new(), vec!["procstat".to_string()]);
        config.check(true).unwrap();
        let selection = config.selection().unwrap();
        assert_eq!(selection.mode(), Some(SelectionMode::Disable));

        config.set_target("127.0.0.1").unwrap();
        config.set_host_name("node2");
        config.check(false).unwrap();
        assert_eq!(config.host_name(), "node2");
    }

    #[test]
    fn default_host_name() {
        let config = AgentConfig::default();
        assert!(!config.host_name().is_empty());
    }
}
