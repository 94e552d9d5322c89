/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use yaml_rust::Yaml;

use crate::glob::Acl;

/// Include and exclude pattern lists for one kind of entity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AclConfig {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl AclConfig {
    pub(crate) fn add_include(&mut self, v: &Yaml) -> anyhow::Result<()> {
        let list = crate::config::yaml::as_name_list(v)?;
        self.include.extend(list);
        Ok(())
    }

    pub(crate) fn add_exclude(&mut self, v: &Yaml) -> anyhow::Result<()> {
        let list = crate::config::yaml::as_name_list(v)?;
        self.exclude.extend(list);
        Ok(())
    }

    pub(crate) fn set_default_exclude(&mut self, values: &[&str]) {
        if self.include.is_empty() && self.exclude.is_empty() {
            self.exclude = values.iter().map(|s| s.to_string()).collect();
        }
    }

    #[inline]
    pub fn include(&self) -> &[String] {
        &self.include
    }

    #[inline]
    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Split comma separated entries. A value matching both lists is rejected by the acl.
    pub(crate) fn normalize(&mut self) {
        self.include = crate::config::flatten(&self.include);
        self.exclude = crate::config::flatten(&self.exclude);
    }

    pub fn build(&self) -> Acl {
        Acl::new(&self.include, &self.exclude, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build() {
        let mut c = AclConfig::default();
        c.add_include(&Yaml::String("eth*".to_string())).unwrap();
        c.add_exclude(&Yaml::String("eth1".to_string())).unwrap();
        c.normalize();

        let acl = c.build();
        assert!(acl.allows("eth0"));
        assert!(!acl.allows("eth1"));
        assert!(!acl.allows("lo"));
    }

    #[test]
    fn default_exclude() {
        let mut c = AclConfig::default();
        c.set_default_exclude(&["tmpfs"]);
        assert_eq!(c.exclude(), &["tmpfs"]);

        let mut c = AclConfig::default();
        c.add_include(&Yaml::String("ext4".to_string())).unwrap();
        c.set_default_exclude(&["tmpfs"]);
        assert!(c.exclude().is_empty());
    }

    #[test]
    fn include_and_exclude() {
        let mut c = AclConfig::default();
        c.add_include(&Yaml::String("sda,sdb".to_string())).unwrap();
        c.add_exclude(&Yaml::String("sdb".to_string())).unwrap();
        c.normalize();
        assert_eq!(c.include(), &["sda", "sdb"]);

        let acl = c.build();
        assert!(acl.allows("sda"));
        assert!(!acl.allows("sdb"));
    }
}
