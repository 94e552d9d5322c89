/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use anyhow::anyhow;
use yaml_rust::Yaml;

use super::{AclConfig, SourceConfig};
use crate::config::yaml;

const DEFAULT_EXCLUDE_FS_TYPES: &[&str] = &[
    "autofs",
    "aufs",
    "bpf",
    "binfmt_misc",
    "cgroup",
    "cgroup2",
    "configfs",
    "debugfs",
    "devpts",
    "devtmpfs",
    "efivarfs",
    "fusectl",
    "hugetlbfs",
    "mqueue",
    "nfsd",
    "overlay",
    "proc",
    "pstore",
    "rpc_pipefs",
    "securityfs",
    "sysfs",
    "tmpfs",
    "tracefs",
];

#[derive(Clone, Debug, Default)]
pub struct DiskFreeConfig {
    pub mount_point: AclConfig,
    pub fs_type: AclConfig,
}

impl SourceConfig for DiskFreeConfig {
    fn source_name(&self) -> &'static str {
        crate::source::diskfree::SOURCE_NAME
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match yaml::normalize_key(k).as_str() {
            "include_mount_point" => self.mount_point.add_include(v),
            "exclude_mount_point" => self.mount_point.add_exclude(v),
            "include_fs_type" => self.fs_type.add_include(v),
            "exclude_fs_type" => self.fs_type.add_exclude(v),
            _ => Err(anyhow!("invalid key {k}")),
        }
    }

    fn validate(&mut self) -> Vec<String> {
        self.mount_point.normalize();
        self.fs_type.normalize();
        self.fs_type.set_default_exclude(DEFAULT_EXCLUDE_FS_TYPES);
        Vec::new()
    }
}
