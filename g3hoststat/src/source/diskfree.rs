/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use slog::{Logger, slog_debug, slog_warn};

use super::{BoxEmitter, Emitter};
use crate::config::source::diskfree::DiskFreeConfig;
use crate::config::source::{AnySourceConfig, OptionProvider};
use crate::glob::Acl;
use crate::stat::StatsPool;

pub const SOURCE_NAME: &str = "diskfree";

const MOUNT_INFO_PATH: &str = "/proc/self/mountinfo";

#[derive(Debug, PartialEq, Eq)]
struct MountEntry<'a> {
    root: &'a str,
    mount_point: Cow<'a, str>,
    fs_type: &'a str,
}

impl<'a> MountEntry<'a> {
    /// Parse one line of `mountinfo`, see proc(5) for the layout.
    fn parse(line: &'a str) -> Option<Self> {
        let mut iter = line.split(' ');
        let root = iter.nth(3)?;
        let mount_point = iter.next()?;
        // skip mount options and the optional fields up to the separator
        iter.by_ref().find(|s| *s == "-")?;
        let fs_type = iter.next()?;
        Some(MountEntry {
            root,
            mount_point: unescape(mount_point),
            fs_type,
        })
    }
}

/// Decode the `\ooo` octal escapes the kernel uses for space, tab, newline
/// and backslash.
fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('\\') {
        return Cow::Borrowed(s);
    }

    let b = s.as_bytes();
    let mut out = Vec::with_capacity(b.len());
    let mut i = 0;
    while i < b.len() {
        if b[i] == b'\\'
            && let Some(oct) = b.get(i + 1..i + 4)
            && oct.iter().all(|c| (b'0'..=b'7').contains(c))
        {
            let v = oct.iter().fold(0u32, |acc, c| acc * 8 + u32::from(c - b'0'));
            if let Ok(c) = u8::try_from(v) {
                out.push(c);
                i += 4;
                continue;
            }
        }
        out.push(b[i]);
        i += 1;
    }
    Cow::Owned(String::from_utf8_lossy(&out).into_owned())
}

#[derive(Debug, PartialEq, Eq)]
struct DiskUsage {
    available: u64,
    capacity: u64,
}

impl DiskUsage {
    fn stat(path: &str) -> rustix::io::Result<Self> {
        let st = rustix::fs::statvfs(path)?;
        Ok(DiskUsage {
            available: st.f_bavail.saturating_mul(st.f_frsize),
            capacity: st.f_blocks.saturating_mul(st.f_frsize),
        })
    }

    fn used(&self) -> u64 {
        self.capacity.saturating_sub(self.available)
    }
}

struct DiskFreeEmitter {
    logger: Logger,
    pool: Arc<StatsPool>,
    mount_point: Acl,
    fs_type: Acl,
}

pub(super) fn new_emitter(
    logger: &Logger,
    pool: &Arc<StatsPool>,
    options: &OptionProvider,
) -> Option<BoxEmitter> {
    let (mount_point, fs_type) = match options.get(SOURCE_NAME) {
        Some(AnySourceConfig::DiskFree(c)) => (c.mount_point.build(), c.fs_type.build()),
        _ => {
            let c = DiskFreeConfig::default();
            (c.mount_point.build(), c.fs_type.build())
        }
    };
    Some(Box::new(DiskFreeEmitter {
        logger: logger.clone(),
        pool: Arc::clone(pool),
        mount_point,
        fs_type,
    }))
}

impl DiskFreeEmitter {
    /// Select the mounts to report, in `mountinfo` order.
    fn select<'a>(&self, content: &'a str) -> Vec<MountEntry<'a>> {
        let mut mounts = Vec::new();
        for line in content.lines() {
            let Some(entry) = MountEntry::parse(line) else {
                slog_warn!(self.logger, "invalid line in {MOUNT_INFO_PATH}: {line}");
                continue;
            };
            // bind mounts of sub directories
            if entry.root != "/" {
                continue;
            }
            if !self.fs_type.allows(entry.fs_type) {
                continue;
            }
            if !self.mount_point.allows(&entry.mount_point) {
                continue;
            }
            mounts.push(entry);
        }
        mounts
    }

    fn emit_usage(&self, entry: &MountEntry<'_>, usage: &DiskUsage) {
        let client = self.pool.host(&[
            ("fstype", entry.fs_type),
            ("mount", entry.mount_point.as_ref()),
        ]);
        client.gauge("diskfree.available", usage.available);
        client.gauge("diskfree.capacity", usage.capacity);
        client.gauge("diskfree.used", usage.used());
    }
}

#[async_trait]
impl Emitter for DiskFreeEmitter {
    async fn emit(&mut self) {
        let content = match std::fs::read_to_string(MOUNT_INFO_PATH) {
            Ok(c) => c,
            Err(e) => {
                slog_warn!(self.logger, "failed to read {MOUNT_INFO_PATH}: {e}");
                return;
            }
        };
        for entry in self.select(&content) {
            match DiskUsage::stat(&entry.mount_point) {
                Ok(usage) => self.emit_usage(&entry, &usage),
                Err(e) => slog_debug!(self.logger, "statvfs {} failed: {e}", entry.mount_point),
            }
        }
    }
}
