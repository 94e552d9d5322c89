/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use anyhow::anyhow;
use slog::Logger;

use super::BoxEmitter;
use crate::config::source::OptionProvider;
use crate::stat::StatsPool;

/// Build the emitter of a source, or `None` if the source is not usable on
/// this host.
pub type SourceFactory = fn(&Logger, &Arc<StatsPool>, &OptionProvider) -> Option<BoxEmitter>;

/// Registered sources in registration order.
#[derive(Default)]
pub struct SourceRegistry {
    entries: Vec<(&'static str, SourceFactory)>,
}

impl SourceRegistry {
    pub fn register(&mut self, name: &'static str, factory: SourceFactory) -> anyhow::Result<()> {
        if self.entries.iter().any(|(n, _)| *n == name) {
            return Err(anyhow!("source {name} already registered"));
        }
        self.entries.push((name, factory));
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    pub fn get(&self, name: &str) -> Option<SourceFactory> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| *f)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
