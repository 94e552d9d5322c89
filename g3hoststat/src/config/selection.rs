/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::collections::BTreeSet;

use anyhow::anyhow;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionMode {
    Enable,
    Disable,
}

/// Which registered sources should run.
///
/// At most one of the enable and disable lists may be set.
#[derive(Clone, Debug, Default)]
pub struct SourceSelection {
    mode: Option<SelectionMode>,
    names: BTreeSet<String>,
}

pub struct SelectionResult<'a> {
    pub selected: Vec<&'a str>,
    /// selected names that matched no registered source
    pub unknown: Vec<String>,
}

impl SourceSelection {
    pub fn new<S: AsRef<str>>(enable: &[S], disable: &[S]) -> anyhow::Result<Self> {
        let enable = super::flatten(enable);
        let disable = super::flatten(disable);
        match (enable.is_empty(), disable.is_empty()) {
            (true, true) => Ok(SourceSelection::default()),
            (false, true) => Ok(SourceSelection {
                mode: Some(SelectionMode::Enable),
                names: enable.into_iter().collect(),
            }),
            (true, false) => Ok(SourceSelection {
                mode: Some(SelectionMode::Disable),
                names: disable.into_iter().collect(),
            }),
            (false, false) => Err(anyhow!("enable and disable are mutually exclusive")),
        }
    }

    #[inline]
    pub fn mode(&self) -> Option<SelectionMode> {
        self.mode
    }

    /// Filter the registered names, keeping their order.
    pub fn resolve<'a, I>(&self, registered: I) -> SelectionResult<'a>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut left = self.names.clone();
        let mut selected = Vec::new();
        for name in registered {
            let listed = left.remove(name);
            let run = match self.mode {
                None => true,
                Some(SelectionMode::Enable) => listed,
                Some(SelectionMode::Disable) => !listed,
            };
            if run {
                selected.push(name);
            }
        }
        SelectionResult {
            selected,
            unknown: left.into_iter().collect(),
        }
    }
}
