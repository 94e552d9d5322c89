/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use super::Pattern;

/// Include and exclude glob lists combined into one membership test.
///
/// Excludes always win. With no include patterns at all the decision falls
/// back to `default_allow`.
#[derive(Debug, Clone)]
pub struct Acl {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    default_allow: bool,
}

impl Default for Acl {
    fn default() -> Self {
        Acl {
            include: Vec::new(),
            exclude: Vec::new(),
            default_allow: true,
        }
    }
}

impl Acl {
    pub fn new<I, E, S1, S2>(include: I, exclude: E, default_allow: bool) -> Self
    where
        I: IntoIterator<Item = S1>,
        E: IntoIterator<Item = S2>,
        S1: AsRef<str>,
        S2: AsRef<str>,
    {
        Acl {
            include: include.into_iter().map(|s| Pattern::new(s.as_ref())).collect(),
            exclude: exclude.into_iter().map(|s| Pattern::new(s.as_ref())).collect(),
            default_allow,
        }
    }

    pub fn allows(&self, value: &str) -> bool {
        if self.exclude.iter().any(|p| p.is_match(value)) {
            return false;
        }
        if self.include.is_empty() {
            return self.default_allow;
        }
        self.include.iter().any(|p| p.is_match(value))
    }
}
