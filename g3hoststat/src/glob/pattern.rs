/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
enum MatchRule {
    Exact(String),
    Wildcard {
        prefix: String,
        suffix: String,
        segments: Vec<String>,
    },
}

impl MatchRule {
    fn check(&self, value: &str) -> bool {
        match self {
            MatchRule::Exact(s) => value == s,
            MatchRule::Wildcard {
                prefix,
                suffix,
                segments,
            } => {
                if value.len() < prefix.len() + suffix.len() {
                    return false;
                }
                let Some(left) = value.strip_prefix(prefix.as_str()) else {
                    return false;
                };
                let Some(mut middle) = left.strip_suffix(suffix.as_str()) else {
                    return false;
                };
                for seg in segments {
                    match middle.find(seg.as_str()) {
                        Some(p) => middle = &middle[p + seg.len()..],
                        None => return false,
                    }
                }
                true
            }
        }
    }
}

/// A compiled glob pattern.
///
/// `*` matches any run of characters, there are no other wildcards. A leading
/// `!` inverts the result. Interior segments are consumed left to right
/// without overlapping each other or the literal prefix and suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    rule: MatchRule,
    invert: bool,
}

impl Pattern {
    pub fn new(pattern: &str) -> Self {
        let mut invert = false;
        let mut body = pattern;
        while let Some(s) = body.strip_prefix('!') {
            invert = !invert;
            body = s;
        }

        let mut parts = body.split('*');
        let first = parts.next().unwrap_or_default();
        let Some(second) = parts.next() else {
            return Pattern {
                raw: pattern.to_string(),
                rule: MatchRule::Exact(body.to_string()),
                invert,
            };
        };

        // at least one '*' in the body, so there is always a last part
        let mut interior: Vec<&str> = Vec::with_capacity(4);
        interior.push(second);
        interior.extend(parts);
        let suffix = interior.pop().unwrap_or_default();
        let segments = interior
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Pattern {
            raw: pattern.to_string(),
            rule: MatchRule::Wildcard {
                prefix: first.to_string(),
                suffix: suffix.to_string(),
                segments,
            },
            invert,
        }
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.rule.check(value) != self.invert
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for Pattern {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Pattern::new(s))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
