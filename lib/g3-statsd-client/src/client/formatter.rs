/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2026 ByteDance and/or its affiliates.
 */

use super::StatsdClient;
use crate::{MetricValue, StatsdTagGroup};

enum MetricType {
    Count,
    Gauge,
}

impl MetricType {
    fn as_str(&self) -> &'static str {
        match self {
            MetricType::Count => "c",
            MetricType::Gauge => "g",
        }
    }
}

pub struct MetricFormatter<'a> {
    client: &'a StatsdClient,
    metric_type: MetricType,
    name: &'a str,
    value: MetricValue,
    local_tags: StatsdTagGroup,
}

impl StatsdClient {
    pub fn count<'a, T: Into<MetricValue>>(&'a self, name: &'a str, value: T) -> MetricFormatter<'a> {
        self.metric_with_type(MetricType::Count, name, value.into())
    }

    pub fn gauge<'a, T: Into<MetricValue>>(&'a self, name: &'a str, value: T) -> MetricFormatter<'a> {
        self.metric_with_type(MetricType::Gauge, name, value.into())
    }

    fn metric_with_type<'a>(
        &'a self,
        metric_type: MetricType,
        name: &'a str,
        value: MetricValue,
    ) -> MetricFormatter<'a> {
        MetricFormatter {
            client: self,
            metric_type,
            name,
            value,
            local_tags: StatsdTagGroup::default(),
        }
    }
}

impl MetricFormatter<'_> {
    pub fn with_tag<T: AsRef<str>>(mut self, key: &str, value: T) -> Self {
        self.local_tags.add_tag(key, value);
        self
    }

    pub fn send(self) {
        let shared = &self.client.shared;
        let bound_tags = &self.client.tags;
        let value = self.value.format_bytes();

        let r = shared.lock().emit(|buf| {
            if !shared.prefix.is_empty() {
                buf.extend_from_slice(shared.prefix.as_bytes());
                buf.push(b'.');
            }
            buf.extend_from_slice(self.name.as_bytes());
            buf.push(b':');
            buf.extend_from_slice(value.as_slice());
            buf.push(b'|');
            buf.extend_from_slice(self.metric_type.as_str().as_bytes());

            if bound_tags.is_empty() && self.local_tags.is_empty() {
                return;
            }
            buf.extend_from_slice(b"|#");
            buf.extend_from_slice(bound_tags.as_bytes());
            if !self.local_tags.is_empty() {
                if !bound_tags.is_empty() {
                    buf.push(b',');
                }
                buf.extend_from_slice(self.local_tags.as_bytes());
            }
        });
        if let Err(e) = r {
            shared.handle_emit_error(e);
        }
    }
}
