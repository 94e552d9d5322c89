/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use g3_statsd_client::{MetricValue, StatsdClient};

use super::{MetricClient, MetricType};

pub(super) struct StatsdMetricClient {
    client: StatsdClient,
}

impl StatsdMetricClient {
    pub(super) fn new(base: &StatsdClient, tags: &[(&str, &str)]) -> Self {
        let client = tags
            .iter()
            .fold(base.clone(), |client, (k, v)| client.with_tag(k, v));
        StatsdMetricClient { client }
    }
}

impl MetricClient for StatsdMetricClient {
    fn emit(&self, metric_type: MetricType, name: &str, value: MetricValue) {
        match metric_type {
            MetricType::Gauge => self.client.gauge(name, value).send(),
            MetricType::Count => self.client.count(name, value).send(),
        }
    }
}
