/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use slog::{Logger, slog_debug, slog_error, slog_info, slog_o, slog_warn};
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::SourceSelection;
use crate::config::source::OptionProvider;
use crate::source::{BoxEmitter, SourceRegistry};
use crate::stat::StatsPool;

mod align;
pub use align::{delay_until_aligned, next_aligned};

/// Drives all live emitters, one cycle per aligned tick.
pub struct Scheduler {
    logger: Logger,
    pool: Arc<StatsPool>,
    interval: Duration,
    align: Duration,
    emitters: Vec<(&'static str, BoxEmitter)>,
}

impl Scheduler {
    pub fn new(logger: Logger, pool: Arc<StatsPool>, interval: Duration, align: Duration) -> Self {
        Scheduler {
            logger,
            pool,
            interval,
            align,
            emitters: Vec::new(),
        }
    }

    /// Build the emitters of all selected sources, in registration order.
    ///
    /// Sources without an emitter on this host are skipped. Returns the
    /// number of live emitters.
    pub fn load_sources(
        &mut self,
        registry: &SourceRegistry,
        selection: &SourceSelection,
        options: &OptionProvider,
    ) -> usize {
        let result = selection.resolve(registry.names());
        for name in &result.unknown {
            slog_warn!(self.logger, "unrecognized source {name}");
        }

        for name in result.selected {
            let Some(factory) = registry.get(name) else {
                continue;
            };
            let logger = self.logger.new(slog_o!("source" => name));
            match factory(&logger, &self.pool, options) {
                Some(emitter) => {
                    slog_info!(logger, "enabled");
                    self.emitters.push((name, emitter));
                }
                None => slog_error!(logger, "emitter creation failed"),
            }
        }
        self.emitters.len()
    }

    pub fn source_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.emitters.iter().map(|(name, _)| *name)
    }

    /// Run every emitter once, then flush the buffered metrics.
    pub async fn run_cycle(&mut self) {
        for (_, emitter) in self.emitters.iter_mut() {
            emitter.emit().await;
        }
        self.pool.flush();
    }

    /// Tick at the next aligned wall clock instant and then every interval.
    ///
    /// Ticks missed by a slow cycle are skipped. Never returns.
    pub async fn run(mut self) {
        let delay = delay_until_aligned(SystemTime::now(), self.align);
        slog_debug!(self.logger, "first cycle in {delay:?}");
        let mut interval = tokio::time::interval_at(Instant::now() + delay, self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            self.run_cycle().await;
        }
    }
}
