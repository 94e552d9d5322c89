/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2026 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use anyhow::Context;
use log::{debug, error, info, warn};

use g3hoststat::config::AgentConfig;
use g3hoststat::opts::ProcArgs;
use g3hoststat::sched::Scheduler;
use g3hoststat::stat::StatsPool;

fn main() -> anyhow::Result<()> {
    let Some(proc_args) =
        g3hoststat::opts::parse_clap().context("failed to parse command line options")?
    else {
        return Ok(());
    };

    // set up process logger early, only proc args is used inside
    let _log_guard = g3hoststat::log::setup(proc_args.verbose_level)
        .context("failed to setup logger")?;

    let config = proc_args
        .load_config()
        .context(format!("failed to load config, opts: {proc_args:?}"))?;
    debug!("loaded config: {config:?}");

    if proc_args.test_config {
        info!("the format of the config file is ok");
        return Ok(());
    }

    let ret = tokio_run(&proc_args, &config);
    if let Err(e) = &ret {
        error!("{e:?}");
    }
    ret
}

fn build_pool(args: &ProcArgs, config: &AgentConfig) -> anyhow::Result<StatsPool> {
    let host_name = config.host_name();
    if args.dry_run {
        return Ok(StatsPool::new_console(&host_name));
    }
    let statsd = config
        .statsd()
        .ok_or_else(|| anyhow::anyhow!("no statsd target set"))?;
    let client = statsd.build().context("failed to build statsd client")?;
    Ok(StatsPool::new_statsd(&host_name, client))
}

fn tokio_run(args: &ProcArgs, config: &AgentConfig) -> anyhow::Result<()> {
    let pool = Arc::new(build_pool(args, config)?);
    let registry = g3hoststat::source::builtin_registry()?;
    let selection = config.selection()?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    rt.block_on(async {
        let mut scheduler = Scheduler::new(
            g3hoststat::log::root(),
            pool,
            config.interval(),
            config.align(),
        );
        if scheduler.load_sources(&registry, &selection, config.options()) == 0 {
            warn!("no source enabled");
        }
        scheduler.run().await;
        Ok(())
    })
}
