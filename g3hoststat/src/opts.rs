/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2026 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint, value_parser};

use crate::config::AgentConfig;

const ARGS_VERSION: &str = "version";
const ARGS_VERBOSE: &str = "verbose";
const ARGS_CONFIG_FILE: &str = "config-file";
const ARGS_TARGET: &str = "target";
const ARGS_HOST: &str = "host";
const ARGS_LIST: &str = "list";
const ARGS_ENABLE: &str = "enable";
const ARGS_DISABLE: &str = "disable";
const ARGS_INTERVAL: &str = "interval";
const ARGS_ALIGN: &str = "align";
const ARGS_OPTION: &str = "option";
const ARGS_DRY_RUN: &str = "dry-run";
const ARGS_TEST_CONFIG: &str = "test-config";

#[derive(Debug, Default)]
pub struct ProcArgs {
    pub verbose_level: u8,
    pub config_file: Option<PathBuf>,
    pub target: Option<String>,
    pub host_name: Option<String>,
    pub enable: Vec<String>,
    pub disable: Vec<String>,
    pub interval: Option<Duration>,
    pub align: Option<Duration>,
    pub options: Vec<String>,
    pub dry_run: bool,
    pub test_config: bool,
}

impl ProcArgs {
    /// Load the config file if set, then apply the command line on top.
    pub fn load_config(&self) -> anyhow::Result<AgentConfig> {
        let mut config = match &self.config_file {
            Some(path) => AgentConfig::load(path)
                .context(format!("failed to load config file {}", path.display()))?,
            None => AgentConfig::default(),
        };
        self.apply(&mut config)?;
        config
            .check(self.dry_run)
            .context("invalid configuration")?;
        Ok(config)
    }

    fn apply(&self, config: &mut AgentConfig) -> anyhow::Result<()> {
        if let Some(target) = &self.target {
            config
                .set_target(target)
                .context(format!("invalid target {target}"))?;
        }
        if let Some(host_name) = &self.host_name {
            config.set_host_name(host_name);
        }
        if let Some(interval) = self.interval {
            config.set_interval(interval);
        }
        if let Some(align) = self.align {
            config.set_align(align);
        }
        config.set_selection(self.enable.clone(), self.disable.clone());
        for s in &self.options {
            config.options_mut().parse_option(s)?;
        }
        Ok(())
    }
}

fn build_cli_args() -> Command {
    Command::new(crate::build::PKG_NAME)
        .disable_version_flag(true)
        .arg(
            Arg::new(ARGS_VERBOSE)
                .help("Show verbose output")
                .num_args(0)
                .action(ArgAction::Count)
                .short('v')
                .long("verbose"),
        )
        .arg(
            Arg::new(ARGS_VERSION)
                .help("Show version")
                .action(ArgAction::SetTrue)
                .short('V')
                .long("version"),
        )
        .arg(
            Arg::new(ARGS_CONFIG_FILE)
                .help("Config file path")
                .num_args(1)
                .value_name("CONFIG FILE")
                .value_hint(ValueHint::FilePath)
                .value_parser(value_parser!(PathBuf))
                .short('c')
                .long("config-file"),
        )
        .arg(
            Arg::new(ARGS_TARGET)
                .help("Statsd target address, a unix socket path is also allowed")
                .num_args(1)
                .value_name("ADDRESS")
                .short('t')
                .long("target"),
        )
        .arg(
            Arg::new(ARGS_HOST)
                .help("Host name to report, default to the kernel node name")
                .num_args(1)
                .value_name("HOST NAME")
                .value_hint(ValueHint::Hostname)
                .long("host"),
        )
        .arg(
            Arg::new(ARGS_LIST)
                .help("List all sources")
                .action(ArgAction::SetTrue)
                .short('l')
                .long("list"),
        )
        .arg(
            Arg::new(ARGS_ENABLE)
                .help("Run only these sources, comma separated")
                .num_args(1)
                .value_name("SOURCES")
                .action(ArgAction::Append)
                .conflicts_with(ARGS_DISABLE)
                .short('e')
                .long("enable"),
        )
        .arg(
            Arg::new(ARGS_DISABLE)
                .help("Run all sources but these, comma separated")
                .num_args(1)
                .value_name("SOURCES")
                .action(ArgAction::Append)
                .short('d')
                .long("disable"),
        )
        .arg(
            Arg::new(ARGS_INTERVAL)
                .help("Collect interval [default: 1s]")
                .num_args(1)
                .value_name("DURATION")
                .short('i')
                .long("interval"),
        )
        .arg(
            Arg::new(ARGS_ALIGN)
                .help("Align the first collection to a multiple of this duration [default: 1s]")
                .num_args(1)
                .value_name("DURATION")
                .long("align"),
        )
        .arg(
            Arg::new(ARGS_OPTION)
                .help("Set source option, in <source>.<key>=<value> form")
                .num_args(1)
                .value_name("OPTION")
                .action(ArgAction::Append)
                .short('o')
                .long("option"),
        )
        .arg(
            Arg::new(ARGS_DRY_RUN)
                .help("Print metrics to stdout instead of sending them")
                .action(ArgAction::SetTrue)
                .long("dry-run"),
        )
        .arg(
            Arg::new(ARGS_TEST_CONFIG)
                .help("Test the format of config and exit")
                .action(ArgAction::SetTrue)
                .long("test-config"),
        )
}

fn get_duration(args: &ArgMatches, id: &str) -> anyhow::Result<Option<Duration>> {
    match args.get_one::<String>(id) {
        Some(s) => {
            let d = crate::config::yaml::parse_duration(s)
                .context(format!("invalid {id} value {s}"))?;
            Ok(Some(d))
        }
        None => Ok(None),
    }
}

fn get_strings(args: &ArgMatches, id: &str) -> Vec<String> {
    args.get_many::<String>(id)
        .map(|v| v.cloned().collect())
        .unwrap_or_default()
}

fn parse_args(args: &ArgMatches) -> anyhow::Result<ProcArgs> {
    let mut proc_args = ProcArgs::default();

    if let Some(verbose_level) = args.get_one::<u8>(ARGS_VERBOSE) {
        proc_args.verbose_level = *verbose_level;
    }
    proc_args.config_file = args.get_one::<PathBuf>(ARGS_CONFIG_FILE).cloned();
    proc_args.target = args.get_one::<String>(ARGS_TARGET).cloned();
    proc_args.host_name = args.get_one::<String>(ARGS_HOST).cloned();
    proc_args.enable = get_strings(args, ARGS_ENABLE);
    proc_args.disable = get_strings(args, ARGS_DISABLE);
    proc_args.interval = get_duration(args, ARGS_INTERVAL)?;
    proc_args.align = get_duration(args, ARGS_ALIGN)?;
    proc_args.options = get_strings(args, ARGS_OPTION);
    proc_args.dry_run = args.get_flag(ARGS_DRY_RUN);
    proc_args.test_config = args.get_flag(ARGS_TEST_CONFIG);
    Ok(proc_args)
}

/// Parse the command line, `None` is returned if nothing more should be done.
pub fn parse_clap() -> anyhow::Result<Option<ProcArgs>> {
    let args_parser = build_cli_args();
    let args = args_parser.get_matches();

    if args.get_flag(ARGS_VERSION) {
        let verbose_level = args.get_one::<u8>(ARGS_VERBOSE).copied().unwrap_or(0);
        crate::build::print_version(verbose_level);
        return Ok(None);
    }
    if args.get_flag(ARGS_LIST) {
        for name in crate::source::registered_names() {
            println!("- {name}");
        }
        return Ok(None);
    }

    parse_args(&args).map(Some)
}
