/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2026 ByteDance and/or its affiliates.
 */

use std::io;

use slog::{Drain, slog_o};
use slog_scope::GlobalLoggerGuard;

mod stdio;
pub use stdio::StdioDrain;

fn slog_level(verbose_level: u8) -> slog::Level {
    match verbose_level {
        0 => slog::Level::Warning,
        1 => slog::Level::Info,
        2 => slog::Level::Debug,
        _ => slog::Level::Trace,
    }
}

/// Set up the process logger, which writes to stderr.
///
/// Messages of the `log` crate are forwarded to the same root logger.
pub fn setup(verbose_level: u8) -> Result<GlobalLoggerGuard, log::SetLoggerError> {
    let drain = StdioDrain::new(io::stderr(), true).filter_level(slog_level(verbose_level));
    let logger = slog::Logger::root(drain.fuse(), slog_o!());

    let scope_guard = slog_scope::set_global_logger(logger);

    let log_level = match verbose_level {
        0 => log::Level::Warn,
        1 => log::Level::Info,
        2 => log::Level::Debug,
        _ => log::Level::Trace,
    };

    slog_stdlog::init_with_level(log_level)?;
    Ok(scope_guard)
}

/// The root logger set by [`setup`].
pub fn root() -> slog::Logger {
    slog_scope::logger()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level() {
        assert_eq!(slog_level(0), slog::Level::Warning);
        assert_eq!(slog_level(2), slog::Level::Debug);
        assert_eq!(slog_level(9), slog::Level::Trace);
    }
}
