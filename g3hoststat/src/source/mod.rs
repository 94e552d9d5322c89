/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

use async_trait::async_trait;

pub mod exec;

mod registry;
pub use registry::{SourceFactory, SourceRegistry};

pub mod blockstat;
pub mod diskfree;
pub mod ipmi;
pub mod meminfo;
pub mod procnetdev;
pub mod procstat;
pub mod smart;
pub mod systemd;

/// One data source, polled once per cycle.
///
/// Failures are handled inside `emit` and never reach the caller.
#[async_trait]
pub trait Emitter: Send {
    async fn emit(&mut self);
}

pub type BoxEmitter = Box<dyn Emitter>;

const BUILTIN_SOURCES: &[(&str, SourceFactory)] = &[
    (meminfo::SOURCE_NAME, meminfo::new_emitter),
    (procstat::SOURCE_NAME, procstat::new_emitter),
    (procnetdev::SOURCE_NAME, procnetdev::new_emitter),
    (blockstat::SOURCE_NAME, blockstat::new_emitter),
    (diskfree::SOURCE_NAME, diskfree::new_emitter),
    (smart::SOURCE_NAME, smart::new_emitter),
    (ipmi::SOURCE_NAME, ipmi::new_emitter),
    (systemd::SOURCE_NAME, systemd::new_emitter),
];

pub fn builtin_registry() -> anyhow::Result<SourceRegistry> {
    let mut registry = SourceRegistry::default();
    for (name, factory) in BUILTIN_SOURCES {
        registry.register(*name, *factory)?;
    }
    Ok(registry)
}

pub fn registered_names() -> Vec<&'static str> {
    BUILTIN_SOURCES.iter().map(|(name, _)| *name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin() {
        let registry = builtin_registry().unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), registered_names());
        assert_eq!(registered_names().len(), 8);
    }
}
