/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2026 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
#[cfg(unix)]
use std::os::unix::net::UnixDatagram;
#[cfg(unix)]
use std::path::PathBuf;

use super::{StatsdClient, StatsdMetricsSink};

const UDP_DEFAULT_PORT: u16 = 8125;
const DEFAULT_CACHE_SIZE: usize = 256 * 1024;
const UDP_DEFAULT_MAX_SEGMENT_SIZE: usize = 1432;
#[cfg(unix)]
const UNIX_DEFAULT_MAX_SEGMENT_SIZE: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsdBackend {
    Udp(SocketAddr, Option<IpAddr>),
    #[cfg(unix)]
    Unix(PathBuf),
}

impl Default for StatsdBackend {
    fn default() -> Self {
        StatsdBackend::Udp(
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), UDP_DEFAULT_PORT),
            None,
        )
    }
}

impl StatsdBackend {
    fn default_max_segment_size(&self) -> usize {
        match self {
            StatsdBackend::Udp(_, _) => UDP_DEFAULT_MAX_SEGMENT_SIZE,
            #[cfg(unix)]
            StatsdBackend::Unix(_) => UNIX_DEFAULT_MAX_SEGMENT_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsdClientConfig {
    backend: StatsdBackend,
    prefix: String,
    pub cache_size: usize,
    pub max_segment_size: Option<usize>,
}

impl Default for StatsdClientConfig {
    fn default() -> Self {
        StatsdClientConfig::with_prefix("")
    }
}

impl StatsdClientConfig {
    pub fn with_prefix(prefix: &str) -> Self {
        let mut config = StatsdClientConfig {
            backend: StatsdBackend::default(),
            prefix: String::new(),
            cache_size: DEFAULT_CACHE_SIZE,
            max_segment_size: None,
        };
        config.set_prefix(prefix);
        config
    }

    pub fn set_backend(&mut self, target: StatsdBackend) {
        self.backend = target;
    }

    #[inline]
    pub fn backend(&self) -> &StatsdBackend {
        &self.backend
    }

    pub fn set_prefix(&mut self, prefix: &str) {
        self.prefix = prefix.trim_matches('.').to_string();
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn max_segment_size(&self) -> usize {
        self.max_segment_size
            .unwrap_or_else(|| self.backend.default_max_segment_size())
    }

    pub fn build(&self) -> io::Result<StatsdClient> {
        let max_segment_size = self.max_segment_size();
        let sink = match &self.backend {
            StatsdBackend::Udp(addr, bind) => {
                let bind_ip = bind.unwrap_or(match addr {
                    SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
                });
                let socket = UdpSocket::bind(SocketAddr::new(bind_ip, 0))?;
                StatsdMetricsSink::udp_with_capacity(
                    *addr,
                    socket,
                    self.cache_size,
                    max_segment_size,
                )
            }
            #[cfg(unix)]
            StatsdBackend::Unix(path) => {
                let socket = UnixDatagram::unbound()?;
                StatsdMetricsSink::unix_with_capacity(
                    path.clone(),
                    socket,
                    self.cache_size,
                    max_segment_size,
                )
            }
        };

        Ok(StatsdClient::new(&self.prefix, sink))
    }
}
