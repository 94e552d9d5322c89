/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2026 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use g3_statsd_client::{StatsdBackend, StatsdClientConfig};

use super::yaml;

const DEFAULT_STATSD_PORT: u16 = 8125;

/// Parse a statsd target given as `host[:port]`, `ip`, `[ipv6]:port` or an
/// absolute unix socket path.
pub(crate) fn parse_target(s: &str) -> anyhow::Result<StatsdBackend> {
    if s.starts_with('/') {
        return Ok(StatsdBackend::Unix(PathBuf::from(s)));
    }
    if let Ok(addr) = SocketAddr::from_str(s) {
        return Ok(StatsdBackend::Udp(addr, None));
    }
    if let Ok(ip) = IpAddr::from_str(s) {
        return Ok(StatsdBackend::Udp(
            SocketAddr::new(ip, DEFAULT_STATSD_PORT),
            None,
        ));
    }

    let with_port;
    let target = if s.contains(':') {
        s
    } else {
        with_port = format!("{s}:{DEFAULT_STATSD_PORT}");
        with_port.as_str()
    };
    let mut addrs = target
        .to_socket_addrs()
        .map_err(|e| anyhow!("failed to resolve {target}: {e}"))?;
    let addr = addrs
        .next()
        .ok_or_else(|| anyhow!("no address resolved for {target}"))?;
    Ok(StatsdBackend::Udp(addr, None))
}

pub(crate) fn as_statsd_client_config(v: &Yaml) -> anyhow::Result<StatsdClientConfig> {
    let mut config = StatsdClientConfig::default();
    match v {
        Yaml::Hash(map) => {
            yaml::foreach_kv(map, |k, v| match yaml::normalize_key(k).as_str() {
                "target_udp" | "target" => {
                    let s = yaml::as_string(v)?;
                    let backend = parse_target(&s)
                        .context(format!("invalid statsd udp target value for key {k}"))?;
                    config.set_backend(backend);
                    Ok(())
                }
                "target_unix" => {
                    let s = yaml::as_string(v)?;
                    config.set_backend(StatsdBackend::Unix(PathBuf::from(s)));
                    Ok(())
                }
                "prefix" => {
                    let s = yaml::as_string(v)?;
                    config.set_prefix(&s);
                    Ok(())
                }
                "cache_size" => {
                    config.cache_size = yaml::as_usize(v)?;
                    Ok(())
                }
                "max_segment_size" => {
                    config.max_segment_size = Some(yaml::as_usize(v)?);
                    Ok(())
                }
                _ => Err(anyhow!("invalid key {k}")),
            })?;
        }
        _ => {
            let s = yaml::as_string(v)?;
            let backend = parse_target(&s)?;
            config.set_backend(backend);
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use yaml_rust::YamlLoader;

    #[test]
    fn target() {
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert_eq!(
            parse_target("127.0.0.1").unwrap(),
            StatsdBackend::Udp(SocketAddr::new(localhost, 8125), None)
        );
        assert_eq!(
            parse_target("127.0.0.1:9125").unwrap(),
            StatsdBackend::Udp(SocketAddr::new(localhost, 9125), None)
        );
        assert_eq!(
            parse_target("[::1]:9125").unwrap(),
            StatsdBackend::Udp(SocketAddr::from_str("[::1]:9125").unwrap(), None)
        );
        assert_eq!(
            parse_target("/run/statsd.sock").unwrap(),
            StatsdBackend::Unix(PathBuf::from("/run/statsd.sock"))
        );
        let StatsdBackend::Udp(addr, _) = parse_target("localhost").unwrap() else {
            panic!("not udp");
        };
        assert_eq!(addr.port(), 8125);
    }

    #[test]
    fn yaml_map() {
        let doc = YamlLoader::load_from_str(
            "target_udp: 127.0.0.1:8126\nprefix: host.\nmax-segment-size: 512",
        )
        .unwrap()
        .pop()
        .unwrap();
        let config = as_statsd_client_config(&doc).unwrap();
        assert_eq!(
            config.backend(),
            &StatsdBackend::Udp(SocketAddr::from_str("127.0.0.1:8126").unwrap(), None)
        );
        assert_eq!(config.prefix(), "host");
        assert_eq!(config.max_segment_size, Some(512));

        let doc = YamlLoader::load_from_str("target_tcp: 127.0.0.1")
            .unwrap()
            .pop()
            .unwrap();
        assert!(as_statsd_client_config(&doc).is_err());
    }
}
