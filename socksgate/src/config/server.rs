/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, yaml};

use sg_io_ext::{StreamCopyConfig, StreamRelayConfig};

const DEFAULT_AUTH_REALM: &str = "socksgate";
const DEFAULT_MAX_HEADER_SIZE: usize = 64 * 1024;
const MINIMAL_MAX_HEADER_SIZE: usize = 1024;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub auth_realm: String,
    /// limit of the request head, also the max line length in chunked bodies
    pub max_header_size: usize,
    pub relay_idle_timeout: Option<Duration>,
    pub copy: StreamCopyConfig,
    pub task_log: bool,
}

impl ServerConfig {
    pub fn new(listen: SocketAddr) -> Self {
        ServerConfig {
            listen,
            auth_realm: DEFAULT_AUTH_REALM.to_string(),
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            relay_idle_timeout: None,
            copy: StreamCopyConfig::default(),
            task_log: true,
        }
    }

    pub(crate) fn parse(v: &Yaml) -> anyhow::Result<Self> {
        let Yaml::Hash(map) = v else {
            return Err(anyhow!("yaml value type for 'server' should be 'map'"));
        };
        let listen = get_listen(map)?;
        let mut config = ServerConfig::new(listen);
        sg_yaml::foreach_kv(map, |k, v| config.set(k, v))?;
        Ok(config)
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match sg_yaml::key::normalize(k).as_str() {
            "listen" => Ok(()),
            "auth_realm" => {
                let realm = sg_yaml::value::as_string(v)?;
                check_realm(&realm)?;
                self.auth_realm = realm;
                Ok(())
            }
            "max_header_size" => {
                let size = sg_yaml::humanize::as_usize(v)
                    .context(format!("invalid humanize usize value for key {k}"))?;
                if size < MINIMAL_MAX_HEADER_SIZE {
                    return Err(anyhow!(
                        "max header size should be at least {MINIMAL_MAX_HEADER_SIZE}"
                    ));
                }
                self.max_header_size = size;
                Ok(())
            }
            "relay_idle_timeout" => {
                let timeout = sg_yaml::humanize::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                self.relay_idle_timeout = if timeout.is_zero() {
                    None
                } else {
                    Some(timeout)
                };
                Ok(())
            }
            "copy_buffer_size" => {
                let size = sg_yaml::humanize::as_usize(v)
                    .context(format!("invalid humanize usize value for key {k}"))?;
                self.copy.set_buffer_size(size);
                Ok(())
            }
            "task_log" => {
                self.task_log = sg_yaml::value::as_bool(v)?;
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        }
    }

    pub fn relay_config(&self) -> StreamRelayConfig {
        StreamRelayConfig {
            copy: self.copy,
            idle_timeout: self.relay_idle_timeout,
        }
    }
}

fn get_listen(map: &yaml::Hash) -> anyhow::Result<SocketAddr> {
    for (k, v) in map.iter() {
        if let Yaml::String(key) = k
            && sg_yaml::key::normalize(key) == "listen"
        {
            return sg_yaml::value::as_sockaddr(v).context("invalid value for key listen");
        }
    }
    Err(anyhow!("no listen address set"))
}

fn check_realm(realm: &str) -> anyhow::Result<()> {
    let valid = |b: u8| (b.is_ascii_graphic() || b == b' ') && b != b'"' && b != b'\\';
    if !realm.bytes().all(valid) {
        return Err(anyhow!("invalid char in auth realm {realm}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::yaml_doc;

    #[test]
    fn parse_ok() {
        let yaml = yaml_doc(
            r#"
            listen: "127.0.0.1:8080"
            auth-realm: "my gate"
            max_header_size: 8192
            relay_idle_timeout: 5m
            copy_buffer_size: 32768
            task_log: false
            "#
        );
        let config = ServerConfig::parse(&yaml).unwrap();
        assert_eq!(config.listen, SocketAddr::from(([127, 0, 0, 1], 8080)));
        assert_eq!(config.auth_realm, "my gate");
        assert_eq!(config.max_header_size, 8192);
        assert_eq!(config.relay_idle_timeout, Some(Duration::from_secs(300)));
        assert_eq!(config.copy.buffer_size(), 32768);
        assert!(!config.task_log);

        let relay = config.relay_config();
        assert_eq!(relay.idle_timeout, Some(Duration::from_secs(300)));
    }

    #[test]
    fn parse_default() {
        let yaml = yaml_doc("listen: 1080");
        let config = ServerConfig::parse(&yaml).unwrap();
        assert_eq!(config.listen.port(), 1080);
        assert_eq!(config.auth_realm, DEFAULT_AUTH_REALM);
        assert_eq!(config.max_header_size, DEFAULT_MAX_HEADER_SIZE);
        assert!(config.relay_idle_timeout.is_none());
        assert!(config.task_log);
    }

    #[test]
    fn parse_err() {
        let yaml = yaml_doc("auth_realm: abc");
        assert!(ServerConfig::parse(&yaml).is_err());

        let yaml = yaml_doc(
            r#"
            listen: 1080
            unknown: 1
            "#
        );
        assert!(ServerConfig::parse(&yaml).is_err());

        let yaml = yaml_doc(
            r#"
            listen: 1080
            auth_realm: 'a"b'
            "#
        );
        assert!(ServerConfig::parse(&yaml).is_err());

        let yaml = yaml_doc(
            r#"
            listen: 1080
            max_header_size: 16
            "#
        );
        assert!(ServerConfig::parse(&yaml).is_err());

        assert!(ServerConfig::parse(&Yaml::Integer(1)).is_err());
    }
}
