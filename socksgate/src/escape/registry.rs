/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use rand::seq::IndexedRandom;

use sg_socks::v5::client::Socks5ConnectConfig;
use sg_types::net::ProxyEndpoint;

use crate::config::ProxyConfig;

/// The upstream socks5 proxies, each request goes through a random one.
#[derive(Debug, Default)]
pub struct ProxyRegistry {
    nodes: Vec<ProxyEndpoint>,
    connect_config: Socks5ConnectConfig,
}

impl ProxyRegistry {
    pub fn new(config: &ProxyConfig) -> Self {
        ProxyRegistry {
            nodes: config.nodes.clone(),
            connect_config: config.connect,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn connect_config(&self) -> &Socks5ConnectConfig {
        &self.connect_config
    }

    /// Pick one node uniformly, there is no health check or weight.
    pub fn pick(&self) -> Option<&ProxyEndpoint> {
        let mut rng = rand::rng();
        self.nodes.choose(&mut rng)
    }
}
