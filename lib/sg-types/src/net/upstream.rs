/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;

use super::Host;

/// A target address in `host:port` form.
///
/// The host is kept as given and is never resolved locally.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct UpstreamAddr {
    host: Host,
    port: u16,
}

impl UpstreamAddr {
    pub fn new(host: Host, port: u16) -> Self {
        UpstreamAddr { host, port }
    }

    pub fn from_host_str_and_port(host: &str, port: u16) -> anyhow::Result<Self> {
        let host = Host::from_str(host)?;
        Ok(UpstreamAddr { host, port })
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[inline]
    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    /// set the port only if no one has been parsed
    pub fn set_default_port(&mut self, port: u16) {
        if self.port == 0 {
            self.port = port;
        }
    }
}

impl fmt::Display for UpstreamAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for UpstreamAddr {
    type Err = anyhow::Error;

    /// Parse `host[:port]`, the port will be 0 if absent.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(anyhow!("empty string"));
        }

        let (host, port) = if s.starts_with('[') {
            let Some(p) = memchr::memchr(b']', s.as_bytes()) else {
                return Err(anyhow!("no ending square bracket found"));
            };
            let left = &s[p + 1..];
            if left.is_empty() {
                (&s[..=p], None)
            } else if let Some(port) = left.strip_prefix(':') {
                (&s[..=p], Some(port))
            } else {
                return Err(anyhow!("invalid chars after ipv6 address"));
            }
        } else {
            match memchr::memrchr(b':', s.as_bytes()) {
                Some(p) => {
                    if memchr::memchr(b':', &s.as_bytes()[..p]).is_some() {
                        // bare ipv6 address without port
                        (s, None)
                    } else {
                        (&s[..p], Some(&s[p + 1..]))
                    }
                }
                None => (s, None),
            }
        };

        let port = match port {
            Some(p) => u16::from_str(p).map_err(|e| anyhow!("invalid port {p}: {e}"))?,
            None => 0,
        };
        let host = Host::from_str(host)?;
        Ok(UpstreamAddr { host, port })
    }
}
