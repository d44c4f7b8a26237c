/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;
use std::fmt;
use std::net::{IpAddr, Ipv6Addr};
use std::str::FromStr;

use anyhow::anyhow;

const DOMAIN_MAX_LENGTH: usize = u8::MAX as usize;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Host {
    Ip(IpAddr),
    Domain(String),
}

impl Host {
    fn from_maybe_mapped_ip6(ip6: Ipv6Addr) -> Self {
        if let Some(ip4) = ip6.to_ipv4_mapped() {
            Host::Ip(IpAddr::V4(ip4))
        } else {
            Host::Ip(IpAddr::V6(ip6))
        }
    }

    fn from_domain_str(domain: &str) -> anyhow::Result<Self> {
        let domain = idna::domain_to_ascii(domain).map_err(|e| anyhow!("invalid domain: {e}"))?;
        if domain.is_empty() {
            return Err(anyhow!("empty domain"));
        }
        if domain.len() > DOMAIN_MAX_LENGTH {
            return Err(anyhow!("too long domain"));
        }
        Ok(Host::Domain(domain))
    }

    /// The host string as sent in a socks5 domain address field.
    ///
    /// Ipv6 addresses are not enclosed in brackets.
    pub fn to_addr_string(&self) -> Cow<'_, str> {
        match self {
            Host::Ip(ip) => Cow::Owned(ip.to_string()),
            Host::Domain(domain) => Cow::Borrowed(domain.as_str()),
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Ip(IpAddr::V6(ip6)) => write!(f, "[{ip6}]"),
            Host::Ip(ip) => write!(f, "{ip}"),
            Host::Domain(domain) => write!(f, "{domain}"),
        }
    }
}

impl FromStr for Host {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(anyhow!("empty string"));
        }
        match s.as_bytes()[0] {
            b'[' => {
                let pos_last = s.len() - 1;
                if s.as_bytes()[pos_last] == b']' {
                    if let Ok(ip6) = Ipv6Addr::from_str(&s[1..pos_last]) {
                        return Ok(Host::from_maybe_mapped_ip6(ip6));
                    }
                }
                return Err(anyhow!("invalid ipv6 ip in squared brackets"));
            }
            b':' => {
                return if let Ok(ip6) = Ipv6Addr::from_str(s) {
                    Ok(Host::from_maybe_mapped_ip6(ip6))
                } else {
                    Err(anyhow!("invalid ipv6 ip"))
                };
            }
            b'0'..=b'9' => {
                if let Ok(ip) = IpAddr::from_str(s) {
                    return match ip {
                        IpAddr::V4(_) => Ok(Host::Ip(ip)),
                        IpAddr::V6(ip6) => Ok(Host::from_maybe_mapped_ip6(ip6)),
                    };
                }
            }
            b'a'..=b'f' | b'A'..=b'F' => {
                if let Ok(ip6) = Ipv6Addr::from_str(s) {
                    return Ok(Host::Ip(IpAddr::V6(ip6)));
                }
            }
            _ => {}
        }

        Host::from_domain_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn parse_ip() {
        let h = Host::from_str("127.0.0.1").unwrap();
        assert_eq!(h, Host::Ip(IpAddr::V4(Ipv4Addr::LOCALHOST)));

        let h = Host::from_str("[::1]").unwrap();
        assert_eq!(h, Host::Ip(IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert_eq!(h.to_string(), "[::1]");
        assert_eq!(h.to_addr_string(), "::1");

        let h = Host::from_str("::ffff:10.0.0.1").unwrap();
        assert_eq!(h, Host::Ip(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))));
    }

    #[test]
    fn parse_domain() {
        let h = Host::from_str("Example.COM").unwrap();
        assert_eq!(h, Host::Domain("example.com".to_string()));
        assert_eq!(h.to_addr_string(), "example.com");
    }

    #[test]
    fn parse_invalid() {
        assert!(Host::from_str("").is_err());
        assert!(Host::from_str("[::1").is_err());
        let long = format!("{}.com", "a".repeat(300));
        assert!(Host::from_str(&long).is_err());
    }
}
