/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use anyhow::{Context, anyhow};
use serde_json::Value;
use yaml_rust::Yaml;

use sg_socks::v5::client::Socks5ConnectConfig;
use sg_types::auth::{Password, Username};
use sg_types::net::{Host, ProxyEndpoint};

use super::env;

const DEFAULT_PROXY_PORT: u16 = 1080;

#[derive(Clone, Debug, Default)]
pub struct ProxyConfig {
    pub connect: Socks5ConnectConfig,
    pub nodes: Vec<ProxyEndpoint>,
}

impl ProxyConfig {
    pub(crate) fn parse(v: &Yaml) -> anyhow::Result<Self> {
        let Yaml::Hash(map) = v else {
            return Err(anyhow!("yaml value type for 'proxy' should be 'map'"));
        };
        let mut config = ProxyConfig::default();
        sg_yaml::foreach_kv(map, |k, v| config.set(k, v))?;
        Ok(config)
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match sg_yaml::key::normalize(k).as_str() {
            "connect_timeout" => {
                self.connect.connect_timeout = sg_yaml::humanize::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                Ok(())
            }
            "negotiation_timeout" => {
                self.connect.negotiation_timeout = sg_yaml::humanize::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                Ok(())
            }
            "nodes" | "node" => {
                self.nodes = parse_nodes(v)?;
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        }
    }
}

fn parse_nodes(v: &Yaml) -> anyhow::Result<Vec<ProxyEndpoint>> {
    if let Yaml::Hash(map) = v
        && let Some(name) = env::env_var_name(map)?
    {
        let values = env::load_json_array(&name)?;
        return values
            .iter()
            .enumerate()
            .map(|(i, v)| json_as_proxy_node(v).context(format!("invalid proxy node #{i}")))
            .collect();
    }
    sg_yaml::value::as_list(v, as_proxy_node)
}

#[derive(Default)]
struct ProxyNodeBuilder {
    host: Option<Host>,
    port: Option<u16>,
    username: Option<Username>,
    password: Option<Password>,
}

impl ProxyNodeBuilder {
    fn build(self) -> anyhow::Result<ProxyEndpoint> {
        let host = self.host.ok_or_else(|| anyhow!("no host set"))?;
        let port = self.port.unwrap_or(DEFAULT_PROXY_PORT);
        let username = self.username.ok_or_else(|| anyhow!("no user set"))?;
        let password = self.password.ok_or_else(|| anyhow!("no pass set"))?;
        ProxyEndpoint::new(host, port, username, password).map_err(|e| anyhow!("{e}"))
    }
}

fn as_proxy_node(v: &Yaml) -> anyhow::Result<ProxyEndpoint> {
    match v {
        Yaml::String(_) => sg_yaml::value::as_proxy_endpoint(v),
        Yaml::Hash(map) => {
            let mut builder = ProxyNodeBuilder::default();
            sg_yaml::foreach_kv(map, |k, v| match sg_yaml::key::normalize(k).as_str() {
                "host" => {
                    builder.host = Some(sg_yaml::value::as_host(v)?);
                    Ok(())
                }
                "port" => {
                    builder.port = Some(sg_yaml::value::as_u16(v)?);
                    Ok(())
                }
                "user" | "username" => {
                    builder.username = Some(sg_yaml::value::as_username(v)?);
                    Ok(())
                }
                "pass" | "password" => {
                    builder.password = Some(sg_yaml::value::as_password(v)?);
                    Ok(())
                }
                _ => Err(anyhow!("invalid key {k}")),
            })?;
            builder.build()
        }
        _ => Err(anyhow!(
            "yaml value type for proxy node should be 'map' or 'url string'"
        )),
    }
}

fn json_as_proxy_node(v: &Value) -> anyhow::Result<ProxyEndpoint> {
    if let Value::String(s) = v {
        return ProxyEndpoint::from_str(s).map_err(|e| anyhow!("invalid proxy url {s}: {e}"));
    }

    let mut builder = ProxyNodeBuilder::default();
    env::foreach_json_kv(v, |k, v| match sg_yaml::key::normalize(k).as_str() {
        "host" => {
            let host = env::json_as_string(v)?;
            builder.host = Some(Host::from_str(&host)?);
            Ok(())
        }
        "port" => {
            builder.port = Some(env::json_as_u16(v)?);
            Ok(())
        }
        "user" | "username" => {
            let user = env::json_as_string(v)?;
            builder.username = Some(Username::from_original(&user)?);
            Ok(())
        }
        "pass" | "password" => {
            let pass = env::json_as_string(v)?;
            builder.password = Some(Password::from_original(&pass)?);
            Ok(())
        }
        _ => Err(anyhow!("invalid key {k}")),
    })?;
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::yaml_doc;
    use std::time::Duration;

    #[test]
    fn parse_nodes_mixed() {
        let yaml = yaml_doc(
            r#"
            connect_timeout: 3s
            negotiation-timeout: 5
            nodes:
              - { host: 10.0.0.1, port: 1080, user: u1, pass: p1 }
              - socks5://u2:p2@proxy.example.net:1081
              - { host: proxy.example.org, username: u3, password: 123 }
            "#,
        );
        let config = ProxyConfig::parse(&yaml).unwrap();
        assert_eq!(config.connect.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.connect.negotiation_timeout, Duration::from_secs(5));
        assert_eq!(config.nodes.len(), 3);

        assert_eq!(config.nodes[0].peer().to_string(), "10.0.0.1:1080");
        assert_eq!(config.nodes[0].username().as_original(), "u1");
        assert_eq!(config.nodes[0].password().as_original(), "p1");
        assert_eq!(config.nodes[1].peer().to_string(), "proxy.example.net:1081");
        assert_eq!(config.nodes[1].username().as_original(), "u2");
        assert_eq!(config.nodes[2].peer().port(), DEFAULT_PROXY_PORT);
        assert_eq!(config.nodes[2].password().as_original(), "123");
    }

    #[test]
    fn parse_single_node() {
        let yaml = yaml_doc("nodes: socks5://u:p@127.0.0.1:1080");
        let config = ProxyConfig::parse(&yaml).unwrap();
        assert_eq!(config.nodes.len(), 1);
        assert_eq!(config.connect, Socks5ConnectConfig::default());
    }

    #[test]
    fn parse_nodes_err() {
        let yaml = yaml_doc("nodes: [{ host: 10.0.0.1, user: u }]");
        assert!(ProxyConfig::parse(&yaml).is_err());

        let yaml = yaml_doc("nodes: [{ host: 10.0.0.1, user: u, pass: p, weight: 1 }]");
        assert!(ProxyConfig::parse(&yaml).is_err());

        let yaml = yaml_doc("nodes: [{ host: 10.0.0.1, port: 0, user: u, pass: p }]");
        assert!(ProxyConfig::parse(&yaml).is_err());

        let yaml = yaml_doc("nodes:\n  - http://u:p@127.0.0.1:8080");
        assert!(ProxyConfig::parse(&yaml).is_err());

        let yaml = yaml_doc("timeout: 1s");
        assert!(ProxyConfig::parse(&yaml).is_err());
    }

    #[test]
    fn parse_json_nodes() {
        let values: Vec<Value> = serde_json::from_str(
            r#"[
                {"host": "h1", "port": 1080, "user": "u", "pass": "p"},
                "socks5://u:p@h2:1090"
            ]"#,
        )
        .unwrap();
        let nodes = values
            .iter()
            .map(json_as_proxy_node)
            .collect::<anyhow::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(nodes[0].peer().to_string(), "h1:1080");
        assert_eq!(nodes[1].peer().to_string(), "h2:1090");

        let v: Value = serde_json::from_str(r#"{"host": "h1", "user": "u"}"#).unwrap();
        assert!(json_as_proxy_node(&v).is_err());
        let v: Value = serde_json::from_str(r#"{"host": "h1", "user": "u", "pass": "p", "x": 1}"#)
            .unwrap();
        assert!(json_as_proxy_node(&v).is_err());
    }

    #[test]
    fn parse_env_nodes() {
        const VAR: &str = "SG_TEST_PROXY_NODES";
        // SAFETY: the variable name is only used by this test
        unsafe {
            std::env::set_var(
                VAR,
                r#"[{"host":"10.1.1.1","port":1080,"user":"u","pass":"p"}]"#,
            );
        }
        let yaml = yaml_doc("nodes: { env: SG_TEST_PROXY_NODES }");
        let config = ProxyConfig::parse(&yaml).unwrap();
        assert_eq!(config.nodes.len(), 1);
        assert_eq!(config.nodes[0].peer().to_string(), "10.1.1.1:1080");
    }
}
