/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use log::warn;
use yaml_rust::{Yaml, yaml};

use crate::opts::ProcArgs;

mod env;

mod proxy;
pub use proxy::ProxyConfig;

mod runtime;
pub use runtime::RuntimeConfig;

mod server;
pub use server::ServerConfig;

mod user;
pub use user::UserConfig;

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub runtime: RuntimeConfig,
    pub server: ServerConfig,
    pub proxy: ProxyConfig,
    pub user: UserConfig,
}

pub fn load(args: &ProcArgs) -> anyhow::Result<GatewayConfig> {
    load_file(&args.config_file)
}

pub fn load_file(path: &Path) -> anyhow::Result<GatewayConfig> {
    let docs = sg_yaml::load_doc(path)?;
    parse_docs(&docs)
}

pub(crate) async fn reload(path: PathBuf) -> anyhow::Result<GatewayConfig> {
    tokio::task::spawn_blocking(move || load_file(&path))
        .await
        .map_err(|e| anyhow!("failed to join reload task: {e}"))?
}

fn parse_docs(docs: &[Yaml]) -> anyhow::Result<GatewayConfig> {
    let mut builder = GatewayConfigBuilder::default();
    // allow multiple docs, and treat them as the same
    sg_yaml::foreach_doc(docs, |_, map| builder.load_doc(map))?;
    builder.build()
}

#[derive(Default)]
struct GatewayConfigBuilder {
    runtime: RuntimeConfig,
    server: Option<ServerConfig>,
    proxy: Option<ProxyConfig>,
    user: Option<UserConfig>,
}

impl GatewayConfigBuilder {
    fn load_doc(&mut self, map: &yaml::Hash) -> anyhow::Result<()> {
        sg_yaml::foreach_kv(map, |k, v| match sg_yaml::key::normalize(k).as_str() {
            "runtime" => self.runtime.parse(v),
            "server" => {
                let server = ServerConfig::parse(v).context("failed to load server config")?;
                self.server = Some(server);
                Ok(())
            }
            "proxy" => {
                let proxy = ProxyConfig::parse(v).context("failed to load proxy config")?;
                self.proxy = Some(proxy);
                Ok(())
            }
            "user" | "users" => {
                let user = UserConfig::parse(v).context("failed to load user config")?;
                self.user = Some(user);
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k} in main conf")),
        })
    }

    fn build(self) -> anyhow::Result<GatewayConfig> {
        let server = self
            .server
            .ok_or_else(|| anyhow!("no server config found"))?;

        let proxy = self.proxy.unwrap_or_default();
        if proxy.nodes.is_empty() {
            warn!("no upstream proxy node configured, all requests will fail");
        }
        let user = self.user.unwrap_or_default();
        if user.is_empty() {
            warn!("no user configured, all requests will be rejected");
        }

        Ok(GatewayConfig {
            runtime: self.runtime,
            server,
            proxy,
            user,
        })
    }
}

#[cfg(test)]
pub(crate) fn yaml_doc(s: &str) -> Yaml {
    yaml_rust::YamlLoader::load_from_str(s)
        .unwrap()
        .into_iter()
        .next()
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use yaml_rust::YamlLoader;

    #[test]
    fn parse_full() {
        let docs = YamlLoader::load_from_str(
            r#"
runtime:
  thread_number: 2
server:
  listen: "127.0.0.1:8080"
proxy:
  nodes:
    - { host: 10.0.0.1, port: 1080, user: u1, pass: p1 }
user:
  - { user: a, pass: b }
"#,
        )
        .unwrap();
        let config = parse_docs(&docs).unwrap();
        assert_eq!(config.runtime.thread_number(), Some(2));
        assert_eq!(config.server.listen.port(), 8080);
        assert_eq!(config.proxy.nodes.len(), 1);
        assert_eq!(config.user.users().len(), 1);
    }

    #[test]
    fn parse_multiple_docs() {
        let docs = YamlLoader::load_from_str(
            r#"
server:
  listen: 8080
user: [ "a:b" ]
---
user: [ "c:d", "e:f" ]
runtime:
  thread_number: 1
"#,
        )
        .unwrap();
        let config = parse_docs(&docs).unwrap();
        assert_eq!(config.runtime.thread_number(), Some(1));
        assert_eq!(config.user.users().len(), 2);
        assert!(config.proxy.nodes.is_empty());
    }

    #[test]
    fn parse_err() {
        let docs = YamlLoader::load_from_str("user: [ \"a:b\" ]").unwrap();
        assert!(parse_docs(&docs).is_err());

        let docs = YamlLoader::load_from_str("server: { listen: 8080 }\nlog: stderr").unwrap();
        assert!(parse_docs(&docs).is_err());

        let docs = YamlLoader::load_from_str("- server").unwrap();
        assert!(parse_docs(&docs).is_err());
    }

    #[test]
    fn load_sample_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("conf/socksgate.yaml");
        let config = load_file(&path).unwrap();
        assert_eq!(config.server.auth_realm, "socksgate");
        assert!(!config.proxy.nodes.is_empty());
        assert!(!config.user.is_empty());
    }
}
