/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use log::{debug, info, warn};
use slog::Logger;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use super::{CommonTaskContext, HttpProxyTask};
use crate::auth::CredentialStore;
use crate::config::ServerConfig;
use crate::escape::ProxyRegistry;
use crate::serve::ServerTaskNotes;

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

pub struct HttpProxyServer {
    config: Arc<ServerConfig>,
    users: ArcSwap<CredentialStore>,
    proxies: ArcSwap<ProxyRegistry>,
    task_logger: Option<Logger>,
}

impl HttpProxyServer {
    pub fn new(config: ServerConfig, users: CredentialStore, proxies: ProxyRegistry) -> Self {
        let task_logger = if config.task_log {
            Some(crate::log::task::get_logger())
        } else {
            None
        };
        HttpProxyServer {
            config: Arc::new(config),
            users: ArcSwap::from_pointee(users),
            proxies: ArcSwap::from_pointee(proxies),
            task_logger,
        }
    }

    #[inline]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Swap in new users and proxies, running tasks keep the old ones.
    pub fn reload(&self, users: CredentialStore, proxies: ProxyRegistry) {
        info!(
            "reload with {} users and {} proxy nodes",
            users.len(),
            proxies.len()
        );
        self.users.store(Arc::new(users));
        self.proxies.store(Arc::new(proxies));
    }

    fn get_common_task_context(&self) -> CommonTaskContext {
        CommonTaskContext {
            server_config: Arc::clone(&self.config),
            users: self.users.load_full(),
            proxies: self.proxies.load_full(),
            task_logger: self.task_logger.clone(),
        }
    }

    /// Accept connections until `quit` is set to true.
    ///
    /// Tasks already spawned are not waited for.
    pub async fn run(self: Arc<Self>, listener: TcpListener, mut quit: watch::Receiver<bool>) {
        match listener.local_addr() {
            Ok(addr) => info!("started http proxy server at {addr}"),
            Err(e) => warn!("failed to get listen addr: {e}"),
        }

        loop {
            tokio::select! {
                biased;

                r = quit.changed() => {
                    if r.is_err() || *quit.borrow() {
                        break;
                    }
                }
                r = listener.accept() => {
                    match r {
                        Ok((stream, peer_addr)) => self.spawn_tcp_task(stream, peer_addr),
                        Err(e) => {
                            warn!("failed to accept: {e}");
                            tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                        }
                    }
                }
            }
        }
        info!("http proxy server stopped accepting new connections");
    }

    fn spawn_tcp_task(&self, stream: TcpStream, peer_addr: SocketAddr) {
        let local_addr = match stream.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                debug!("failed to get local addr of client {peer_addr}: {e}");
                return;
            }
        };
        let ctx = self.get_common_task_context();
        let task_notes = ServerTaskNotes::new(peer_addr, local_addr);
        tokio::spawn(async move {
            let (clt_r, clt_w) = stream.into_split();
            HttpProxyTask::new(ctx, task_notes)
                .into_running(clt_r, clt_w)
                .await;
        });
    }
}
