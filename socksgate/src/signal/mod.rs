/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};
use tokio::sync::{Mutex, watch};

use crate::auth::CredentialStore;
use crate::escape::ProxyRegistry;
use crate::serve::HttpProxyServer;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use unix::{register_quit, register_reload};

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use windows::register_quit;

pub trait AsyncSignalAction: Clone {
    fn run(&self) -> impl Future<Output = ()> + Send;
}

static RELOAD_MUTEX: Mutex<()> = Mutex::const_new(());

/// Only users and proxy nodes are reloaded, changes to other sections need a restart.
async fn do_reload(server: &HttpProxyServer, config_file: PathBuf) {
    let _guard = RELOAD_MUTEX.lock().await;
    info!("reloading config");

    let config = match crate::config::reload(config_file).await {
        Ok(config) => config,
        Err(e) => {
            warn!("error reloading config: {e:?}");
            warn!("reload aborted");
            return;
        }
    };
    server.reload(
        CredentialStore::new(&config.user),
        ProxyRegistry::new(&config.proxy),
    );

    info!("reload finished");
}

#[derive(Clone)]
struct QuitAction {
    quit_sender: Arc<watch::Sender<bool>>,
}

impl AsyncSignalAction for QuitAction {
    async fn run(&self) {
        self.quit_sender.send_replace(true);
    }
}

#[allow(unused)]
#[derive(Clone)]
struct ReloadAction {
    server: Arc<HttpProxyServer>,
    config_file: PathBuf,
}

impl AsyncSignalAction for ReloadAction {
    async fn run(&self) {
        do_reload(&self.server, self.config_file.clone()).await
    }
}

/// Must be called inside the tokio runtime.
pub fn register(
    server: &Arc<HttpProxyServer>,
    config_file: PathBuf,
    quit_sender: watch::Sender<bool>,
) -> anyhow::Result<()> {
    #[cfg(unix)]
    register_reload(ReloadAction {
        server: Arc::clone(server),
        config_file,
    })?;
    #[cfg(not(unix))]
    let _ = (server, config_file);

    register_quit(QuitAction {
        quit_sender: Arc::new(quit_sender),
    })
}
