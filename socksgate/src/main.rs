/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use anyhow::Context;
use log::{debug, error, info};
use tokio::net::TcpListener;
use tokio::sync::watch;

use socksgate::auth::CredentialStore;
use socksgate::config::GatewayConfig;
use socksgate::escape::ProxyRegistry;
use socksgate::opts::ProcArgs;
use socksgate::serve::HttpProxyServer;

fn main() -> anyhow::Result<()> {
    let Some(proc_args) =
        socksgate::opts::parse_clap().context("failed to parse command line options")?
    else {
        return Ok(());
    };

    // set up process logger early, only proc args is used inside
    let _log_guard =
        socksgate::log::process::setup(&proc_args).context("failed to setup logger")?;

    let config = socksgate::config::load(&proc_args)
        .context(format!("failed to load config, opts: {:?}", &proc_args))?;
    debug!("loaded config from {}", proc_args.config_file.display());

    if proc_args.test_config {
        info!("the format of the config file is ok");
        return Ok(());
    }

    match tokio_run(&proc_args, config) {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("{e:?}");
            Err(e)
        }
    }
}

fn tokio_run(args: &ProcArgs, config: GatewayConfig) -> anyhow::Result<()> {
    let rt = config.runtime.start().context("failed to start runtime")?;
    rt.block_on(async move {
        let listen = config.server.listen;
        let listener = TcpListener::bind(listen)
            .await
            .context(format!("failed to listen on {listen}"))?;

        let server = Arc::new(HttpProxyServer::new(
            config.server,
            CredentialStore::new(&config.user),
            ProxyRegistry::new(&config.proxy),
        ));

        let (quit_sender, quit_receiver) = watch::channel(false);
        socksgate::signal::register(&server, args.config_file.clone(), quit_sender)
            .context("failed to setup signal handler")?;

        server.run(listener, quit_receiver).await;
        Ok(())
    })
}
