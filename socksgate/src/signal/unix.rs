/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::future::poll_fn;

use anyhow::anyhow;
use log::info;
use tokio::signal::unix::{SignalKind, signal};

use super::AsyncSignalAction;

pub(super) fn register_quit<QUIT>(do_quit: QUIT) -> anyhow::Result<()>
where
    QUIT: AsyncSignalAction + Send + 'static,
{
    for (kind, name) in [
        (SignalKind::quit(), "SIGQUIT"),
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
    ] {
        let mut sig =
            signal(kind).map_err(|e| anyhow!("failed to create {name} listener: {e}"))?;
        let do_quit = do_quit.clone();
        tokio::spawn(async move {
            if poll_fn(|cx| sig.poll_recv(cx)).await.is_some() {
                info!("got quit signal {name}");
                do_quit.run().await;
            }
        });
    }

    Ok(())
}

pub(super) fn register_reload<RELOAD>(call_reload: RELOAD) -> anyhow::Result<()>
where
    RELOAD: AsyncSignalAction + Send + 'static,
{
    let mut hup_sig = signal(SignalKind::hangup())
        .map_err(|e| anyhow!("failed to create SIGHUP listener: {e}"))?;
    tokio::spawn(async move {
        loop {
            if poll_fn(|cx| hup_sig.poll_recv(cx)).await.is_none() {
                break;
            }
            info!("got reload signal");
            call_reload.run().await;
        }
    });

    Ok(())
}
