/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tokio::time::{Instant, Interval};

use super::{CopiedBytes, StreamCopy, StreamCopyConfig, StreamCopyError};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StreamRelayConfig {
    pub copy: StreamCopyConfig,
    /// tear down both directions if no byte moved for this long
    pub idle_timeout: Option<Duration>,
}

#[derive(Error, Debug)]
pub enum StreamRelayError {
    #[error("{0}")]
    CopyFailed(#[from] StreamCopyError),
    #[error("idle for {0:?}")]
    Idle(Duration),
    #[error("pump task aborted: {0}")]
    Aborted(JoinError),
}

/// The result of each relay direction.
#[derive(Debug)]
pub struct StreamRelayOutcome {
    pub clt_to_ups: Result<u64, StreamRelayError>,
    pub ups_to_clt: Result<u64, StreamRelayError>,
}

impl StreamRelayOutcome {
    pub fn is_idle(&self) -> bool {
        matches!(self.clt_to_ups, Err(StreamRelayError::Idle(_)))
            || matches!(self.ups_to_clt, Err(StreamRelayError::Idle(_)))
    }
}

/// Shared byte counters of a running relay.
#[derive(Clone, Debug)]
pub struct StreamRelayStats {
    pub clt_to_ups: CopiedBytes,
    pub ups_to_clt: CopiedBytes,
}

impl StreamRelayStats {
    fn total(&self) -> u64 {
        self.clt_to_ups.get() + self.ups_to_clt.get()
    }
}

struct AbortOnDrop([AbortHandle; 2]);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for h in &self.0 {
            h.abort();
        }
    }
}

/// Bidirectional relay between a client connection and an upstream tunnel.
///
/// Each direction runs in its own task. EOF in one direction is propagated as a
/// write shutdown to the peer, and the other direction keeps running until it
/// ends by itself. Dropping the `run` future aborts both tasks.
pub struct StreamRelay<CR, CW, UR, UW> {
    clt_to_ups: StreamCopy<CR, UW>,
    ups_to_clt: StreamCopy<UR, CW>,
    idle_timeout: Option<Duration>,
}

impl<CR, CW, UR, UW> StreamRelay<CR, CW, UR, UW>
where
    CR: AsyncRead + Send + Unpin + 'static,
    CW: AsyncWrite + Send + Unpin + 'static,
    UR: AsyncRead + Send + Unpin + 'static,
    UW: AsyncWrite + Send + Unpin + 'static,
{
    pub fn new(clt_r: CR, clt_w: CW, ups_r: UR, ups_w: UW, config: &StreamRelayConfig) -> Self {
        StreamRelay::with_clt_data(clt_r, clt_w, ups_r, ups_w, config, Vec::new())
    }

    /// `clt_data` has already been read from the client and will be sent to upstream first.
    pub fn with_clt_data(
        clt_r: CR,
        clt_w: CW,
        ups_r: UR,
        ups_w: UW,
        config: &StreamRelayConfig,
        clt_data: Vec<u8>,
    ) -> Self {
        let clt_to_ups = if clt_data.is_empty() {
            StreamCopy::new(clt_r, ups_w, &config.copy)
        } else {
            StreamCopy::with_data(clt_r, ups_w, &config.copy, clt_data)
        };
        StreamRelay {
            clt_to_ups,
            ups_to_clt: StreamCopy::new(ups_r, clt_w, &config.copy),
            idle_timeout: config.idle_timeout,
        }
    }

    pub fn stats(&self) -> StreamRelayStats {
        StreamRelayStats {
            clt_to_ups: self.clt_to_ups.copied_bytes(),
            ups_to_clt: self.ups_to_clt.copied_bytes(),
        }
    }

    pub async fn run(self) -> StreamRelayOutcome {
        let stats = self.stats();
        let mut c2u = tokio::spawn(self.clt_to_ups);
        let mut u2c = tokio::spawn(self.ups_to_clt);
        let _guard = AbortOnDrop([c2u.abort_handle(), u2c.abort_handle()]);

        let mut idle_interval = self
            .idle_timeout
            .map(|d| tokio::time::interval_at(Instant::now() + d, d));
        let mut last_total = 0u64;

        let mut c2u_r: Option<Result<u64, StreamRelayError>> = None;
        let mut u2c_r: Option<Result<u64, StreamRelayError>> = None;
        while c2u_r.is_none() || u2c_r.is_none() {
            tokio::select! {
                r = &mut c2u, if c2u_r.is_none() => c2u_r = Some(join_result(r)),
                r = &mut u2c, if u2c_r.is_none() => u2c_r = Some(join_result(r)),
                _ = idle_tick(&mut idle_interval) => {
                    let total = stats.total();
                    if total != last_total {
                        last_total = total;
                    } else {
                        let timeout = self.idle_timeout.unwrap_or_default();
                        if c2u_r.is_none() {
                            c2u_r = Some(Err(abort_idle(&mut c2u, timeout).await));
                        }
                        if u2c_r.is_none() {
                            u2c_r = Some(Err(abort_idle(&mut u2c, timeout).await));
                        }
                    }
                }
            }
        }

        StreamRelayOutcome {
            clt_to_ups: c2u_r.unwrap_or(Ok(0)),
            ups_to_clt: u2c_r.unwrap_or(Ok(0)),
        }
    }
}

fn join_result(
    r: Result<Result<u64, StreamCopyError>, JoinError>,
) -> Result<u64, StreamRelayError> {
    match r {
        Ok(Ok(n)) => Ok(n),
        Ok(Err(e)) => Err(StreamRelayError::CopyFailed(e)),
        Err(e) => Err(StreamRelayError::Aborted(e)),
    }
}

async fn abort_idle<T>(handle: &mut JoinHandle<T>, timeout: Duration) -> StreamRelayError {
    handle.abort();
    // wait for the task to drop its io halves
    let _ = handle.await;
    StreamRelayError::Idle(timeout)
}

async fn idle_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
