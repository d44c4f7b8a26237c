/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpStream;
use tokio::time::{Instant, Interval};

use sg_http::server::HttpProxyClientRequest;
use sg_io_ext::{LimitedWriteExt, StreamCopy, StreamCopyError};

use super::HttpProxyTask;
use crate::serve::{ServerTaskError, ServerTaskResult, ServerTaskStage};

impl HttpProxyTask {
    /// Send the request in origin-form through the tunnel, and pass the response back as is.
    ///
    /// The tunnel is used for this request only, the response ends when the origin closes it.
    pub(super) async fn run_forward<CR, CW>(
        &mut self,
        mut clt_r: BufReader<CR>,
        mut clt_w: CW,
        ups_stream: TcpStream,
        req: &HttpProxyClientRequest,
    ) -> ServerTaskResult<()>
    where
        CR: AsyncRead + Send + Unpin + 'static,
        CW: AsyncWrite + Send + Unpin + 'static,
    {
        let (ups_r, mut ups_w) = ups_stream.into_split();

        self.task_notes.stage = ServerTaskStage::Relaying;
        let head = req.serialize_for_origin();
        ups_w
            .write_all_flush(&head)
            .await
            .map_err(ServerTaskError::UpstreamWriteFailed)?;
        self.clt_to_ups_bytes = head.len() as u64;

        let body_type = req.body_type();
        let body_line_max_len = self.ctx.server_config.max_header_size;
        let send_body = async {
            match body_type {
                Some(body_type) => {
                    sg_http::copy_body(&mut clt_r, &mut ups_w, body_type, body_line_max_len).await
                }
                None => Ok(0),
            }
        };
        tokio::pin!(send_body);
        let mut body_sent = body_type.is_none();

        let mut rsp_copy = StreamCopy::new(ups_r, &mut clt_w, &self.ctx.server_config.copy);
        let rsp_bytes = rsp_copy.copied_bytes();

        let idle_timeout = self.ctx.server_config.relay_idle_timeout;
        let mut idle_interval =
            idle_timeout.map(|d| tokio::time::interval_at(Instant::now() + d, d));
        let mut last_rsp_bytes = 0u64;

        let r = loop {
            tokio::select! {
                biased;

                r = &mut rsp_copy => {
                    break r.map(|_| ()).map_err(|e| match e {
                        StreamCopyError::ReadFailed(e) => ServerTaskError::UpstreamReadFailed(e),
                        StreamCopyError::WriteFailed(e) => ServerTaskError::ClientTcpWriteFailed(e),
                    });
                }
                r = &mut send_body, if !body_sent => {
                    body_sent = true;
                    match r {
                        Ok(n) => self.clt_to_ups_bytes += n,
                        Err(e) => break Err(e.into()),
                    }
                }
                _ = idle_tick(&mut idle_interval) => {
                    let n = rsp_bytes.get();
                    // the upload is still moving if the body is not sent yet
                    if n == last_rsp_bytes && body_sent {
                        break Err(ServerTaskError::Idle(idle_timeout.unwrap_or_default()));
                    }
                    last_rsp_bytes = n;
                }
            }
        };
        self.ups_to_clt_bytes = rsp_bytes.get();
        r
    }
}

async fn idle_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
