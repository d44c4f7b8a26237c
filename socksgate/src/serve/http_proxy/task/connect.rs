/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpStream;

use sg_io_ext::StreamRelay;

use super::HttpProxyTask;
use crate::serve::http_proxy::HttpProxyClientResponse;
use crate::serve::{ServerTaskError, ServerTaskResult, ServerTaskStage};

impl HttpProxyTask {
    pub(super) async fn run_connect<CR, CW>(
        &mut self,
        clt_r: BufReader<CR>,
        mut clt_w: CW,
        ups_stream: TcpStream,
    ) -> ServerTaskResult<()>
    where
        CR: AsyncRead + Send + Unpin + 'static,
        CW: AsyncWrite + Send + Unpin + 'static,
    {
        self.task_notes.stage = ServerTaskStage::Replying;
        HttpProxyClientResponse::reply_ok_to_connect(self.http_version, &mut clt_w)
            .await
            .map_err(ServerTaskError::ClientTcpWriteFailed)?;

        // the client may send data right after the request head
        let clt_data = clt_r.buffer().to_vec();
        let clt_r = clt_r.into_inner();
        let (ups_r, ups_w) = ups_stream.into_split();

        self.task_notes.stage = ServerTaskStage::Relaying;
        let relay = StreamRelay::with_clt_data(
            clt_r,
            clt_w,
            ups_r,
            ups_w,
            &self.ctx.server_config.relay_config(),
            clt_data,
        );
        let stats = relay.stats();
        let outcome = relay.run().await;
        self.clt_to_ups_bytes = stats.clt_to_ups.get();
        self.ups_to_clt_bytes = stats.ups_to_clt.get();

        if let Err(e) = outcome.clt_to_ups {
            return Err(ServerTaskError::from_clt_to_ups(e));
        }
        if let Err(e) = outcome.ups_to_clt {
            return Err(ServerTaskError::from_ups_to_clt(e));
        }
        Ok(())
    }
}
