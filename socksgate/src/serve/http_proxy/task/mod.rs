/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use http::Version;
use log::debug;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpStream;

use sg_http::server::HttpProxyClientRequest;
use sg_socks::v5::client::socks5_connect;
use sg_types::net::{HttpAuth, ProxyEndpoint, UpstreamAddr};

use super::HttpProxyClientResponse;
use crate::log::task::TaskLogForHttpProxy;
use crate::serve::{ServerTaskError, ServerTaskNotes, ServerTaskResult, ServerTaskStage};

mod common;
pub(crate) use common::CommonTaskContext;

mod connect;
mod forward;

/// One request on one client connection.
///
/// The client connection is closed when the task ends.
pub(crate) struct HttpProxyTask {
    ctx: CommonTaskContext,
    task_notes: ServerTaskNotes,
    http_version: Version,
    task_type: &'static str,
    upstream: Option<UpstreamAddr>,
    proxy: Option<ProxyEndpoint>,
    proxy_bound: Option<UpstreamAddr>,
    clt_to_ups_bytes: u64,
    ups_to_clt_bytes: u64,
}

impl HttpProxyTask {
    pub(crate) fn new(ctx: CommonTaskContext, task_notes: ServerTaskNotes) -> Self {
        HttpProxyTask {
            ctx,
            task_notes,
            http_version: Version::HTTP_11,
            task_type: "HttpProxy",
            upstream: None,
            proxy: None,
            proxy_bound: None,
            clt_to_ups_bytes: 0,
            ups_to_clt_bytes: 0,
        }
    }


    fn log(&self, e: &ServerTaskError) {
        let Some(logger) = &self.ctx.task_logger else {
            return;
        };
        TaskLogForHttpProxy {
            logger,
            task_notes: &self.task_notes,
            task_type: self.task_type,
            upstream: self.upstream.as_ref(),
            proxy: self.proxy.as_ref(),
            proxy_bound: self.proxy_bound.as_ref(),
            clt_to_ups_bytes: self.clt_to_ups_bytes,
            ups_to_clt_bytes: self.ups_to_clt_bytes,
        }
        .log(e);
    }

    pub(crate) async fn into_running<CR, CW>(mut self, clt_r: CR, clt_w: CW)
    where
        CR: AsyncRead + Send + Unpin + 'static,
        CW: AsyncWrite + Send + Unpin + 'static,
    {
        let e = match self.run(clt_r, clt_w).await {
            Ok(_) => ServerTaskError::Finished,
            Err(e) => e,
        };
        self.task_notes.stage = ServerTaskStage::Finished;
        self.log(&e);
    }

    async fn reply_task_err<W>(&mut self, e: &ServerTaskError, clt_w: &mut W)
    where
        W: AsyncWrite + Unpin,
    {
        let Some(rsp) = HttpProxyClientResponse::from_task_err(e, self.http_version) else {
            return;
        };
        self.task_notes.stage = ServerTaskStage::Replying;
        if let Err(we) = rsp.reply_err(clt_w).await {
            debug!(
                "failed to send {} response to client {}: {we}",
                rsp.status(),
                self.task_notes.client_addr()
            );
        }
    }

    async fn run<CR, CW>(&mut self, clt_r: CR, mut clt_w: CW) -> ServerTaskResult<()>
    where
        CR: AsyncRead + Send + Unpin + 'static,
        CW: AsyncWrite + Send + Unpin + 'static,
    {
        self.task_notes.stage = ServerTaskStage::Preparing;
        let mut clt_r = BufReader::new(clt_r);

        let mut req = match HttpProxyClientRequest::parse(
            &mut clt_r,
            self.ctx.server_config.max_header_size,
            &mut self.http_version,
        )
        .await
        {
            Ok(req) => req,
            Err(e) => {
                let e = ServerTaskError::from(e);
                self.reply_task_err(&e, &mut clt_w).await;
                return Err(e);
            }
        };

        if !self.check_auth(&mut req, &mut clt_w).await {
            return Err(ServerTaskError::ClientAuthFailed);
        }

        let upstream = if req.is_connect() {
            self.task_type = "HttpConnect";
            req.connect_upstream()
        } else {
            self.task_type = "HttpForward";
            req.forward_upstream()
        };
        let upstream = match upstream {
            Ok(upstream) => upstream,
            Err(e) => {
                let e = ServerTaskError::from(e);
                self.reply_task_err(&e, &mut clt_w).await;
                return Err(e);
            }
        };
        self.upstream = Some(upstream);

        let ups_stream = match self.connect_upstream().await {
            Ok(stream) => stream,
            Err(e) => {
                self.reply_task_err(&e, &mut clt_w).await;
                return Err(e);
            }
        };
        self.task_notes.stage = ServerTaskStage::Connected;

        if req.is_connect() {
            self.run_connect(clt_r, clt_w, ups_stream).await
        } else {
            self.run_forward(clt_r, clt_w, ups_stream, &req).await
        }
    }

    /// Reply the auth challenge if the client is not allowed.
    async fn check_auth<W>(&mut self, req: &mut HttpProxyClientRequest, clt_w: &mut W) -> bool
    where
        W: AsyncWrite + Unpin,
    {
        // an unparsable value is treated the same as a missing one
        let auth = req.take_auth_info().unwrap_or(HttpAuth::None);
        if let HttpAuth::Basic(basic) = auth
            && self.ctx.users.check_basic(&basic)
        {
            self.task_notes.set_user(basic.username);
            return true;
        }

        self.task_notes.stage = ServerTaskStage::Replying;
        if let Err(e) = HttpProxyClientResponse::reply_proxy_auth_err(
            self.http_version,
            clt_w,
            &self.ctx.server_config.auth_realm,
            true,
        )
        .await
        {
            debug!(
                "failed to send auth challenge to client {}: {e}",
                self.task_notes.client_addr()
            );
        }
        false
    }

    async fn connect_upstream(&mut self) -> ServerTaskResult<TcpStream> {
        let Some(upstream) = &self.upstream else {
            return Err(ServerTaskError::InternalServerError(
                "upstream addr not set",
            ));
        };
        let Some(proxy) = self.ctx.proxies.pick() else {
            return Err(ServerTaskError::NoProxyAvailable);
        };
        self.proxy = Some(proxy.clone());

        self.task_notes.stage = ServerTaskStage::Connecting;
        let (stream, bound) =
            socks5_connect(proxy, upstream, self.ctx.proxies.connect_config()).await?;
        self.proxy_bound = Some(bound);
        Ok(stream)
    }
}
