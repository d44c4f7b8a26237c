/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io::{self, Write};

use http::{StatusCode, Version};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use sg_http::server::HttpRequestParseError;

use crate::serve::ServerTaskError;

pub(crate) struct HttpProxyClientResponse {
    status: StatusCode,
    version: Version,
    close: bool,
    extra_headers: Vec<String>,
    body: Option<String>,
}

impl HttpProxyClientResponse {
    const RESPONSE_BUFFER_SIZE: usize = 1024;

    pub(crate) fn from_standard(status: StatusCode, version: Version, close: bool) -> Self {
        HttpProxyClientResponse {
            status,
            version,
            close,
            extra_headers: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn add_extra_header(&mut self, line: String) {
        self.extra_headers.push(line);
    }

    pub(crate) fn set_body(&mut self, body: String) {
        self.body = Some(body);
    }

    #[inline]
    pub(crate) fn status(&self) -> u16 {
        self.status.as_u16()
    }

    pub(crate) fn from_request_error(e: &HttpRequestParseError, version: Version) -> Option<Self> {
        e.status_code()
            .map(|status| HttpProxyClientResponse::from_standard(status, version, true))
    }

    pub(crate) fn from_task_err(e: &ServerTaskError, version: Version) -> Option<Self> {
        let r = match e {
            ServerTaskError::InvalidClientRequest(e) => {
                return HttpProxyClientResponse::from_request_error(e, version);
            }
            ServerTaskError::InternalServerError(_) | ServerTaskError::NoProxyAvailable => {
                HttpProxyClientResponse::from_standard(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    version,
                    true,
                )
            }
            ServerTaskError::InvalidClientProtocol(_) => {
                HttpProxyClientResponse::from_standard(StatusCode::BAD_REQUEST, version, true)
            }
            ServerTaskError::UpstreamNotNegotiated(_) => {
                let mut response =
                    HttpProxyClientResponse::from_standard(StatusCode::BAD_GATEWAY, version, true);
                response.set_body(format!("{e}\n"));
                response
            }
            ServerTaskError::ClientAuthFailed => {
                // replied with the auth challenge
                return None;
            }
            ServerTaskError::ClientTcpReadFailed(_)
            | ServerTaskError::ClientTcpWriteFailed(_)
            | ServerTaskError::UpstreamReadFailed(_)
            | ServerTaskError::UpstreamWriteFailed(_)
            | ServerTaskError::ClosedByClient
            | ServerTaskError::Idle(_)
            | ServerTaskError::Finished => return None,
        };
        Some(r)
    }

    fn canonical_reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("<unknown status code>")
    }

    pub(crate) async fn reply_ok_to_connect<W>(version: Version, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let s = format!("{version:?} 200 Connection established\r\n\r\n");
        writer.write_all(s.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    pub(crate) async fn reply_err<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut writer = BufWriter::new(writer);

        let reason = self.canonical_reason();
        let body = match &self.body {
            Some(body) => body.clone(),
            None => format!("{} {reason}\n", self.status.as_str()),
        };

        let mut header = Vec::<u8>::with_capacity(Self::RESPONSE_BUFFER_SIZE);
        write!(
            header,
            "{:?} {} {}\r\n",
            self.version,
            self.status.as_str(),
            reason,
        )?;
        for line in &self.extra_headers {
            header.extend_from_slice(line.as_bytes());
        }
        header.extend_from_slice(sg_http::header::content_type_text_plain().as_bytes());
        header.extend_from_slice(sg_http::header::content_length(body.len() as u64).as_bytes());
        header.extend_from_slice(sg_http::header::connection_as_bytes(self.close));
        header.extend_from_slice(b"\r\n");

        writer.write_all(header.as_ref()).await?;
        writer.write_all(body.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    pub(crate) async fn reply_proxy_auth_err<W>(
        version: Version,
        writer: &mut W,
        realm: &str,
        close: bool,
    ) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut response = HttpProxyClientResponse::from_standard(
            StatusCode::PROXY_AUTHENTICATION_REQUIRED,
            version,
            close,
        );
        let auth_header = sg_http::header::proxy_authenticate_basic(realm);
        response.add_extra_header(auth_header);
        response.reply_err(writer).await
    }
}
