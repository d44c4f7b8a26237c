/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use sg_types::net::{ProxyEndpoint, UpstreamAddr};

use super::{Socks5ConnectError, Socks5Reply, Socks5Request, SocksCommand, auth};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Socks5ConnectConfig {
    /// timeout for the tcp connection to the proxy
    pub connect_timeout: Duration,
    /// timeout for all the handshake steps after tcp connected
    pub negotiation_timeout: Duration,
}

impl Default for Socks5ConnectConfig {
    fn default() -> Self {
        Socks5ConnectConfig {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            negotiation_timeout: DEFAULT_NEGOTIATION_TIMEOUT,
        }
    }
}

/// Run the client side socks5 handshake on an already connected stream.
///
/// The steps are strictly sequential: method negotiation, user auth and then
/// the connect request. Return the bind address reported by the proxy.
pub async fn socks5_handshake<S>(
    stream: &mut S,
    proxy: &ProxyEndpoint,
    target: &UpstreamAddr,
) -> Result<UpstreamAddr, Socks5ConnectError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(stream);

    auth::send_and_recv_method(&mut reader, &mut writer).await?;
    auth::proceed_with_user(&mut reader, &mut writer, proxy.username(), proxy.password()).await?;

    Socks5Request::send(&mut writer, SocksCommand::TcpConnect, target)
        .await
        .map_err(Socks5ConnectError::WriteFailed)?;

    match Socks5Reply::recv(&mut reader).await? {
        Socks5Reply::Succeeded(addr) => Ok(addr),
        rsp => Err(Socks5ConnectError::ConnectFailed(rsp.code())),
    }
}

/// Connect to `target` through the socks5 `proxy`.
///
/// The returned stream is ready for relay, with no handshake bytes left in it.
/// On any failure the connection to the proxy is closed before return.
pub async fn socks5_connect(
    proxy: &ProxyEndpoint,
    target: &UpstreamAddr,
    config: &Socks5ConnectConfig,
) -> Result<(TcpStream, UpstreamAddr), Socks5ConnectError> {
    let peer = proxy.peer();
    let host = peer.host().to_addr_string();
    let mut stream = match tokio::time::timeout(
        config.connect_timeout,
        TcpStream::connect((host.as_ref(), peer.port())),
    )
    .await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(Socks5ConnectError::ConnectionOpenFailed(e)),
        Err(_) => {
            return Err(Socks5ConnectError::ConnectionOpenFailed(io::Error::new(
                io::ErrorKind::TimedOut,
                "connect timed out",
            )));
        }
    };

    let r = tokio::time::timeout(
        config.negotiation_timeout,
        socks5_handshake(&mut stream, proxy, target),
    )
    .await;
    match r {
        Ok(Ok(bind_addr)) => Ok((stream, bind_addr)),
        Ok(Err(e)) => {
            close(stream).await;
            Err(e)
        }
        Err(_) => {
            close(stream).await;
            Err(Socks5ConnectError::PeerTimeout)
        }
    }
}

async fn close(mut stream: TcpStream) {
    let _ = stream.shutdown().await;
}
