/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use sg_io_ext::LimitedWriteExt;
use sg_types::auth::{Password, Username};

use super::Socks5ConnectError;

const METHOD_USER: u8 = 0x02;
const USER_AUTH_VERSION: u8 = 0x01;
const USER_AUTH_SUCCEEDED: u8 = 0x00;

/// Offer the username/password method only, and require the server to select it.
pub async fn send_and_recv_method<R, W>(
    reader: &mut R,
    writer: &mut W,
) -> Result<(), Socks5ConnectError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let msg = [0x05, 0x01, METHOD_USER];
    writer
        .write_all_flush(&msg)
        .await
        .map_err(Socks5ConnectError::WriteFailed)?;

    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf).await.map_err(|e| {
        if matches!(e.kind(), std::io::ErrorKind::UnexpectedEof) {
            Socks5ConnectError::NegotiationRejected
        } else {
            Socks5ConnectError::ReadFailed(e)
        }
    })?;
    if buf[0] != 0x05 || buf[1] != METHOD_USER {
        return Err(Socks5ConnectError::NegotiationRejected);
    }
    Ok(())
}

/// Username/password sub-negotiation, see rfc1929.
pub async fn proceed_with_user<R, W>(
    reader: &mut R,
    writer: &mut W,
    username: &Username,
    password: &Password,
) -> Result<(), Socks5ConnectError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(3 + username.len() as usize + password.len() as usize);
    buf.put_u8(USER_AUTH_VERSION);
    buf.put_u8(username.len());
    buf.put_slice(username.as_bytes());
    buf.put_u8(password.len());
    buf.put_slice(password.as_bytes());
    writer
        .write_all_flush(buf.as_ref())
        .await
        .map_err(Socks5ConnectError::WriteFailed)?;

    let mut rsp = [0u8; 2];
    reader
        .read_exact(&mut rsp)
        .await
        .map_err(Socks5ConnectError::from_reply_read)?;
    if rsp[0] != USER_AUTH_VERSION || rsp[1] != USER_AUTH_SUCCEEDED {
        return Err(Socks5ConnectError::AuthRejected);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn negotiate(rsp: &[u8]) -> Result<(), Socks5ConnectError> {
        let mut stream = tokio_test::io::Builder::new()
            .write(b"\x05\x01\x02")
            .read(rsp)
            .build();
        let (mut r, mut w) = tokio::io::split(&mut stream);
        send_and_recv_method(&mut r, &mut w).await
    }

    #[tokio::test]
    async fn method_user_selected() {
        assert!(negotiate(b"\x05\x02").await.is_ok());
    }

    #[tokio::test]
    async fn method_no_acceptable() {
        let r = negotiate(b"\x05\xff").await;
        assert!(matches!(r, Err(Socks5ConnectError::NegotiationRejected)));
    }

    #[tokio::test]
    async fn method_other_selected() {
        let r = negotiate(b"\x05\x01").await;
        assert!(matches!(r, Err(Socks5ConnectError::NegotiationRejected)));
    }

    #[tokio::test]
    async fn method_bad_version() {
        let r = negotiate(b"\x04\x02").await;
        assert!(matches!(r, Err(Socks5ConnectError::NegotiationRejected)));
    }
}
