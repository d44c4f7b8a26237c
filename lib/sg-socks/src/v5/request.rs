/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use bytes::{BufMut, BytesMut};
use tokio::io::AsyncWrite;

use sg_io_ext::LimitedWriteExt;
use sg_types::net::UpstreamAddr;

use super::SocksCommand;

const ADDR_TYPE_DOMAIN: u8 = 0x03;

pub struct Socks5Request;

impl Socks5Request {
    /// Encode a request that carries the target host as a domain string.
    ///
    /// The host is never resolved locally, ip literals are sent in their text form.
    pub fn encode(command: SocksCommand, addr: &UpstreamAddr) -> io::Result<BytesMut> {
        let host = addr.host().to_addr_string();
        let Ok(len) = u8::try_from(host.len()) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "too long target host",
            ));
        };
        if len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty target host",
            ));
        }

        let mut buf = BytesMut::with_capacity(7 + host.len());
        buf.put_u8(0x05);
        buf.put_u8(command.code());
        buf.put_u8(0x00);
        buf.put_u8(ADDR_TYPE_DOMAIN);
        buf.put_u8(len);
        buf.put_slice(host.as_bytes());
        buf.put_u16(addr.port());
        Ok(buf)
    }

    pub async fn send<W>(
        writer: &mut W,
        command: SocksCommand,
        addr: &UpstreamAddr,
    ) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let buf = Socks5Request::encode(command, addr)?;
        writer.write_all_flush(buf.as_ref()).await
    }
}
