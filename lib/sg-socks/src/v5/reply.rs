/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tokio::io::{AsyncRead, AsyncReadExt};

use sg_types::net::{Host, UpstreamAddr};

use super::Socks5ConnectError;

pub enum Socks5Reply {
    Succeeded(UpstreamAddr),
    GeneralServerFailure,
    ForbiddenByRule,
    NetworkUnreachable,
    HostUnreachable,
    ConnectionRefused,
    TtlExpired,
    CommandNotSupported,
    AddressTypeNotSupported,
    ConnectionTimedOut,
    Unassigned(u8),
}

impl Socks5Reply {
    fn failed(code: u8) -> Self {
        match code {
            0x01 => Socks5Reply::GeneralServerFailure,
            0x02 => Socks5Reply::ForbiddenByRule,
            0x03 => Socks5Reply::NetworkUnreachable,
            0x04 => Socks5Reply::HostUnreachable,
            0x05 => Socks5Reply::ConnectionRefused,
            0x06 => Socks5Reply::TtlExpired,
            0x07 => Socks5Reply::CommandNotSupported,
            0x08 => Socks5Reply::AddressTypeNotSupported,
            0x09 => Socks5Reply::ConnectionTimedOut,
            n => Socks5Reply::Unassigned(n),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Socks5Reply::Succeeded(_) => 0x00,
            Socks5Reply::GeneralServerFailure => 0x01,
            Socks5Reply::ForbiddenByRule => 0x02,
            Socks5Reply::NetworkUnreachable => 0x03,
            Socks5Reply::HostUnreachable => 0x04,
            Socks5Reply::ConnectionRefused => 0x05,
            Socks5Reply::TtlExpired => 0x06,
            Socks5Reply::CommandNotSupported => 0x07,
            Socks5Reply::AddressTypeNotSupported => 0x08,
            Socks5Reply::ConnectionTimedOut => 0x09,
            Socks5Reply::Unassigned(n) => *n,
        }
    }

    pub const fn error_message(&self) -> &'static str {
        match self {
            // message from rfc1928
            Socks5Reply::Succeeded(_) => "Succeeded",
            Socks5Reply::GeneralServerFailure => "General SOCKS server failure",
            Socks5Reply::ForbiddenByRule => "Connection not allowed by ruleset",
            Socks5Reply::NetworkUnreachable => "Network unreachable",
            Socks5Reply::HostUnreachable => "Host unreachable",
            Socks5Reply::ConnectionRefused => "Connection refused",
            Socks5Reply::TtlExpired => "TTL expired",
            Socks5Reply::CommandNotSupported => "Command not supported",
            Socks5Reply::AddressTypeNotSupported => "Address type not supported",
            // message from socks-6-09
            Socks5Reply::ConnectionTimedOut => "Connection attempt timed out",
            Socks5Reply::Unassigned(_) => "unassigned reply code",
        }
    }

    pub(crate) fn message_for_code(code: u8) -> &'static str {
        if code == 0x00 {
            "Succeeded"
        } else {
            Socks5Reply::failed(code).error_message()
        }
    }

    /// Receive a reply, the bound address is fully consumed on success.
    pub async fn recv<R>(reader: &mut R) -> Result<Self, Socks5ConnectError>
    where
        R: AsyncRead + Unpin,
    {
        let mut hdr = [0u8; 2];
        read_exact(reader, &mut hdr).await?;
        if hdr[0] != 0x05 {
            return Err(Socks5ConnectError::MalformedReply);
        }

        // a failure reply may be cut short after the status byte
        let code = hdr[1];
        if code != 0x00 {
            return Ok(Socks5Reply::failed(code));
        }

        let mut rsv_atyp = [0u8; 2];
        read_exact(reader, &mut rsv_atyp).await?;

        let bind_addr = match rsv_atyp[1] {
            0x01 => {
                let mut ip_bytes = [0u8; 4];
                read_exact(reader, &mut ip_bytes).await?;
                let port = read_port(reader).await?;
                UpstreamAddr::new(Host::Ip(IpAddr::V4(Ipv4Addr::from(ip_bytes))), port)
            }
            0x03 => {
                let mut len = [0u8; 1];
                read_exact(reader, &mut len).await?;
                let mut domain = vec![0u8; len[0] as usize];
                read_exact(reader, &mut domain).await?;
                let port = read_port(reader).await?;
                let domain =
                    std::str::from_utf8(&domain).map_err(|_| Socks5ConnectError::MalformedReply)?;
                UpstreamAddr::from_host_str_and_port(domain, port)
                    .map_err(|_| Socks5ConnectError::MalformedReply)?
            }
            0x04 => {
                let mut ip_bytes = [0u8; 16];
                read_exact(reader, &mut ip_bytes).await?;
                let port = read_port(reader).await?;
                UpstreamAddr::new(Host::Ip(IpAddr::V6(Ipv6Addr::from(ip_bytes))), port)
            }
            _ => return Err(Socks5ConnectError::MalformedReply),
        };

        Ok(Socks5Reply::Succeeded(bind_addr))
    }
}

async fn read_exact<R>(reader: &mut R, buf: &mut [u8]) -> Result<(), Socks5ConnectError>
where
    R: AsyncRead + Unpin,
{
    reader
        .read_exact(buf)
        .await
        .map_err(Socks5ConnectError::from_reply_read)?;
    Ok(())
}

async fn read_port<R>(reader: &mut R) -> Result<u16, Socks5ConnectError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 2];
    read_exact(reader, &mut buf).await?;
    Ok(u16::from_be_bytes(buf))
}
