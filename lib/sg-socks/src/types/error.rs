/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use crate::v5::Socks5Reply;

#[derive(Error, Debug)]
pub enum Socks5ConnectError {
    #[error("connect to proxy failed: {0}")]
    ConnectionOpenFailed(io::Error),
    #[error("auth method negotiation rejected")]
    NegotiationRejected,
    #[error("user auth rejected")]
    AuthRejected,
    #[error("connect failed: {msg} (code {0})", msg = Socks5Reply::message_for_code(*.0))]
    ConnectFailed(u8),
    #[error("malformed reply")]
    MalformedReply,
    #[error("write failed: {0:?}")]
    WriteFailed(io::Error),
    #[error("read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("peer timeout")]
    PeerTimeout,
}

impl Socks5ConnectError {
    /// Map a read error of a reply message, a truncated reply is malformed.
    pub(crate) fn from_reply_read(e: io::Error) -> Self {
        if matches!(e.kind(), io::ErrorKind::UnexpectedEof) {
            Socks5ConnectError::MalformedReply
        } else {
            Socks5ConnectError::ReadFailed(e)
        }
    }
}
