/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::time::Duration;

use thiserror::Error;

use sg_http::HttpBodyCopyError;
use sg_http::server::HttpRequestParseError;
use sg_io_ext::{StreamCopyError, StreamRelayError};
use sg_socks::v5::Socks5ConnectError;

#[derive(Error, Debug)]
pub(crate) enum ServerTaskError {
    #[error("internal server error: {0}")]
    InternalServerError(&'static str),
    #[error("no upstream proxy available")]
    NoProxyAvailable,
    #[error("invalid client request: {0}")]
    InvalidClientRequest(#[from] HttpRequestParseError),
    #[error("invalid client protocol: {0}")]
    InvalidClientProtocol(&'static str),
    #[error("tcp read from client: {0:?}")]
    ClientTcpReadFailed(io::Error),
    #[error("tcp write to client: {0:?}")]
    ClientTcpWriteFailed(io::Error),
    #[error("client authentication failed")]
    ClientAuthFailed,
    #[error("upstream not negotiated: {0}")]
    UpstreamNotNegotiated(#[from] Socks5ConnectError),
    #[error("read from upstream: {0:?}")]
    UpstreamReadFailed(io::Error),
    #[error("write to upstream: {0:?}")]
    UpstreamWriteFailed(io::Error),
    #[error("closed by client")]
    ClosedByClient,
    #[error("idle after {0:?}")]
    Idle(Duration),
    #[error("finished")]
    Finished, // this isn't an error, for log only
}

impl ServerTaskError {
    pub(crate) fn brief(&self) -> &'static str {
        match self {
            ServerTaskError::InternalServerError(_) => "InternalServerError",
            ServerTaskError::NoProxyAvailable => "NoProxyAvailable",
            ServerTaskError::InvalidClientRequest(_) => "InvalidClientRequest",
            ServerTaskError::InvalidClientProtocol(_) => "InvalidClientProtocol",
            ServerTaskError::ClientTcpReadFailed(_) => "ClientTcpReadFailed",
            ServerTaskError::ClientTcpWriteFailed(_) => "ClientTcpWriteFailed",
            ServerTaskError::ClientAuthFailed => "ClientAuthFailed",
            ServerTaskError::UpstreamNotNegotiated(_) => "UpstreamNotNegotiated",
            ServerTaskError::UpstreamReadFailed(_) => "UpstreamReadFailed",
            ServerTaskError::UpstreamWriteFailed(_) => "UpstreamWriteFailed",
            ServerTaskError::ClosedByClient => "ClosedByClient",
            ServerTaskError::Idle(_) => "Idle",
            ServerTaskError::Finished => "Finished",
        }
    }

    /// Map the error of the client to upstream copy direction.
    pub(crate) fn from_clt_to_ups(e: StreamRelayError) -> Self {
        match e {
            StreamRelayError::CopyFailed(StreamCopyError::ReadFailed(e)) => {
                ServerTaskError::ClientTcpReadFailed(e)
            }
            StreamRelayError::CopyFailed(StreamCopyError::WriteFailed(e)) => {
                ServerTaskError::UpstreamWriteFailed(e)
            }
            StreamRelayError::Idle(d) => ServerTaskError::Idle(d),
            StreamRelayError::Aborted(_) => {
                ServerTaskError::InternalServerError("client to upstream copy aborted")
            }
        }
    }

    /// Map the error of the upstream to client copy direction.
    pub(crate) fn from_ups_to_clt(e: StreamRelayError) -> Self {
        match e {
            StreamRelayError::CopyFailed(StreamCopyError::ReadFailed(e)) => {
                ServerTaskError::UpstreamReadFailed(e)
            }
            StreamRelayError::CopyFailed(StreamCopyError::WriteFailed(e)) => {
                ServerTaskError::ClientTcpWriteFailed(e)
            }
            StreamRelayError::Idle(d) => ServerTaskError::Idle(d),
            StreamRelayError::Aborted(_) => {
                ServerTaskError::InternalServerError("upstream to client copy aborted")
            }
        }
    }
}

impl From<HttpBodyCopyError> for ServerTaskError {
    fn from(e: HttpBodyCopyError) -> Self {
        match e {
            HttpBodyCopyError::ReadFailed(e) => ServerTaskError::ClientTcpReadFailed(e),
            HttpBodyCopyError::WriteFailed(e) => ServerTaskError::UpstreamWriteFailed(e),
            HttpBodyCopyError::UnexpectedEof => ServerTaskError::ClosedByClient,
            HttpBodyCopyError::InvalidChunkedBody(_) => {
                ServerTaskError::InvalidClientProtocol("invalid chunked body")
            }
        }
    }
}

pub(crate) type ServerTaskResult<T> = Result<T, ServerTaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_error_direction() {
        let e = StreamRelayError::CopyFailed(StreamCopyError::ReadFailed(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "reset",
        )));
        let e = ServerTaskError::from_clt_to_ups(e);
        assert_eq!(e.brief(), "ClientTcpReadFailed");

        let e = StreamRelayError::CopyFailed(StreamCopyError::ReadFailed(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "reset",
        )));
        let e = ServerTaskError::from_ups_to_clt(e);
        assert_eq!(e.brief(), "UpstreamReadFailed");

        let e = ServerTaskError::from_ups_to_clt(StreamRelayError::Idle(Duration::from_secs(1)));
        assert_eq!(e.to_string(), "idle after 1s");
    }

    #[test]
    fn body_error() {
        let e = ServerTaskError::from(HttpBodyCopyError::UnexpectedEof);
        assert_eq!(e.brief(), "ClosedByClient");
    }

    #[test]
    fn negotiation_message() {
        let e = ServerTaskError::from(Socks5ConnectError::ConnectFailed(5));
        assert_eq!(
            e.to_string(),
            "upstream not negotiated: connect failed: Connection refused (code 5)"
        );
    }
}
