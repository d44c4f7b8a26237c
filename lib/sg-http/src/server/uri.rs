/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use http::Uri;

use sg_types::net::UpstreamAddr;

use super::HttpRequestParseError;

pub trait UriExt {
    /// Get the upstream of an absolute-form http uri.
    ///
    /// Return None for origin-form uri.
    fn get_forward_upstream(&self) -> Result<Option<UpstreamAddr>, HttpRequestParseError>;

    fn get_upstream_with_default_port(
        &self,
        default_port: u16,
    ) -> Result<UpstreamAddr, HttpRequestParseError>;
}

impl UriExt for Uri {
    fn get_forward_upstream(&self) -> Result<Option<UpstreamAddr>, HttpRequestParseError> {
        match self.scheme() {
            Some(scheme) => {
                if scheme.eq(&http::uri::Scheme::HTTP) {
                    let upstream = self.get_upstream_with_default_port(80)?;
                    Ok(Some(upstream))
                } else {
                    Err(HttpRequestParseError::UnsupportedScheme)
                }
            }
            None => {
                if self.authority().is_some() {
                    // authority-form is only for CONNECT
                    Err(HttpRequestParseError::InvalidRequestTarget)
                } else {
                    Ok(None)
                }
            }
        }
    }

    fn get_upstream_with_default_port(
        &self,
        default_port: u16,
    ) -> Result<UpstreamAddr, HttpRequestParseError> {
        match self.authority() {
            Some(authority) => {
                let host = authority.host();
                let port = authority.port_u16().unwrap_or(default_port);
                Ok(UpstreamAddr::from_host_str_and_port(host, port)
                    .map_err(|_| HttpRequestParseError::InvalidRequestTarget)?)
            }
            None => Err(HttpRequestParseError::InvalidRequestTarget),
        }
    }
}
