/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io::Write;
use std::str::FromStr;

use bytes::BufMut;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri, Version, header};
use tokio::io::AsyncBufRead;

use sg_io_ext::LimitedBufReadExt;
use sg_types::auth::AuthParseError;
use sg_types::net::{HttpAuth, UpstreamAddr};

use super::{HttpRequestParseError, UriExt};
use crate::{HttpBodyType, HttpHeaderLine, HttpLineParseError, HttpMethodLine};

pub struct HttpProxyClientRequest {
    pub version: Version,
    pub method: Method,
    pub uri: Uri,
    pub end_to_end_headers: HeaderMap,
    pub hop_by_hop_headers: HeaderMap,
    proxy_authorization: Option<HeaderValue>,
    /// the port may be 0
    pub host: Option<UpstreamAddr>,
    extra_connection_headers: Vec<HeaderName>,
    origin_header_size: usize,
    content_length: u64,
    chunked_transfer: bool,
    chunked_with_trailer: bool,
    has_transfer_encoding: bool,
    has_content_length: bool,
    has_trailer: bool,
}

impl HttpProxyClientRequest {
    fn new(method: Method, uri: Uri, version: Version) -> Self {
        HttpProxyClientRequest {
            version,
            method,
            uri,
            end_to_end_headers: HeaderMap::new(),
            hop_by_hop_headers: HeaderMap::new(),
            proxy_authorization: None,
            host: None,
            extra_connection_headers: Vec::new(),
            origin_header_size: 0,
            content_length: 0,
            chunked_transfer: false,
            chunked_with_trailer: false,
            has_transfer_encoding: false,
            has_content_length: false,
            has_trailer: false,
        }
    }

    #[inline]
    pub fn is_connect(&self) -> bool {
        self.method.eq(&Method::CONNECT)
    }

    pub fn body_type(&self) -> Option<HttpBodyType> {
        if self.chunked_transfer {
            if self.chunked_with_trailer {
                Some(HttpBodyType::ChunkedWithTrailer)
            } else {
                Some(HttpBodyType::ChunkedWithoutTrailer)
            }
        } else if self.content_length > 0 {
            Some(HttpBodyType::ContentLength(self.content_length))
        } else {
            None
        }
    }

    /// Take the credentials for this gateway.
    ///
    /// `Proxy-Authorization` is preferred. If it is absent, a Basic `Authorization`
    /// header is used instead, and it will not be sent to the origin server.
    pub fn take_auth_info(&mut self) -> Result<HttpAuth, AuthParseError> {
        if let Some(value) = self.proxy_authorization.take() {
            return HttpAuth::try_from(&value);
        }

        let Some(value) = self.end_to_end_headers.get(header::AUTHORIZATION) else {
            return Ok(HttpAuth::None);
        };
        let auth = HttpAuth::try_from(value)?;
        if !auth.is_none() {
            self.end_to_end_headers.remove(header::AUTHORIZATION);
        }
        Ok(auth)
    }

    /// The tunnel target of a CONNECT request.
    pub fn connect_upstream(&self) -> Result<UpstreamAddr, HttpRequestParseError> {
        self.uri.get_upstream_with_default_port(443)
    }

    /// The origin server of a forward request, from the absolute-form uri or the Host header.
    pub fn forward_upstream(&self) -> Result<UpstreamAddr, HttpRequestParseError> {
        if let Some(upstream) = self.uri.get_forward_upstream()? {
            return Ok(upstream);
        }
        match &self.host {
            Some(host) => {
                let mut upstream = host.clone();
                upstream.set_default_port(80);
                Ok(upstream)
            }
            None => Err(HttpRequestParseError::MissedHost),
        }
    }

    pub async fn parse<R>(
        reader: &mut R,
        max_header_size: usize,
        version: &mut Version,
    ) -> Result<Self, HttpRequestParseError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut line_buf = Vec::<u8>::with_capacity(1024);
        let mut header_size: usize = 0;

        let (found, nr) = reader
            .limited_read_until(b'\n', max_header_size, &mut line_buf)
            .await?;
        if nr == 0 {
            return Err(HttpRequestParseError::ClientClosed);
        }
        if !found {
            return if nr < max_header_size {
                Err(HttpRequestParseError::ClientClosed)
            } else {
                Err(HttpRequestParseError::TooLargeHeader(max_header_size))
            };
        }
        header_size += nr;

        let mut req = HttpProxyClientRequest::build_from_method_line(line_buf.as_ref())?;
        *version = req.version; // always set version in case of error

        loop {
            if header_size >= max_header_size {
                return Err(HttpRequestParseError::TooLargeHeader(max_header_size));
            }
            line_buf.clear();
            let max_len = max_header_size - header_size;
            let (found, nr) = reader
                .limited_read_until(b'\n', max_len, &mut line_buf)
                .await?;
            if nr == 0 {
                return Err(HttpRequestParseError::ClientClosed);
            }
            if !found {
                return if nr < max_len {
                    Err(HttpRequestParseError::ClientClosed)
                } else {
                    Err(HttpRequestParseError::TooLargeHeader(max_header_size))
                };
            }
            header_size += nr;
            if (line_buf.len() == 1 && line_buf[0] == b'\n')
                || (line_buf.len() == 2 && line_buf[0] == b'\r' && line_buf[1] == b'\n')
            {
                // header end line
                break;
            }

            let header = HttpHeaderLine::parse(line_buf.as_ref())
                .map_err(HttpRequestParseError::InvalidHeaderLine)?;
            req.handle_header(header)?;
        }
        req.origin_header_size = header_size;

        req.post_check_and_fix();
        Ok(req)
    }

    /// do some necessary check and fix
    fn post_check_and_fix(&mut self) {
        if self.has_trailer && !self.chunked_transfer {
            self.hop_by_hop_headers.remove(header::TRAILER);
        }

        // headers listed in Connection are hop-by-hop
        for name in &self.extra_connection_headers {
            self.end_to_end_headers.remove(name);
        }
    }

    fn build_from_method_line(line_buf: &[u8]) -> Result<Self, HttpRequestParseError> {
        let req =
            HttpMethodLine::parse(line_buf).map_err(HttpRequestParseError::InvalidMethodLine)?;

        let version = match req.version {
            0 => Version::HTTP_10,
            _ => Version::HTTP_11,
        };

        let method = Method::from_str(req.method)
            .map_err(|_| HttpRequestParseError::UnsupportedMethod(req.method.to_string()))?;
        let uri =
            Uri::from_str(req.uri).map_err(|_| HttpRequestParseError::InvalidRequestTarget)?;
        Ok(HttpProxyClientRequest::new(method, uri, version))
    }

    fn parse_header_connection(&mut self, value: &str) {
        let value = value.to_lowercase();

        for v in value.as_str().split(',') {
            match v.trim() {
                "" | "keep-alive" | "close" => {}
                s => {
                    if let Ok(h) = HeaderName::from_str(s) {
                        self.extra_connection_headers.push(h);
                    }
                }
            }
        }
    }

    fn append_header(
        &mut self,
        name: HeaderName,
        value: &str,
    ) -> Result<(), HttpRequestParseError> {
        let value = HeaderValue::from_str(value).map_err(|_| {
            HttpRequestParseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderValue)
        })?;
        self.end_to_end_headers.append(name, value);
        Ok(())
    }

    fn insert_hop_by_hop_header(
        &mut self,
        name: HeaderName,
        value: &str,
    ) -> Result<(), HttpRequestParseError> {
        let value = HeaderValue::from_str(value).map_err(|_| {
            HttpRequestParseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderValue)
        })?;
        self.hop_by_hop_headers.append(name, value);
        Ok(())
    }

    fn handle_header(&mut self, header: HttpHeaderLine) -> Result<(), HttpRequestParseError> {
        let name = HeaderName::from_str(header.name).map_err(|_| {
            HttpRequestParseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderName)
        })?;

        match name.as_str() {
            "host" => {
                if self.host.is_some() {
                    return Err(HttpRequestParseError::InvalidHost);
                }
                if !header.value.is_empty() {
                    let host = UpstreamAddr::from_str(header.value)
                        .map_err(|_| HttpRequestParseError::InvalidHost)?;
                    // the default port is set later, as it depends on the method
                    self.host = Some(host);
                }
            }
            "connection" => {
                self.parse_header_connection(header.value);
                return Ok(());
            }
            "keep-alive" | "proxy-connection" => {
                // we always close the connection after one request
                return Ok(());
            }
            "proxy-authorization" => {
                let value = HeaderValue::from_str(header.value).map_err(|_| {
                    HttpRequestParseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderValue)
                })?;
                self.proxy_authorization = Some(value);
                return Ok(());
            }
            "te" => {
                // hop-by-hop option, but let's pass it
                return self.insert_hop_by_hop_header(name, header.value);
            }
            "upgrade" => {
                return Err(HttpRequestParseError::UpgradeIsNotSupported);
            }
            "trailer" => {
                self.has_trailer = true;
                if self.chunked_transfer {
                    self.chunked_with_trailer = true;
                }
                return self.insert_hop_by_hop_header(name, header.value);
            }
            "transfer-encoding" => {
                // it's a hop-by-hop option, but we just pass it
                self.has_transfer_encoding = true;
                if self.has_content_length {
                    // delete content-length
                    self.end_to_end_headers.remove(header::CONTENT_LENGTH);
                    self.content_length = 0;
                }

                let v = header.value.to_lowercase();
                if v.ends_with("chunked") {
                    self.chunked_transfer = true;
                    if self.has_trailer {
                        self.chunked_with_trailer = true;
                    }
                } else {
                    return Err(HttpRequestParseError::InvalidChunkedTransferEncoding);
                }
                return self.insert_hop_by_hop_header(name, header.value);
            }
            "content-length" => {
                if self.has_transfer_encoding {
                    // ignore content-length
                    return Ok(());
                }

                let content_length = u64::from_str(header.value)
                    .map_err(|_| HttpRequestParseError::InvalidContentLength)?;

                if self.has_content_length && self.content_length != content_length {
                    return Err(HttpRequestParseError::InvalidContentLength);
                }
                self.has_content_length = true;
                self.content_length = content_length;
            }
            _ => {}
        }

        self.append_header(name, header.value)
    }

    /// Serialize the request head in origin-form, with the connection to be closed after.
    pub fn serialize_for_origin(&self) -> Vec<u8> {
        const RESERVED_LEN_FOR_EXTRA_HEADERS: usize = 256;
        let mut buf =
            Vec::<u8>::with_capacity(self.origin_header_size + RESERVED_LEN_FOR_EXTRA_HEADERS);
        if let Some(pa) = self.uri.path_and_query() {
            if self.method.eq(&Method::OPTIONS) && pa.query().is_none() && pa.path().eq("/") {
                let _ = write!(buf, "OPTIONS * {:?}\r\n", self.version);
            } else {
                let _ = write!(buf, "{} {} {:?}\r\n", self.method, pa, self.version);
            }
        } else if self.method.eq(&Method::OPTIONS) {
            let _ = write!(buf, "OPTIONS * {:?}\r\n", self.version);
        } else {
            let _ = write!(buf, "{} / {:?}\r\n", self.method, self.version);
        }
        if !self.end_to_end_headers.contains_key(header::HOST) {
            if let Some(authority) = self.uri.authority() {
                let _ = write!(buf, "Host: {authority}\r\n");
            }
        }
        for (name, value) in self.end_to_end_headers.iter() {
            buf.put_slice(name.as_ref());
            buf.put_slice(b": ");
            buf.put_slice(value.as_bytes());
            buf.put_slice(b"\r\n");
        }
        for (name, value) in self.hop_by_hop_headers.iter() {
            buf.put_slice(name.as_ref());
            buf.put_slice(b": ");
            buf.put_slice(value.as_bytes());
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(crate::header::connection_as_bytes(true));
        buf.put_slice(b"\r\n");
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, BufReader};

    async fn parse_bytes(
        content: &'static [u8],
        max_header_size: usize,
    ) -> Result<HttpProxyClientRequest, HttpRequestParseError> {
        let mut builder = tokio_test::io::Builder::new();
        if !content.is_empty() {
            builder.read(content);
        }
        let mut reader = BufReader::new(builder.build());
        let mut version = Version::HTTP_11;
        HttpProxyClientRequest::parse(&mut reader, max_header_size, &mut version).await
    }

    #[tokio::test]
    async fn read_connect() {
        let content = b"CONNECT example.com:443 HTTP/1.1\r\n\
            Host: example.com:443\r\n\
            Proxy-Authorization: Basic YTpi\r\n\
            Proxy-Connection: Keep-Alive\r\n\r\n\
            \x16\x03\x01";
        let stream = tokio_test::io::Builder::new().read(content).build();
        let mut reader = BufReader::new(stream);
        let mut version = Version::HTTP_10;
        let mut req = HttpProxyClientRequest::parse(&mut reader, 4096, &mut version)
            .await
            .unwrap();
        assert_eq!(version, Version::HTTP_11);
        assert!(req.is_connect());
        assert_eq!(req.connect_upstream().unwrap().to_string(), "example.com:443");

        let HttpAuth::Basic(auth) = req.take_auth_info().unwrap() else {
            panic!("no basic auth");
        };
        assert_eq!(auth.username.as_original(), "a");
        assert_eq!(auth.password.as_original(), "b");

        // bytes after the header are kept in the reader
        let mut left = Vec::new();
        reader.read_to_end(&mut left).await.unwrap();
        assert_eq!(left, b"\x16\x03\x01");
    }

    #[tokio::test]
    async fn connect_default_port() {
        let req = parse_bytes(b"CONNECT example.com HTTP/1.1\r\n\r\n", 4096)
            .await
            .unwrap();
        assert_eq!(req.connect_upstream().unwrap().port(), 443);
    }

    #[tokio::test]
    async fn read_get() {
        let content = b"GET http://example.com/v/a/x?k=v HTTP/1.1\r\n\
            Host: example.com\r\n\
            Connection: Keep-Alive, X-Hop\r\n\
            X-Hop: 1\r\n\
            Proxy-Authorization: Basic YTpi\r\n\
            Accept: */*\r\n\r\n";
        let mut req = parse_bytes(content, 4096).await.unwrap();
        assert_eq!(req.method, Method::GET);
        assert!(req.body_type().is_none());
        assert_eq!(req.forward_upstream().unwrap().to_string(), "example.com:80");
        assert!(matches!(req.take_auth_info(), Ok(HttpAuth::Basic(_))));

        let head = req.serialize_for_origin();
        assert_eq!(
            head,
            b"GET /v/a/x?k=v HTTP/1.1\r\n\
            host: example.com\r\n\
            accept: */*\r\n\
            Connection: Close\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn read_origin_form() {
        let content = b"POST /submit HTTP/1.0\r\n\
            Host: example.net:8080\r\n\
            Content-Length: 5\r\n\r\n";
        let req = parse_bytes(content, 4096).await.unwrap();
        assert_eq!(req.version, Version::HTTP_10);
        assert_eq!(req.body_type(), Some(HttpBodyType::ContentLength(5)));
        assert_eq!(req.forward_upstream().unwrap().to_string(), "example.net:8080");
    }

    #[tokio::test]
    async fn read_no_host() {
        let req = parse_bytes(b"GET /submit HTTP/1.1\r\n\r\n", 4096)
            .await
            .unwrap();
        assert!(matches!(
            req.forward_upstream(),
            Err(HttpRequestParseError::MissedHost)
        ));
    }

    #[tokio::test]
    async fn read_chunked() {
        let content = b"PUT http://example.com/up HTTP/1.1\r\n\
            Transfer-Encoding: chunked\r\n\
            Trailer: X-Checksum\r\n\r\n";
        let req = parse_bytes(content, 4096).await.unwrap();
        assert_eq!(req.body_type(), Some(HttpBodyType::ChunkedWithTrailer));

        let head = req.serialize_for_origin();
        assert_eq!(
            head,
            b"PUT /up HTTP/1.1\r\n\
            Host: example.com\r\n\
            transfer-encoding: chunked\r\n\
            trailer: X-Checksum\r\n\
            Connection: Close\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn authorization_fallback() {
        let content = b"GET http://example.com/ HTTP/1.1\r\n\
            Authorization: Basic YTpi\r\n\r\n";
        let mut req = parse_bytes(content, 4096).await.unwrap();
        assert!(matches!(req.take_auth_info(), Ok(HttpAuth::Basic(_))));
        assert!(!req.end_to_end_headers.contains_key(header::AUTHORIZATION));

        let content = b"GET http://example.com/ HTTP/1.1\r\n\
            Authorization: Bearer abcd\r\n\r\n";
        let mut req = parse_bytes(content, 4096).await.unwrap();
        assert!(matches!(req.take_auth_info(), Ok(HttpAuth::None)));
        assert!(req.end_to_end_headers.contains_key(header::AUTHORIZATION));
    }

    #[tokio::test]
    async fn too_large_header() {
        let content = b"GET http://example.com/ HTTP/1.1\r\n\
            X-Long: aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\r\n\r\n";
        let r = parse_bytes(content, 64).await;
        let Err(e) = r else {
            panic!("should fail");
        };
        assert!(matches!(e, HttpRequestParseError::TooLargeHeader(64)));
    }

    #[tokio::test]
    async fn invalid_requests() {
        let content = b"GET http://example.com/ HTTP/1.1\r\nUpgrade: websocket\r\n\r\n";
        let r = parse_bytes(content, 4096).await;
        assert!(matches!(r, Err(HttpRequestParseError::UpgradeIsNotSupported)));

        let r = parse_bytes(b"GET http://example.com/ HTTP/2.0\r\n\r\n", 4096).await;
        assert!(matches!(r, Err(HttpRequestParseError::InvalidMethodLine(_))));

        let r = parse_bytes(b"GET http://example.com/ HTTP/1.1\r\nHost", 4096).await;
        assert!(matches!(r, Err(HttpRequestParseError::ClientClosed)));

        let r = parse_bytes(b"", 4096).await;
        assert!(matches!(r, Err(HttpRequestParseError::ClientClosed)));
    }
}
