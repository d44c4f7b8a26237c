/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use super::HttpLineParseError;

pub struct HttpMethodLine<'a> {
    pub method: &'a str,
    pub uri: &'a str,
    /// the minor version of HTTP/1.x
    pub version: u8,
}

impl<'a> HttpMethodLine<'a> {
    pub fn parse(buf: &'a [u8]) -> Result<HttpMethodLine<'a>, HttpLineParseError> {
        const VERSION_LEN: usize = 8; // HTTP/x.x

        let line = std::str::from_utf8(buf)?.trim_end();

        let Some(p) = memchr::memchr(b' ', line.as_bytes()) else {
            return Err(HttpLineParseError::NoDelimiterFound(' '));
        };
        let method = &line[0..p];
        let left = line[p + 1..].trim_start();

        let Some(p) = memchr::memrchr(b' ', left.as_bytes()) else {
            return Err(HttpLineParseError::NoDelimiterFound(' '));
        };
        let uri = left[0..p].trim_end();
        if uri.is_empty() {
            return Err(HttpLineParseError::NotLongEnough);
        }

        let version = &left[p + 1..];
        if version.len() != VERSION_LEN {
            return Err(HttpLineParseError::InvalidVersion);
        }
        let version = match version {
            "HTTP/1.0" => 0,
            "HTTP/1.1" => 1,
            _ => return Err(HttpLineParseError::InvalidVersion),
        };

        Ok(HttpMethodLine {
            method,
            uri,
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect() {
        let l = HttpMethodLine::parse(b"CONNECT example.com:443 HTTP/1.1\r\n").unwrap();
        assert_eq!(l.method, "CONNECT");
        assert_eq!(l.uri, "example.com:443");
        assert_eq!(l.version, 1);
    }

    #[test]
    fn absolute_form() {
        let l = HttpMethodLine::parse(b"GET http://example.com/a?b=c HTTP/1.0\n").unwrap();
        assert_eq!(l.method, "GET");
        assert_eq!(l.uri, "http://example.com/a?b=c");
        assert_eq!(l.version, 0);
    }

    #[test]
    fn invalid() {
        assert!(HttpMethodLine::parse(b"GET\r\n").is_err());
        assert!(HttpMethodLine::parse(b"GET / HTTP/2.0\r\n").is_err());
        assert!(HttpMethodLine::parse(b"GET HTTP/1.1\r\n").is_err());
    }
}
