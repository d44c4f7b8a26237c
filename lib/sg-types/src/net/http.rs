/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use base64::prelude::*;
use http::HeaderValue;

use crate::auth::{AuthParseError, Password, Username};

pub struct HttpBasicAuth {
    pub username: Username,
    pub password: Password,
    encoded_value: String,
}

impl HttpBasicAuth {
    pub fn new(username: Username, password: Password) -> Self {
        let us = username.as_original();
        let ps = password.as_original();
        let mut buf = Vec::with_capacity(us.len() + 1 + ps.len());
        buf.extend_from_slice(us.as_bytes());
        buf.push(b':');
        buf.extend_from_slice(ps.as_bytes());

        let encoded_value = BASE64_STANDARD.encode(buf);

        HttpBasicAuth {
            username,
            password,
            encoded_value,
        }
    }

    #[inline]
    pub fn encoded_value(&self) -> &str {
        &self.encoded_value
    }
}

impl FromStr for HttpBasicAuth {
    type Err = AuthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let encoded_value = s.trim();

        let decoded = BASE64_STANDARD
            .decode(encoded_value)
            .map_err(|_| AuthParseError::InvalidBase64Encoding)?;
        let value =
            std::str::from_utf8(&decoded).map_err(|_| AuthParseError::InvalidUtf8Encoding)?;

        match memchr::memchr(b':', value.as_bytes()) {
            Some(i) => {
                let username = Username::from_original(&value[0..i])
                    .map_err(|_| AuthParseError::InvalidUsername)?;
                let password = Password::from_original(&value[i + 1..])
                    .map_err(|_| AuthParseError::InvalidPassword)?;
                Ok(HttpBasicAuth {
                    username,
                    password,
                    encoded_value: encoded_value.to_string(),
                })
            }
            None => Err(AuthParseError::NoDelimiterFound),
        }
    }
}

pub enum HttpAuth {
    None,
    Basic(HttpBasicAuth),
}

impl HttpAuth {
    pub fn from_authorization(value: &str) -> Result<Self, AuthParseError> {
        let value = value.trim();
        match memchr::memchr(b' ', value.as_bytes()) {
            Some(i) => match value[0..i].to_ascii_lowercase().as_str() {
                "basic" => {
                    let basic = HttpBasicAuth::from_str(&value[i + 1..])?;
                    Ok(HttpAuth::Basic(basic))
                }
                _ => Ok(HttpAuth::None),
            },
            None => Err(AuthParseError::UnsupportedAuthType),
        }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, HttpAuth::None)
    }
}

impl TryFrom<&HeaderValue> for HttpAuth {
    type Error = AuthParseError;

    fn try_from(value: &HeaderValue) -> Result<Self, Self::Error> {
        let value = std::str::from_utf8(value.as_bytes())
            .map_err(|_| AuthParseError::InvalidUtf8Encoding)?;
        HttpAuth::from_authorization(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ok() {
        let value = "Basic cm9vdDp0b29y";
        let HttpAuth::Basic(HttpBasicAuth {
            username, password, ..
        }) = HttpAuth::from_authorization(value).unwrap()
        else {
            panic!("not basic auth");
        };
        assert_eq!(username.as_original(), "root");
        assert_eq!(password.as_original(), "toor");
    }

    #[test]
    fn parse_scheme_only() {
        let value = "Basic ";
        let result = HttpAuth::from_authorization(value);
        assert!(result.is_err());
    }

    #[test]
    fn parse_other_scheme() {
        let value = "Bearer abcdef";
        let auth = HttpAuth::from_authorization(value).unwrap();
        assert!(auth.is_none());
    }

    #[test]
    fn parse_no_delimiter() {
        // "ab" without colon
        let value = "Basic YWI=";
        assert!(matches!(
            HttpAuth::from_authorization(value),
            Err(AuthParseError::NoDelimiterFound)
        ));
    }

    #[test]
    fn encode_basic() {
        let auth = HttpBasicAuth::new(
            Username::from_original("a").unwrap(),
            Password::from_original("b").unwrap(),
        );
        assert_eq!(auth.encoded_value(), "YTpi");

        let value = HeaderValue::from_static("basic YTpi");
        let HttpAuth::Basic(parsed) = HttpAuth::try_from(&value).unwrap() else {
            panic!("not basic auth");
        };
        assert_eq!(parsed.username.as_original(), "a");
        assert_eq!(parsed.password.as_original(), "b");
    }
}
