/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use anyhow::anyhow;

// the socks5 user auth message uses a single byte length prefix
const USERNAME_MAX_LENGTH: usize = u8::MAX as usize;
const PASSWORD_MAX_LENGTH: usize = u8::MAX as usize;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Username {
    inner: String,
    len: u8,
}

impl Username {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn from_original(s: &str) -> anyhow::Result<Self> {
        if s.len() > USERNAME_MAX_LENGTH {
            return Err(anyhow!("too long string for a username"));
        }
        if s.contains(':') {
            return Err(anyhow!("colon character is not allowed"));
        }
        Ok(Username {
            inner: s.to_string(),
            len: s.len() as u8,
        })
    }

    pub fn from_encoded(s: &str) -> anyhow::Result<Self> {
        let decoded = percent_encoding::percent_decode_str(s)
            .decode_utf8()
            .map_err(|e| anyhow!("decode failed: {e}"))?;
        Username::from_original(decoded.as_ref())
    }

    pub fn as_original(&self) -> &str {
        &self.inner
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }
}

#[derive(Clone, Eq, PartialEq)]
pub struct Password {
    inner: String,
    len: u8,
}

impl Password {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn from_original(s: &str) -> anyhow::Result<Self> {
        if s.len() > PASSWORD_MAX_LENGTH {
            return Err(anyhow!("too long string for a password"));
        }
        Ok(Password {
            inner: s.to_string(),
            len: s.len() as u8,
        })
    }

    pub fn from_encoded(s: &str) -> anyhow::Result<Self> {
        let decoded = percent_encoding::percent_decode_str(s)
            .decode_utf8()
            .map_err(|e| anyhow!("decode failed: {e}"))?;
        Password::from_original(decoded.as_ref())
    }

    pub fn as_original(&self) -> &str {
        &self.inner
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    /// compare in constant time, so the length of the matched prefix won't leak
    pub fn check(&self, other: &Password) -> bool {
        constant_time_eq::constant_time_eq(self.as_bytes(), other.as_bytes())
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_length() {
        let s = "a".repeat(255);
        let u = Username::from_original(&s).unwrap();
        assert_eq!(u.len(), 255);

        let s = "a".repeat(256);
        assert!(Username::from_original(&s).is_err());
    }

    #[test]
    fn username_colon() {
        assert!(Username::from_original("a:b").is_err());
    }

    #[test]
    fn password_length() {
        let s = "p".repeat(255);
        let p = Password::from_original(&s).unwrap();
        assert_eq!(p.len(), 255);

        let s = "p".repeat(256);
        assert!(Password::from_original(&s).is_err());

        let p = Password::from_original("").unwrap();
        assert!(p.is_empty());
    }

    #[test]
    fn decode_encoded() {
        let u = Username::from_encoded("us%40er").unwrap();
        assert_eq!(u.as_original(), "us@er");
        let p = Password::from_encoded("p%3Ass").unwrap();
        assert_eq!(p.as_original(), "p:ss");
    }

    #[test]
    fn password_check() {
        let p = Password::from_original("secret").unwrap();
        assert!(p.check(&Password::from_original("secret").unwrap()));
        assert!(!p.check(&Password::from_original("secreT").unwrap()));
        assert!(!p.check(&Password::from_original("secret1").unwrap()));
    }

    #[test]
    fn password_debug_hidden() {
        let p = Password::from_original("secret").unwrap();
        let s = format!("{p:?}");
        assert!(!s.contains("secret"));
    }
}
