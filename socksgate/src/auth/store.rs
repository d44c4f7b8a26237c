/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use sg_types::auth::{Password, Username};
use sg_types::net::HttpBasicAuth;

use crate::config::UserConfig;

/// The users allowed to use this gateway.
#[derive(Debug, Default)]
pub struct CredentialStore {
    users: Vec<(Username, Password)>,
}

impl CredentialStore {
    pub fn new(config: &UserConfig) -> Self {
        CredentialStore {
            users: config.users().to_vec(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// The password is compared in constant time.
    pub fn check(&self, username: &Username, password: &Password) -> bool {
        self.users
            .iter()
            .find(|(u, _)| u == username)
            .map(|(_, p)| p.check(password))
            .unwrap_or(false)
    }

    #[inline]
    pub fn check_basic(&self, auth: &HttpBasicAuth) -> bool {
        self.check(&auth.username, &auth.password)
    }
}
