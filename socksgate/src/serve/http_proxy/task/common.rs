/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use slog::Logger;

use crate::auth::CredentialStore;
use crate::config::ServerConfig;
use crate::escape::ProxyRegistry;

/// Snapshots taken when the client connection is accepted.
///
/// A reload only affects connections accepted after it.
pub(crate) struct CommonTaskContext {
    pub(crate) server_config: Arc<ServerConfig>,
    pub(crate) users: Arc<CredentialStore>,
    pub(crate) proxies: Arc<ProxyRegistry>,
    pub(crate) task_logger: Option<Logger>,
}
