/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod error;
pub(crate) use error::{ServerTaskError, ServerTaskResult};

mod task;
pub(crate) use task::{ServerTaskNotes, ServerTaskStage};

mod http_proxy;
pub use http_proxy::HttpProxyServer;
