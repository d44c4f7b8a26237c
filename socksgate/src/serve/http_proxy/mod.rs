/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod response;
use response::HttpProxyClientResponse;

mod task;
use task::{CommonTaskContext, HttpProxyTask};

mod server;
pub use server::HttpProxyServer;
