/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod auth;
pub use auth::proxy_authenticate_basic;

mod connection;
pub use connection::connection_as_bytes;

mod content;
pub use content::{content_length, content_type_text_plain};
