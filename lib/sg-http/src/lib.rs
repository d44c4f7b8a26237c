/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod parse;
pub use parse::{HttpChunkedLine, HttpHeaderLine, HttpLineParseError, HttpMethodLine};

mod body;
pub use body::{HttpBodyCopyError, HttpBodyType, copy_body};

pub mod header;
pub mod server;
