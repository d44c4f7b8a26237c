/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

pub fn content_length(len: u64) -> String {
    format!("Content-Length: {len}\r\n")
}

pub const fn content_type_text_plain() -> &'static str {
    "Content-Type: text/plain; charset=utf-8\r\n"
}
