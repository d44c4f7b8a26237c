/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod copy;
pub use copy::{HttpBodyCopyError, copy_body};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum HttpBodyType {
    ContentLength(u64),
    ChunkedWithoutTrailer,
    ChunkedWithTrailer,
}
