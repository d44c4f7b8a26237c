/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod limited_read_until;

mod limited_buf_read_ext;
pub use limited_buf_read_ext::LimitedBufReadExt;

mod write_all_flush;

mod limited_write_ext;
pub use limited_write_ext::LimitedWriteExt;
