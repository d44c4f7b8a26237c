/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod cmd;
mod error;

pub use cmd::SocksCommand;
pub use error::Socks5ConnectError;
