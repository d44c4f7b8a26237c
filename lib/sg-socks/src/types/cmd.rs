/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

/// Only CONNECT is ever sent by this client.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SocksCommand {
    TcpConnect,
}

impl SocksCommand {
    pub const fn code(&self) -> u8 {
        match self {
            SocksCommand::TcpConnect => 0x01,
        }
    }
}
