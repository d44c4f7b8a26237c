/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod auth;
mod net;
mod primary;

pub use auth::{as_password, as_username};
pub use net::{as_host, as_proxy_endpoint, as_sockaddr};
pub use primary::{as_bool, as_list, as_string, as_u16, as_usize};
