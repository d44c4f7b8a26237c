/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod host;
pub use host::Host;

mod upstream;
pub use upstream::UpstreamAddr;

mod http;
pub use http::{HttpAuth, HttpBasicAuth};

mod proxy;
pub use proxy::{ProxyEndpoint, ProxyParseError};
