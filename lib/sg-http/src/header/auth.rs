/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

pub fn proxy_authenticate_basic(realm: &str) -> String {
    format!("Proxy-Authenticate: Basic realm=\"{realm}\"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_proxy_authenticate_basic() {
        assert_eq!(
            proxy_authenticate_basic("socksgate"),
            "Proxy-Authenticate: Basic realm=\"socksgate\"\r\n"
        );
        assert_eq!(
            proxy_authenticate_basic(""),
            "Proxy-Authenticate: Basic realm=\"\"\r\n"
        );
    }
}
