/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

pub fn normalize(raw: &str) -> String {
    raw.to_lowercase().replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t() {
        assert_eq!(normalize("Auth-Realm"), "auth_realm");
        assert_eq!(normalize("THREAD_NUMBER"), "thread_number");
        assert_eq!(normalize("relay-idle_timeout"), "relay_idle_timeout");
    }
}
