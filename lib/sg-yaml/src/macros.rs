/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

#[cfg(test)]
macro_rules! yaml_doc {
    ($s:literal) => {
        YamlLoader::load_from_str($s)
            .unwrap()
            .into_iter()
            .next()
            .unwrap()
    };
}

#[cfg(test)]
macro_rules! yaml_str {
    ($s:literal) => {
        Yaml::String($s.to_string())
    };
}
