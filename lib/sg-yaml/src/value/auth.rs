/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use anyhow::anyhow;
use yaml_rust::Yaml;

use sg_types::auth::{Password, Username};

pub fn as_username(value: &Yaml) -> anyhow::Result<Username> {
    match value {
        Yaml::String(s) => Ok(Username::from_original(s)?),
        Yaml::Integer(i) => Ok(Username::from_original(&i.to_string())?),
        _ => Err(anyhow!("yaml value type for username should be string")),
    }
}

pub fn as_password(value: &Yaml) -> anyhow::Result<Password> {
    match value {
        Yaml::String(s) => Ok(Password::from_original(s)?),
        Yaml::Integer(i) => Ok(Password::from_original(&i.to_string())?),
        _ => Err(anyhow!("yaml value type for password should be string")),
    }
}
