/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use serde_json::Value;
use yaml_rust::{Yaml, yaml};

/// Get the variable name if the map is in the form `{ env: NAME }`.
pub(super) fn env_var_name(map: &yaml::Hash) -> anyhow::Result<Option<String>> {
    if map.len() != 1 {
        return Ok(None);
    }
    let Some((Yaml::String(k), v)) = map.iter().next() else {
        return Ok(None);
    };
    if sg_yaml::key::normalize(k) != "env" {
        return Ok(None);
    }
    let name = sg_yaml::value::as_string(v).context("invalid env var name")?;
    Ok(Some(name))
}

/// Load the json array stored in env var `name`.
pub(super) fn load_json_array(name: &str) -> anyhow::Result<Vec<Value>> {
    let s = std::env::var(name).map_err(|e| anyhow!("failed to read env var {name}: {e}"))?;
    parse_json_array(&s).context(format!("invalid json value in env var {name}"))
}

fn parse_json_array(s: &str) -> anyhow::Result<Vec<Value>> {
    match serde_json::from_str::<Value>(s)? {
        Value::Array(values) => Ok(values),
        _ => Err(anyhow!("json value type should be 'array'")),
    }
}

pub(super) fn json_as_string(v: &Value) -> anyhow::Result<String> {
    match v {
        Value::String(s) => Ok(s.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(anyhow!(
            "json value type for string should be 'string' or 'number'"
        )),
    }
}

pub(super) fn json_as_u16(v: &Value) -> anyhow::Result<u16> {
    match v {
        Value::String(s) => Ok(s.parse::<u16>()?),
        Value::Number(n) => {
            let n = n
                .as_u64()
                .ok_or_else(|| anyhow!("invalid u16 number {n}"))?;
            Ok(u16::try_from(n)?)
        }
        _ => Err(anyhow!("json value type for 'u16' should be 'string' or 'number'")),
    }
}

/// Run `f` on each key value pair, the value should be a json object.
pub(super) fn foreach_json_kv<F>(v: &Value, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&str, &Value) -> anyhow::Result<()>,
{
    let Value::Object(map) = v else {
        return Err(anyhow!("json value type should be 'object'"));
    };
    for (k, v) in map {
        f(k, v).context(format!("failed to parse value of key {k}"))?;
    }
    Ok(())
}
