/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use serde_json::Value;
use yaml_rust::Yaml;

use sg_types::auth::{Password, Username};

use super::env;

#[derive(Clone, Debug, Default)]
pub struct UserConfig {
    users: Vec<(Username, Password)>,
}

impl UserConfig {
    pub(crate) fn parse(v: &Yaml) -> anyhow::Result<Self> {
        let mut config = UserConfig::default();
        if let Yaml::Hash(map) = v
            && let Some(name) = env::env_var_name(map)?
        {
            let values = env::load_json_array(&name)?;
            for (i, v) in values.iter().enumerate() {
                let (user, pass) = json_as_user(v).context(format!("invalid user #{i}"))?;
                config.add(user, pass)?;
            }
            return Ok(config);
        }

        for (user, pass) in sg_yaml::value::as_list(v, as_user)? {
            config.add(user, pass)?;
        }
        Ok(config)
    }

    fn add(&mut self, user: Username, pass: Password) -> anyhow::Result<()> {
        if self.users.iter().any(|(u, _)| *u == user) {
            return Err(anyhow!("duplicate user {}", user.as_original()));
        }
        self.users.push((user, pass));
        Ok(())
    }

    #[inline]
    pub fn users(&self) -> &[(Username, Password)] {
        &self.users
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

fn split_user_pass(s: &str) -> anyhow::Result<(Username, Password)> {
    let (user, pass) = s
        .split_once(':')
        .ok_or_else(|| anyhow!("no ':' delimiter found in user string"))?;
    Ok((Username::from_original(user)?, Password::from_original(pass)?))
}

fn as_user(v: &Yaml) -> anyhow::Result<(Username, Password)> {
    match v {
        Yaml::String(s) => split_user_pass(s),
        Yaml::Hash(map) => {
            let mut user = None;
            let mut pass = None;
            sg_yaml::foreach_kv(map, |k, v| match sg_yaml::key::normalize(k).as_str() {
                "user" | "username" | "name" => {
                    user = Some(sg_yaml::value::as_username(v)?);
                    Ok(())
                }
                "pass" | "password" => {
                    pass = Some(sg_yaml::value::as_password(v)?);
                    Ok(())
                }
                _ => Err(anyhow!("invalid key {k}")),
            })?;
            let user = user.ok_or_else(|| anyhow!("no user name set"))?;
            let pass = pass.ok_or_else(|| anyhow!("no password set"))?;
            Ok((user, pass))
        }
        _ => Err(anyhow!(
            "yaml value type for user should be 'map' or 'string'"
        )),
    }
}

fn json_as_user(v: &Value) -> anyhow::Result<(Username, Password)> {
    if let Value::String(s) = v {
        return split_user_pass(s);
    }

    let mut user = None;
    let mut pass = None;
    env::foreach_json_kv(v, |k, v| match sg_yaml::key::normalize(k).as_str() {
        "user" | "username" | "name" => {
            user = Some(Username::from_original(&env::json_as_string(v)?)?);
            Ok(())
        }
        "pass" | "password" => {
            pass = Some(Password::from_original(&env::json_as_string(v)?)?);
            Ok(())
        }
        _ => Err(anyhow!("invalid key {k}")),
    })?;
    let user = user.ok_or_else(|| anyhow!("no user name set"))?;
    let pass = pass.ok_or_else(|| anyhow!("no password set"))?;
    Ok((user, pass))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::yaml_doc;

    #[test]
    fn parse_list() {
        let yaml = yaml_doc(
            r#"
            - { user: a, pass: b }
            - "c:d:e"
            - { username: f, password: 123 }
            "#,
        );
        let config = UserConfig::parse(&yaml).unwrap();
        let users = config.users();
        assert_eq!(users.len(), 3);
        assert_eq!(users[0].0.as_original(), "a");
        assert_eq!(users[0].1.as_original(), "b");
        assert_eq!(users[1].0.as_original(), "c");
        assert_eq!(users[1].1.as_original(), "d:e");
        assert_eq!(users[2].1.as_original(), "123");
    }

    #[test]
    fn parse_err() {
        let yaml = yaml_doc("- abc");
        assert!(UserConfig::parse(&yaml).is_err());

        let yaml = yaml_doc("- { user: a }");
        assert!(UserConfig::parse(&yaml).is_err());

        let yaml = yaml_doc("- { user: a, pass: b, group: c }");
        assert!(UserConfig::parse(&yaml).is_err());

        let yaml = yaml_doc("- a:b\n- a:c");
        assert!(UserConfig::parse(&yaml).is_err());
    }

    #[test]
    fn parse_null() {
        let config = UserConfig::parse(&Yaml::Null).unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn parse_env() {
        const VAR: &str = "SG_TEST_USERS";
        // SAFETY: the variable name is only used by this test
        unsafe {
            std::env::set_var(VAR, r#"[{"user":"a","pass":"b"},"c:d"]"#);
        }
        let yaml = yaml_doc("env: SG_TEST_USERS");
        let config = UserConfig::parse(&yaml).unwrap();
        assert_eq!(config.users().len(), 2);
        assert_eq!(config.users()[1].0.as_original(), "c");
    }
}
