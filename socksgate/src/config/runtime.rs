/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use anyhow::anyhow;
use tokio::runtime::{Builder, Runtime};
use yaml_rust::Yaml;

const THREAD_NAME: &str = "main-worker";

#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    thread_number: Option<usize>,
}

impl RuntimeConfig {
    pub(crate) fn parse(&mut self, v: &Yaml) -> anyhow::Result<()> {
        if let Yaml::Hash(map) = v {
            sg_yaml::foreach_kv(map, |k, v| self.parse_by_yaml_kv(k, v))
        } else {
            Err(anyhow!("yaml value type for 'runtime' should be 'map'"))
        }
    }

    fn parse_by_yaml_kv(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match sg_yaml::key::normalize(k).as_str() {
            "thread_number" => {
                let value = sg_yaml::value::as_usize(v)?;
                if value == 0 {
                    return Err(anyhow!("thread number should not be 0"));
                }
                self.thread_number = Some(value);
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        }
    }

    #[inline]
    pub fn thread_number(&self) -> Option<usize> {
        self.thread_number
    }

    pub fn start(&self) -> io::Result<Runtime> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(THREAD_NAME);
        if let Some(n) = self.thread_number {
            builder.worker_threads(n);
        }
        builder.build()
    }
}
