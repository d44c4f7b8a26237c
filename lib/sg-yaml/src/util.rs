/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::path::Path;

use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, YamlLoader, yaml};

/// Load all the yaml documents in the file.
pub fn load_doc(path: &Path) -> anyhow::Result<Vec<Yaml>> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read in file {}: {e}", path.display()))?;
    YamlLoader::load_from_str(&s)
        .map_err(|e| anyhow!("failed to load yaml file {}: {e}", path.display()))
}

/// Run `f` on each document, all of them should be maps.
pub fn foreach_doc<F>(docs: &[Yaml], mut f: F) -> anyhow::Result<()>
where
    F: FnMut(usize, &yaml::Hash) -> anyhow::Result<()>,
{
    for (i, doc) in docs.iter().enumerate() {
        match doc {
            Yaml::Hash(map) => f(i, map).context(format!("failed to load yaml doc #{i}"))?,
            Yaml::Null => {}
            _ => return Err(anyhow!("yaml doc #{i} should be a map")),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiple_docs() {
        let docs = YamlLoader::load_from_str("a: 1\n---\nb: 2\n---\n").unwrap();
        let mut keys = 0;
        foreach_doc(&docs, |_, map| {
            keys += map.len();
            Ok(())
        })
        .unwrap();
        assert_eq!(keys, 2);
    }

    #[test]
    fn invalid_doc() {
        let docs = YamlLoader::load_from_str("- a\n- b\n").unwrap();
        assert!(foreach_doc(&docs, |_, _| Ok(())).is_err());
    }

    #[test]
    fn missing_file() {
        assert!(load_doc(Path::new("/nonexistent/socksgate.yaml")).is_err());
    }
}
