/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2026 ByteDance and/or its affiliates.
 */

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use humanize_rs::ParseError;
use yaml_rust::{Yaml, YamlLoader, yaml};

pub(crate) fn normalize_key(raw: &str) -> String {
    raw.to_lowercase().replace('-', "_")
}

pub(crate) fn foreach_doc<F>(path: &Path, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&Yaml) -> anyhow::Result<()>,
{
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read file {}: {e}", path.display()))?;
    let docs = YamlLoader::load_from_str(&content)
        .map_err(|e| anyhow!("invalid yaml file {}: {e}", path.display()))?;
    for (i, doc) in docs.iter().enumerate() {
        f(doc).context(format!("failed to load doc #{i}"))?;
    }
    Ok(())
}

pub(crate) fn foreach_kv<F>(table: &yaml::Hash, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&str, &Yaml) -> anyhow::Result<()>,
{
    for (k, v) in table.iter() {
        if let Yaml::String(key) = k {
            f(key, v).context(format!("failed to parse value of key {key}"))?;
        } else {
            return Err(anyhow!("key in hash should be string"));
        }
    }
    Ok(())
}

pub(crate) fn as_string(v: &Yaml) -> anyhow::Result<String> {
    match v {
        Yaml::String(s) => Ok(s.to_string()),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Real(s) => Ok(s.to_string()),
        _ => Err(anyhow!(
            "yaml value type for string should be 'string' / 'integer' / 'real'"
        )),
    }
}

pub(crate) fn as_usize(v: &Yaml) -> anyhow::Result<usize> {
    match v {
        Yaml::String(s) => Ok(usize::from_str(s)?),
        Yaml::Integer(i) => Ok(usize::try_from(*i)?),
        _ => Err(anyhow!(
            "yaml value type for 'usize' should be 'string' or 'integer'"
        )),
    }
}

/// A list of names, given either as a yaml array or as one string.
///
/// Each element may hold several names separated by commas.
pub(crate) fn as_name_list(v: &Yaml) -> anyhow::Result<Vec<String>> {
    let mut vec = Vec::new();
    match v {
        Yaml::Array(seq) => {
            for (i, v) in seq.iter().enumerate() {
                let s = as_string(v).context(format!("invalid value for list element #{i}"))?;
                vec.push(s);
            }
        }
        _ => {
            let s = as_string(v).context("invalid single value for the list")?;
            vec.push(s);
        }
    }
    Ok(super::flatten(&vec))
}

pub(crate) fn as_duration(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::String(value) => parse_duration(value),
        Yaml::Integer(value) => {
            if let Ok(u) = u64::try_from(*value) {
                Ok(Duration::from_secs(u))
            } else {
                Err(anyhow!("unsupported duration string"))
            }
        }
        Yaml::Real(s) => {
            let f = f64::from_str(s).map_err(|e| anyhow!("invalid f64 value: {e}"))?;
            Duration::try_from_secs_f64(f).map_err(anyhow::Error::new)
        }
        _ => Err(anyhow!(
            "yaml value type for humanize duration should be 'string' or 'integer' or 'real'"
        )),
    }
}

pub(crate) fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    match humanize_rs::duration::parse(value) {
        Ok(v) => Ok(v),
        Err(ParseError::MissingUnit) => {
            if let Ok(u) = u64::from_str(value) {
                Ok(Duration::from_secs(u))
            } else if let Ok(f) = f64::from_str(value) {
                Duration::try_from_secs_f64(f).map_err(anyhow::Error::new)
            } else {
                Err(anyhow!("invalid duration string"))
            }
        }
        Err(e) => Err(anyhow!("invalid humanize duration string: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(s: &str) -> Yaml {
        YamlLoader::load_from_str(s).unwrap().pop().unwrap()
    }

    #[test]
    fn key() {
        assert_eq!(normalize_key("Include-Device"), "include_device");
        assert_eq!(normalize_key("exclude_fs_type"), "exclude_fs_type");
    }

    #[test]
    fn kv() {
        let doc = load("a: 1\nb: x");
        let mut result = Vec::new();
        foreach_kv(doc.as_hash().unwrap(), |k, v| {
            result.push((k.to_string(), as_string(v)?));
            Ok(())
        })
        .unwrap();
        assert_eq!(
            result,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "x".to_string())
            ]
        );

        let doc = load("123: 1");
        assert!(foreach_kv(doc.as_hash().unwrap(), |_, _| Ok(())).is_err());
    }

    #[test]
    fn name_list() {
        let v = load("sda,sdb");
        assert_eq!(as_name_list(&v).unwrap(), vec!["sda", "sdb"]);

        let v = load("[sda, 'nvme*,loop*']");
        assert_eq!(as_name_list(&v).unwrap(), vec!["sda", "nvme*", "loop*"]);

        let v = load("{a: b}");
        assert!(as_name_list(&v).is_err());
    }

    #[test]
    fn duration() {
        assert_eq!(
            as_duration(&load("1m30s")).unwrap(),
            Duration::from_secs(90)
        );
        assert_eq!(as_duration(&load("10")).unwrap(), Duration::from_secs(10));
        assert_eq!(
            as_duration(&load("0.5")).unwrap(),
            Duration::from_millis(500)
        );
        assert!(as_duration(&load("-1")).is_err());
        assert!(parse_duration("abc").is_err());
        assert_eq!(parse_duration("1h2m").unwrap(), Duration::from_secs(3720));
    }
}
