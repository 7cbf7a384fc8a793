use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    animations: BTreeMap<String, AnimationEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnimationEntry {
    Path(String),
    Detailed {
        path: String,
        /// Expected import error category, for inputs that must be rejected.
        #[serde(default)]
        rejects: Option<String>,
    },
}

impl AnimationEntry {
    fn as_path(&self) -> &str {
        match self {
            AnimationEntry::Path(path) => path,
            AnimationEntry::Detailed { path, .. } => path,
        }
    }

    fn rejects(&self) -> Option<&str> {
        match self {
            AnimationEntry::Path(_) => None,
            AnimationEntry::Detailed { rejects, .. } => rejects.as_deref(),
        }
    }
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a BTreeMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod animations {
    use super::*;

    /// Fixture names, sorted.
    pub fn keys() -> Vec<String> {
        MANIFEST.animations.keys().cloned().collect()
    }

    /// Fixtures that must import cleanly.
    pub fn valid_keys() -> Vec<String> {
        MANIFEST
            .animations
            .iter()
            .filter(|(_, entry)| entry.rejects().is_none())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Error category the importer must report for `name`, if the fixture is invalid input.
    pub fn expected_rejection(name: &str) -> Result<Option<String>> {
        let entry = lookup(&MANIFEST.animations, "animation", name)?;
        Ok(entry.rejects().map(str::to_string))
    }

    pub fn json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.animations, "animation", name)?;
        read_to_string(entry.as_path())
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.animations, "animation", name)?;
        super::load_json(entry.as_path())
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.animations, "animation", name)?;
        Ok(resolve_path(entry.as_path()))
    }
}
