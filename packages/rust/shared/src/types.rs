//! Core domain types for skeleton generation.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::{Result, SkeletonError};

/// Entry name used when neither the skeleton config nor the host names one.
pub const DEFAULT_ENTRY_NAME: &str = "main";

/// Name of the build step that extracts component styles into one file.
pub const EXTRACT_STYLESHEET_PLUGIN: &str = "extract-css";

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// One or more module paths forming a single build entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntrySpec {
    Single(String),
    Many(Vec<String>),
}

impl EntrySpec {
    /// Module paths of this entry, in declaration order.
    pub fn modules(&self) -> Vec<&str> {
        match self {
            Self::Single(path) => vec![path.as_str()],
            Self::Many(paths) => paths.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for EntrySpec {
    fn from(path: &str) -> Self {
        Self::Single(path.to_string())
    }
}

/// Insertion-ordered mapping from entry name to entry specification.
///
/// Order is significant: the first key is used as a fallback name and
/// entry selection walks the keys front to back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMap {
    entries: Vec<(String, EntrySpec)>,
}

impl EntryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry. A replaced entry keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, spec: EntrySpec) -> Option<EntrySpec> {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, spec)),
            None => {
                self.entries.push((name, spec));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&EntrySpec> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn first_key(&self) -> Option<&str> {
        self.entries.first().map(|(k, _)| k.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntrySpec)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, EntrySpec)> for EntryMap {
    fn from_iter<I: IntoIterator<Item = (K, EntrySpec)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, spec) in iter {
            map.insert(name, spec);
        }
        map
    }
}

impl Serialize for EntryMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, spec) in &self.entries {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for EntryMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntryMapVisitor;

        impl<'de> Visitor<'de> for EntryMapVisitor {
            type Value = EntryMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of entry names to module paths")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<EntryMap, A::Error> {
                let mut map = EntryMap::new();
                while let Some((name, spec)) = access.next_entry::<String, EntrySpec>()? {
                    map.insert(name, spec);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(EntryMapVisitor)
    }
}

/// The `entry` field of a build configuration: a bare spec or a named map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryValue {
    Spec(EntrySpec),
    Map(EntryMap),
}

impl EntryValue {
    pub fn as_map(&self) -> Option<&EntryMap> {
        match self {
            Self::Map(map) => Some(map),
            Self::Spec(_) => None,
        }
    }
}

impl From<EntrySpec> for EntryValue {
    fn from(spec: EntrySpec) -> Self {
        Self::Spec(spec)
    }
}

impl From<EntryMap> for EntryValue {
    fn from(map: EntryMap) -> Self {
        Self::Map(map)
    }
}

// ---------------------------------------------------------------------------
// Build configuration
// ---------------------------------------------------------------------------

/// Nested configuration handed to the build engine.
///
/// Only `entry` and `output.filename` are rewritten per cycle; everything
/// else passes through to the engine untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<EntryValue>,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub module: ModuleConfig,

    #[serde(default)]
    pub plugins: Vec<BuildPlugin>,

    /// Engine target, e.g. `node` for server bundles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Engine-specific settings we do not interpret.
    #[serde(default, flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `output` section: where the engine writes and how files are named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub path: PathBuf,

    #[serde(default = "default_output_filename")]
    pub filename: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_target: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            filename: default_output_filename(),
            library_target: None,
        }
    }
}

fn default_output_filename() -> String {
    format!("skeleton-{DEFAULT_ENTRY_NAME}.js")
}

impl OutputConfig {
    /// Full path of the compiled bundle.
    pub fn bundle_path(&self) -> PathBuf {
        self.path.join(&self.filename)
    }

    /// Bundle basename without its extension.
    pub fn basename(&self) -> String {
        Path::new(&self.filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// `module` section: source preprocessing rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    #[serde(default)]
    pub rules: Vec<ModuleRule>,
}

/// Maps module paths (by regex) to a loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleRule {
    /// Regex matched against module paths.
    pub test: String,

    #[serde(default)]
    pub loader: String,

    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub options: serde_json::Value,
}

impl ModuleRule {
    pub fn new(test: impl Into<String>, loader: impl Into<String>) -> Self {
        Self {
            test: test.into(),
            loader: loader.into(),
            options: serde_json::Value::Null,
        }
    }

    /// Check whether this rule applies to a module path.
    pub fn matches(&self, path: &str) -> Result<bool> {
        let re = regex::Regex::new(&self.test).map_err(|e| {
            SkeletonError::config(format!("invalid rule pattern {:?}: {e}", self.test))
        })?;
        Ok(re.is_match(path))
    }
}

/// A build step appended to the engine's plugin list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildPlugin {
    pub name: String,

    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub options: serde_json::Value,
}

impl BuildPlugin {
    /// Stylesheet extraction step emitting exactly `filename`.
    pub fn extract_stylesheet(filename: impl Into<String>) -> Self {
        Self {
            name: EXTRACT_STYLESHEET_PLUGIN.to_string(),
            options: serde_json::json!({ "filename": filename.into() }),
        }
    }
}

// ---------------------------------------------------------------------------
// Render result
// ---------------------------------------------------------------------------

/// Markup and stylesheet produced by one build + render cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResult {
    pub markup: String,
    pub stylesheet: String,
}

impl RenderResult {
    /// SHA-256 over both artifacts, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.markup.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.stylesheet.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

// ---------------------------------------------------------------------------
// Host document state
// ---------------------------------------------------------------------------

/// Assets the host emitted for one chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkAsset {
    #[serde(default)]
    pub entry: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub css: Vec<String>,
}

/// Chunk name to emitted assets.
pub type ChunkAssetMap = BTreeMap<String, ChunkAsset>;

/// Asset information for the page being generated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageAssets {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_path: String,

    /// `None` when the host did not supply a chunk mapping.
    #[serde(default)]
    pub chunks: Option<ChunkAssetMap>,
}

/// In-progress document handed over by the host's document plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlPluginData {
    pub html: String,

    #[serde(default)]
    pub assets: PageAssets,

    /// Output file name of the page, e.g. `index.html`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output_name: String,
}

impl HtmlPluginData {
    /// Names of the chunks used by this page, if the host supplied them.
    pub fn used_chunks(&self) -> Option<Vec<&str>> {
        self.assets
            .chunks
            .as_ref()
            .map(|chunks| chunks.keys().map(String::as_str).collect())
    }
}
