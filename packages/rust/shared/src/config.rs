//! Plugin configuration.
//!
//! Options are fixed at construction time. They can be built in code or
//! loaded from a TOML file; unspecified fields fall back to defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkeletonError};
use crate::types::BuildConfig;

/// Default anchor after which the skeleton markup is inserted.
pub const DEFAULT_INSERT_AFTER: &str = r#"<div id="app">"#;

/// Default limit for one build + render cycle.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Construction-time options of the skeleton plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginOptions {
    /// Build configuration for the skeleton bundle.
    #[serde(default)]
    pub build_config: BuildConfig,

    /// Anchor string; markup is inserted right after its last occurrence.
    #[serde(default = "default_insert_after")]
    pub insert_after: String,

    /// Per-cycle timeout in milliseconds. `0` disables the timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// External toolchain used by the bridge engine and renderer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<BridgeConfig>,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            build_config: BuildConfig::default(),
            insert_after: default_insert_after(),
            timeout_ms: default_timeout_ms(),
            bridge: None,
        }
    }
}

fn default_insert_after() -> String {
    DEFAULT_INSERT_AFTER.into()
}
fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl PluginOptions {
    /// Options with the given build configuration and defaults elsewhere.
    pub fn new(build_config: BuildConfig) -> Self {
        Self {
            build_config,
            ..Self::default()
        }
    }

    /// Cycle timeout, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Parse options from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SkeletonError::config(format!("failed to parse options: {e}")))
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.insert_after.is_empty() {
            return Err(SkeletonError::config("insert_after must not be empty"));
        }
        if self.build_config.entry.is_none() {
            return Err(SkeletonError::config("build_config.entry is required"));
        }
        for rule in &self.build_config.module.rules {
            rule.matches("")?;
        }
        if let Some(bridge) = &self.bridge {
            bridge.validate()?;
        }
        Ok(())
    }
}

/// `[bridge]` section: external JavaScript toolchain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Runtime command (e.g., "node").
    #[serde(default = "default_bridge_cmd")]
    pub command: String,

    /// Script driving the build engine.
    pub build_script: PathBuf,

    /// Script driving the server-side renderer.
    pub render_script: PathBuf,

    /// Working directory for both subprocesses.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
}

fn default_bridge_cmd() -> String {
    "node".into()
}
fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

impl BridgeConfig {
    fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(SkeletonError::config("bridge.command must not be empty"));
        }
        if self.build_script.as_os_str().is_empty() || self.render_script.as_os_str().is_empty() {
            return Err(SkeletonError::config(
                "bridge.build_script and bridge.render_script are required",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load plugin options from a TOML file and validate them.
pub fn load_options_from(path: &Path) -> Result<PluginOptions> {
    let content = std::fs::read_to_string(path).map_err(|e| SkeletonError::io(path, e))?;

    let options: PluginOptions = toml::from_str(&content).map_err(|e| {
        SkeletonError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    options.validate()?;

    tracing::debug!(?path, insert_after = %options.insert_after, "loaded skeleton options");
    Ok(options)
}
