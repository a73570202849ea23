//! Shared types, error model, and configuration for skeletonize.
//!
//! This crate is the foundation depended on by all other skeletonize crates.
//! It provides:
//! - [`SkeletonError`]: the unified error type
//! - Domain types ([`EntryMap`], [`BuildConfig`], [`RenderResult`], [`HtmlPluginData`])
//! - Configuration ([`PluginOptions`], option loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    BridgeConfig, DEFAULT_INSERT_AFTER, DEFAULT_TIMEOUT_MS, PluginOptions, load_options_from,
};
pub use error::{BoxError, Result, SkeletonError};
pub use types::{
    BuildConfig, BuildPlugin, ChunkAsset, ChunkAssetMap, DEFAULT_ENTRY_NAME,
    EXTRACT_STYLESHEET_PLUGIN, EntryMap, EntrySpec, EntryValue, HtmlPluginData, ModuleConfig,
    ModuleRule, OutputConfig, PageAssets, RenderResult,
};
