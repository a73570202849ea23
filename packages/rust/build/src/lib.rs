//! Isolated skeleton builds captured in memory.
//!
//! This crate provides:
//! - [`store`]: the in-memory output store a build writes into
//! - [`engine`]: build engine and template renderer traits
//! - [`BuildRunner`]: one build + extract + render cycle per call
//! - [`bridge`]: engine and renderer backed by an external JavaScript toolchain

pub mod bridge;
pub mod engine;
pub mod runner;
pub mod store;

pub use bridge::{BridgeEngine, BridgeRendererFactory};
pub use engine::{BuildEngine, BuildStats, BundleRenderer, RenderContext, RendererFactory};
pub use runner::{ArtifactPaths, BuildRunner};
pub use store::{MemoryStore, OutputStore};
