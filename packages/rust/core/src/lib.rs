//! Skeleton screen injection for a host build pipeline.
//!
//! This crate ties together entry resolution, in-memory builds, and HTML
//! splicing:
//! - [`entries`]: derive the skeleton entry map from the plugin config
//! - [`splicer`]: one build + splice cycle per generated document
//! - [`plugin`]: lifecycle hooks registered on the host pipeline

pub mod entries;
pub mod plugin;
pub mod splicer;

pub use entries::resolve_entries;
pub use plugin::{
    BinderState, BoxFuture, Compilation, CompilationHook, DocumentHook, PipelineEventSource,
    SKELETON_LOADER, SkeletonPlugin,
};
pub use splicer::{DocumentSplicer, cycle_config, select_entry, skeleton_filename};
