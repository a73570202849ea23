//! Build engine and template renderer seams.
//!
//! Both collaborators are external: the engine compiles the skeleton entry
//! into a bundle plus extracted stylesheet, the renderer executes that bundle
//! to static markup. Their errors are boxed and kept intact.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};

use skeletonize_shared::{BoxError, BuildConfig};

use crate::store::OutputStore;

/// Non-fatal diagnostics reported by a completed build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl BuildStats {
    /// Log every diagnostic; never aborts the cycle.
    pub fn report(&self) {
        for message in &self.errors {
            error!(%message, "skeleton build error");
        }
        for message in &self.warnings {
            warn!(%message, "skeleton build warning");
        }
    }
}

/// Compiles one build configuration into an output store.
///
/// Called once per cycle with a fresh store; implementations must not carry
/// state from one call into the next.
#[async_trait]
pub trait BuildEngine: Send + Sync {
    /// Human-readable engine name for tracing.
    fn name(&self) -> &str;

    /// Run one build. `Err` is a hard failure; diagnostics of a build that
    /// still produced output go into [`BuildStats`].
    async fn run(
        &self,
        config: &BuildConfig,
        output: Arc<dyn OutputStore>,
    ) -> Result<BuildStats, BoxError>;
}

/// Context handed to the renderer; skeletons render against an empty one.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext(pub serde_json::Value);

impl RenderContext {
    pub fn empty() -> Self {
        Self(serde_json::Value::Object(serde_json::Map::new()))
    }
}

/// A renderer bound to one compiled bundle.
#[async_trait]
pub trait BundleRenderer: Send + Sync {
    async fn render_to_string(&self, context: &RenderContext) -> Result<String, BoxError>;
}

/// Creates a fresh [`BundleRenderer`] per cycle.
pub trait RendererFactory: Send + Sync {
    fn create_bundle_renderer(&self, bundle: String) -> Result<Box<dyn BundleRenderer>, BoxError>;
}
