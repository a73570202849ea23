//! In-memory build runner: config → engine → store → renderer → markup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use skeletonize_shared::{BuildConfig, BuildPlugin, OutputConfig, RenderResult, Result, SkeletonError};

use crate::engine::{BuildEngine, RenderContext, RendererFactory};
use crate::store::MemoryStore;

/// Output locations of one cycle, derived from the `output` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Bundle basename without extension, shared by both artifacts.
    pub basename: String,
    /// Compiled bundle path.
    pub bundle: PathBuf,
    /// File name the extraction step must emit.
    pub stylesheet_name: String,
    /// Extracted stylesheet path.
    pub stylesheet: PathBuf,
}

impl ArtifactPaths {
    pub fn from_output(output: &OutputConfig) -> Self {
        let basename = output.basename();
        let stylesheet_name = format!("{basename}.css");
        Self {
            bundle: output.bundle_path(),
            stylesheet: output.path.join(&stylesheet_name),
            stylesheet_name,
            basename,
        }
    }
}

/// Drives isolated build + render cycles.
///
/// Engine and renderer factory are shared; every cycle gets its own config,
/// store and renderer instance.
#[derive(Clone)]
pub struct BuildRunner {
    engine: Arc<dyn BuildEngine>,
    renderer: Arc<dyn RendererFactory>,
    timeout: Option<Duration>,
}

impl BuildRunner {
    pub fn new(engine: Arc<dyn BuildEngine>, renderer: Arc<dyn RendererFactory>) -> Self {
        Self {
            engine,
            renderer,
            timeout: None,
        }
    }

    /// Reject cycles running longer than `timeout` with
    /// [`SkeletonError::BuildTimeout`]. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build `config` and render the resulting bundle.
    #[instrument(skip_all, fields(engine = %self.engine.name(), output = %config.output.filename))]
    pub async fn run(&self, config: BuildConfig) -> Result<RenderResult> {
        let store = Arc::new(MemoryStore::new());
        let cycle = self.run_cycle(config, store);

        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, cycle)
                .await
                .map_err(|_| SkeletonError::BuildTimeout { timeout })?,
            None => cycle.await,
        }
    }

    async fn run_cycle(&self, mut config: BuildConfig, store: Arc<MemoryStore>) -> Result<RenderResult> {
        let start = Instant::now();
        let paths = ArtifactPaths::from_output(&config.output);

        info!(basename = %paths.basename, "generating skeleton");

        config
            .plugins
            .push(BuildPlugin::extract_stylesheet(paths.stylesheet_name.clone()));

        let stats = self
            .engine
            .run(&config, store.clone())
            .await
            .map_err(SkeletonError::BuildFailure)?;
        stats.report();

        let bundle = store.read_text(&paths.bundle)?;
        let stylesheet = store.read_text(&paths.stylesheet)?;
        debug!(
            bundle_len = bundle.len(),
            stylesheet_len = stylesheet.len(),
            "artifacts read from memory store"
        );

        let renderer = self
            .renderer
            .create_bundle_renderer(bundle)
            .map_err(SkeletonError::RenderFailure)?;
        let markup = renderer
            .render_to_string(&RenderContext::empty())
            .await
            .map_err(SkeletonError::RenderFailure)?;

        let result = RenderResult { markup, stylesheet };
        info!(
            basename = %paths.basename,
            fingerprint = %result.fingerprint(),
            elapsed_ms = start.elapsed().as_millis(),
            "skeleton generated"
        );

        Ok(result)
    }
}
