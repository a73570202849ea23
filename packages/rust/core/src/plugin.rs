//! Host pipeline integration: lifecycle hooks and loader registration.
//!
//! The plugin never drives itself. It registers a compilation hook on the
//! host pipeline; when the first compilation is created it resolves the
//! skeleton entries (`Idle` → `Bound`) and, for that and every later
//! compilation, attaches a document hook that injects the skeleton into
//! each generated page.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};

use tracing::info;

use skeletonize_build::{
    BridgeEngine, BridgeRendererFactory, BuildEngine, BuildRunner, RendererFactory,
};
use skeletonize_shared::{
    BuildConfig, EntryMap, EntryValue, HtmlPluginData, ModuleRule, PluginOptions, Result,
    SkeletonError,
};

use crate::entries::resolve_entries;
use crate::splicer::DocumentSplicer;

/// Module path of the skeleton source loader registered by [`SkeletonPlugin::loader`].
pub const SKELETON_LOADER: &str = "skeletonize/loader";

/// Boxed future returned by async hooks.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Fired once per compilation; must return before the host proceeds.
pub type CompilationHook = Box<dyn FnMut(&mut dyn Compilation) -> Result<()> + Send>;

/// Fired once per generated document; resolves to the mutated document.
pub type DocumentHook =
    Arc<dyn Fn(HtmlPluginData) -> BoxFuture<'static, Result<HtmlPluginData>> + Send + Sync>;

// ---------------------------------------------------------------------------
// Host traits
// ---------------------------------------------------------------------------

/// The host build pipeline, as seen by the plugin.
pub trait PipelineEventSource {
    fn on_compilation_created(&mut self, hook: CompilationHook);
}

/// One compilation of the host pipeline.
pub trait Compilation {
    /// The host's own `entry` setting.
    fn parent_entry(&self) -> Option<&EntryValue>;

    fn on_document_preprocess(&mut self, hook: DocumentHook);
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

/// Lifecycle state of a [`SkeletonPlugin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinderState {
    /// Entries not resolved yet.
    Idle,
    /// Entries resolved and cached.
    Bound,
}

/// Skeleton screen plugin for a host build pipeline.
pub struct SkeletonPlugin {
    template: Arc<BuildConfig>,
    splicer: Arc<DocumentSplicer>,
    entries: Arc<OnceLock<Arc<EntryMap>>>,
}

impl SkeletonPlugin {
    /// Create a plugin with injected build engine and renderer.
    pub fn new(
        options: PluginOptions,
        engine: Arc<dyn BuildEngine>,
        renderer: Arc<dyn RendererFactory>,
    ) -> Result<Self> {
        options.validate()?;

        let runner = BuildRunner::new(engine, renderer).with_timeout(options.timeout());
        let splicer = DocumentSplicer::new(runner, options.insert_after);

        Ok(Self {
            template: Arc::new(options.build_config),
            splicer: Arc::new(splicer),
            entries: Arc::new(OnceLock::new()),
        })
    }

    /// Create a plugin backed by the subprocess bridge from `options.bridge`.
    pub fn with_bridge(options: PluginOptions) -> Result<Self> {
        let bridge = options
            .bridge
            .clone()
            .ok_or_else(|| SkeletonError::config("bridge section is required"))?;

        Self::new(
            options,
            Arc::new(BridgeEngine::new(bridge.clone())),
            Arc::new(BridgeRendererFactory::new(bridge)),
        )
    }

    pub fn state(&self) -> BinderState {
        match self.entries.get() {
            Some(_) => BinderState::Bound,
            None => BinderState::Idle,
        }
    }

    /// Resolved entry map, once bound.
    pub fn entries(&self) -> Option<Arc<EntryMap>> {
        self.entries.get().cloned()
    }

    /// Register the plugin's hooks on the host pipeline.
    pub fn apply(&self, pipeline: &mut dyn PipelineEventSource) {
        let template = Arc::clone(&self.template);
        let splicer = Arc::clone(&self.splicer);
        let cell = Arc::clone(&self.entries);

        pipeline.on_compilation_created(Box::new(move |compilation: &mut dyn Compilation| {
            let entries = bind(&cell, template.entry.as_ref(), compilation.parent_entry())?;
            let template = Arc::clone(&template);
            let splicer = Arc::clone(&splicer);

            compilation.on_document_preprocess(Arc::new(
                move |data: HtmlPluginData| -> BoxFuture<'static, Result<HtmlPluginData>> {
                    let entries = Arc::clone(&entries);
                    let template = Arc::clone(&template);
                    let splicer = Arc::clone(&splicer);
                    Box::pin(async move { splicer.process(data, &entries, &template).await })
                },
            ));
            Ok(())
        }));
    }

    /// Build a module rule delegating to the skeleton loader.
    ///
    /// `loader` is replaced; `options` becomes a copy of the caller's options
    /// object, or `{}` when there is none.
    pub fn loader(mut rule: ModuleRule) -> ModuleRule {
        rule.loader = SKELETON_LOADER.to_string();
        rule.options = match rule.options {
            serde_json::Value::Object(map) => serde_json::Value::Object(map),
            _ => serde_json::Value::Object(serde_json::Map::new()),
        };
        rule
    }
}

/// `Idle` → `Bound`: resolve entries on first call, reuse afterwards.
fn bind(
    cell: &OnceLock<Arc<EntryMap>>,
    primary: Option<&EntryValue>,
    parent: Option<&EntryValue>,
) -> Result<Arc<EntryMap>> {
    if let Some(entries) = cell.get() {
        return Ok(Arc::clone(entries));
    }

    let resolved = Arc::new(resolve_entries(primary, parent)?);
    let entries = Arc::clone(cell.get_or_init(|| resolved));
    info!(
        entries = ?entries.keys().collect::<Vec<_>>(),
        "skeleton entries resolved"
    );
    Ok(entries)
}
