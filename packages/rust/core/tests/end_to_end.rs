//! Drives the plugin through a fake host pipeline: compilation hooks,
//! document hooks, build, render and splice.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use skeletonize_build::{BuildEngine, BuildStats, BundleRenderer, OutputStore, RenderContext, RendererFactory};
use skeletonize_core::{
    BinderState, Compilation, CompilationHook, DocumentHook, PipelineEventSource, SkeletonPlugin,
};
use skeletonize_shared::{
    BoxError, BuildConfig, ChunkAsset, ChunkAssetMap, EXTRACT_STYLESHEET_PLUGIN, EntrySpec,
    EntryValue, HtmlPluginData, PageAssets, PluginOptions, SkeletonError,
};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Shop</title></head>
<body><div id="app"></div><script src="app.js"></script></body>
</html>"#;

const BUNDLE: &str = "module.exports={render:function(){return '<div class=\"x\">S</div>'}};";
const STYLESHEET: &str = ".x{color:blue}";
const MARKUP: &str = r#"<div class="x">S</div>"#;

// ---------------------------------------------------------------------------
// Fake host
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakePipeline {
    hooks: Vec<CompilationHook>,
}

impl PipelineEventSource for FakePipeline {
    fn on_compilation_created(&mut self, hook: CompilationHook) {
        self.hooks.push(hook);
    }
}

impl FakePipeline {
    /// Create a compilation and run every registered compilation hook on it.
    fn compile(&mut self, parent: Option<EntryValue>) -> Result<FakeCompilation, SkeletonError> {
        let mut compilation = FakeCompilation {
            parent,
            documents: Vec::new(),
        };
        for hook in &mut self.hooks {
            hook(&mut compilation)?;
        }
        Ok(compilation)
    }
}

struct FakeCompilation {
    parent: Option<EntryValue>,
    documents: Vec<DocumentHook>,
}

impl Compilation for FakeCompilation {
    fn parent_entry(&self) -> Option<&EntryValue> {
        self.parent.as_ref()
    }

    fn on_document_preprocess(&mut self, hook: DocumentHook) {
        self.documents.push(hook);
    }
}

impl FakeCompilation {
    async fn emit(&self, mut data: HtmlPluginData) -> Result<HtmlPluginData, SkeletonError> {
        for hook in &self.documents {
            data = hook(data).await?;
        }
        Ok(data)
    }
}

// ---------------------------------------------------------------------------
// Fake collaborators
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeEngine {
    fail: bool,
    configs: Mutex<Vec<BuildConfig>>,
}

#[async_trait]
impl BuildEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    async fn run(&self, config: &BuildConfig, output: Arc<dyn OutputStore>) -> Result<BuildStats, BoxError> {
        self.configs.lock().unwrap().push(config.clone());
        if self.fail {
            return Err("Module not found: ./skeleton.js".into());
        }
        let css = config.output.path.join(format!("{}.css", config.output.basename()));
        output.write(&config.output.bundle_path(), BUNDLE.as_bytes().to_vec());
        output.write(&css, STYLESHEET.as_bytes().to_vec());
        Ok(BuildStats::default())
    }
}

struct StubRenderer;

#[async_trait]
impl BundleRenderer for StubRenderer {
    async fn render_to_string(&self, _context: &RenderContext) -> Result<String, BoxError> {
        Ok(MARKUP.to_string())
    }
}

struct StubFactory {
    bundles: Mutex<Vec<String>>,
}

impl RendererFactory for StubFactory {
    fn create_bundle_renderer(&self, bundle: String) -> Result<Box<dyn BundleRenderer>, BoxError> {
        self.bundles.lock().unwrap().push(bundle);
        Ok(Box::new(StubRenderer))
    }
}

fn plugin(engine: Arc<FakeEngine>, factory: Arc<StubFactory>) -> SkeletonPlugin {
    let options = PluginOptions::new(BuildConfig {
        entry: Some(EntrySpec::from("./src/skeleton.js").into()),
        ..Default::default()
    });
    SkeletonPlugin::new(options, engine, factory).unwrap()
}

fn factory() -> Arc<StubFactory> {
    Arc::new(StubFactory {
        bundles: Mutex::new(Vec::new()),
    })
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn page(chunks: Option<&[&str]>) -> HtmlPluginData {
    let chunks = chunks.map(|names| {
        names
            .iter()
            .map(|name| (name.to_string(), ChunkAsset::default()))
            .collect::<ChunkAssetMap>()
    });
    HtmlPluginData {
        html: PAGE.to_string(),
        assets: PageAssets {
            public_path: "/".into(),
            chunks,
        },
        output_name: "index.html".into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn injects_style_and_markup_into_page() {
    init_tracing();
    let engine = Arc::new(FakeEngine::default());
    let factory = factory();
    let plugin = plugin(engine.clone(), factory.clone());

    let mut pipeline = FakePipeline::default();
    plugin.apply(&mut pipeline);
    let compilation = pipeline.compile(None).unwrap();

    let out = compilation.emit(page(None)).await.unwrap();

    let style = format!("<style>{STYLESHEET}</style>");
    let expected = PAGE
        .replacen("</head>", &format!("{style}</head>"), 1)
        .replacen(r#"<div id="app">"#, &format!(r#"<div id="app">{MARKUP}"#), 1);
    assert_eq!(out.html, expected);

    let style_at = out.html.find(&style).unwrap();
    assert_eq!(&out.html[style_at + style.len()..][..7], "</head>");
    let anchor_end = out.html.find(r#"<div id="app">"#).unwrap() + r#"<div id="app">"#.len();
    assert!(out.html[anchor_end..].starts_with(MARKUP));

    // The engine saw a single-entry config with the extraction step appended.
    let configs = engine.configs.lock().unwrap();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].output.filename, "skeleton-main.js");
    assert_eq!(
        configs[0].entry,
        Some(EntryValue::Spec(EntrySpec::from("./src/skeleton.js")))
    );
    assert!(configs[0].plugins.iter().any(|p| p.name == EXTRACT_STYLESHEET_PLUGIN));
    assert_eq!(*factory.bundles.lock().unwrap(), vec![BUNDLE.to_string()]);
}

#[tokio::test]
async fn entries_bind_once_across_compilations() {
    let engine = Arc::new(FakeEngine::default());
    let plugin = plugin(engine.clone(), factory());

    let mut pipeline = FakePipeline::default();
    plugin.apply(&mut pipeline);
    assert_eq!(plugin.state(), BinderState::Idle);

    let parent = EntryValue::Map([("app", EntrySpec::from("./src/app.js"))].into_iter().collect());
    let first = pipeline.compile(Some(parent)).unwrap();
    assert_eq!(plugin.state(), BinderState::Bound);
    let bound = plugin.entries().unwrap();
    assert_eq!(bound.first_key(), Some("app"));

    let other = EntryValue::Map([("admin", EntrySpec::from("./src/admin.js"))].into_iter().collect());
    let second = pipeline.compile(Some(other)).unwrap();
    assert!(Arc::ptr_eq(&bound, &plugin.entries().unwrap()));

    // Both compilations splice using the entry resolved first.
    let out = first.emit(page(Some(&["app"]))).await.unwrap();
    assert!(out.html.contains(MARKUP));
    let out = second.emit(page(Some(&["app"]))).await.unwrap();
    assert!(out.html.contains(MARKUP));

    let page_without_skeleton = page(Some(&["admin"]));
    let out = second.emit(page_without_skeleton.clone()).await.unwrap();
    assert_eq!(out, page_without_skeleton);

    let configs = engine.configs.lock().unwrap();
    assert_eq!(configs.len(), 2);
    assert!(configs.iter().all(|c| c.output.filename == "skeleton-app.js"));
}

#[tokio::test]
async fn each_document_gets_its_own_cycle() {
    let engine = Arc::new(FakeEngine::default());
    let plugin = plugin(engine.clone(), factory());

    let mut pipeline = FakePipeline::default();
    plugin.apply(&mut pipeline);
    let compilation = pipeline.compile(None).unwrap();

    let (a, b) = tokio::join!(compilation.emit(page(None)), compilation.emit(page(None)));
    assert_eq!(a.unwrap().html, b.unwrap().html);

    // Template config is never mutated between cycles.
    let configs = engine.configs.lock().unwrap();
    assert_eq!(configs.len(), 2);
    assert_eq!(configs[0], configs[1]);
    assert_eq!(
        configs[0]
            .plugins
            .iter()
            .filter(|p| p.name == EXTRACT_STYLESHEET_PLUGIN)
            .count(),
        1
    );
}

#[tokio::test]
async fn build_failure_propagates_through_hook() {
    init_tracing();
    let engine = Arc::new(FakeEngine {
        fail: true,
        ..Default::default()
    });
    let factory = factory();
    let plugin = plugin(engine, factory.clone());

    let mut pipeline = FakePipeline::default();
    plugin.apply(&mut pipeline);
    let compilation = pipeline.compile(None).unwrap();

    let err = compilation.emit(page(None)).await.unwrap_err();
    assert!(matches!(err, SkeletonError::BuildFailure(_)));
    assert!(factory.bundles.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_entry_fails_compilation_and_stays_idle() {
    let options = PluginOptions::new(BuildConfig {
        entry: Some(EntryValue::Map(Default::default())),
        ..Default::default()
    });
    let plugin = SkeletonPlugin::new(options, Arc::new(FakeEngine::default()), factory()).unwrap();

    let mut pipeline = FakePipeline::default();
    plugin.apply(&mut pipeline);

    let err = pipeline.compile(None).err().unwrap();
    assert!(matches!(err, SkeletonError::Config { .. }));
    assert_eq!(plugin.state(), BinderState::Idle);
}
