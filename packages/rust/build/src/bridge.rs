//! Subprocess bridge to an external JavaScript toolchain.
//!
//! The bundler and the server-side renderer live outside this process. Each
//! cycle spawns the configured script and talks to it over a JSON-lines
//! stdin/stdout protocol:
//!
//! ```text
//! bridge → {"type":"ready"}
//! us     → {"type":"build","config":{...}}     | {"type":"render","bundle":"...","context":{}}
//! bridge → {"type":"built","assets":{...},...} | {"type":"rendered","html":"..."} | {"type":"error",...}
//! us     → {"type":"shutdown"}
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use skeletonize_shared::{BoxError, BridgeConfig, BuildConfig, Result, SkeletonError};

use crate::engine::{BuildEngine, BuildStats, BundleRenderer, RenderContext, RendererFactory};
use crate::store::OutputStore;

// ---------------------------------------------------------------------------
// Protocol types
// ---------------------------------------------------------------------------

/// Request message sent to the bridge.
#[derive(Debug, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RequestMessage<'a> {
    Build {
        config: &'a BuildConfig,
    },
    Render {
        bundle: &'a str,
        context: &'a serde_json::Value,
    },
    Shutdown,
}

/// Response message received from the bridge.
#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseMessage {
    Ready,
    Built {
        /// Output path → file content.
        #[serde(default)]
        assets: BTreeMap<String, String>,
        #[serde(default)]
        errors: Vec<String>,
        #[serde(default)]
        warnings: Vec<String>,
    },
    Rendered {
        html: String,
    },
    Error {
        error: String,
    },
}

// ---------------------------------------------------------------------------
// Bridge handle
// ---------------------------------------------------------------------------

/// Handle to one spawned bridge subprocess.
struct BridgeHandle {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
}

impl BridgeHandle {
    /// Spawn `<command> <script>` and wait for its ready message.
    async fn spawn(bridge: &BridgeConfig, script: &Path) -> Result<Self> {
        info!(cmd = %bridge.command, script = %script.display(), "spawning skeleton bridge");

        let mut child = Command::new(&bridge.command)
            .arg(script)
            .current_dir(&bridge.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SkeletonError::Bridge(format!(
                    "failed to spawn bridge: {e}. Is `{}` installed?",
                    bridge.command
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SkeletonError::Bridge("failed to capture bridge stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SkeletonError::Bridge("failed to capture bridge stdout".into()))?;

        let mut handle = Self {
            child,
            stdin,
            reader: BufReader::new(stdout),
        };

        match handle.read_message().await? {
            ResponseMessage::Ready => {
                debug!("bridge is ready");
                Ok(handle)
            }
            other => Err(SkeletonError::Bridge(format!(
                "expected ready message, got: {other:?}"
            ))),
        }
    }

    /// Send one request and wait for its response.
    async fn request(&mut self, message: &RequestMessage<'_>) -> Result<ResponseMessage> {
        self.send(message).await?;
        self.read_message().await
    }

    async fn send(&mut self, message: &RequestMessage<'_>) -> Result<()> {
        let mut json = serde_json::to_string(message)
            .map_err(|e| SkeletonError::Bridge(format!("failed to serialize request: {e}")))?;
        json.push('\n');

        self.stdin
            .write_all(json.as_bytes())
            .await
            .map_err(|e| SkeletonError::Bridge(format!("failed to write to bridge stdin: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| SkeletonError::Bridge(format!("failed to flush bridge stdin: {e}")))
    }

    async fn read_message(&mut self) -> Result<ResponseMessage> {
        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .await
            .map_err(|e| SkeletonError::Bridge(format!("bridge read error: {e}")))?;

        if line.is_empty() {
            return Err(SkeletonError::Bridge("bridge closed stdout unexpectedly".into()));
        }

        serde_json::from_str(line.trim()).map_err(|e| {
            SkeletonError::Bridge(format!(
                "invalid bridge message: {e} (got: {})",
                snippet(&line)
            ))
        })
    }

    /// Send shutdown and wait for the bridge to exit.
    async fn shutdown(mut self) {
        if let Err(e) = self.send(&RequestMessage::Shutdown).await {
            debug!(error = %e, "bridge already gone");
        }
        match self.child.wait().await {
            Ok(status) => debug!(?status, "bridge exited"),
            Err(e) => warn!("bridge wait error: {e}"),
        }
    }
}

/// Leading part of a protocol line, for error messages.
fn snippet(line: &str) -> &str {
    let mut end = line.len().min(200);
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// [`BuildEngine`] backed by the bridge's build script.
pub struct BridgeEngine {
    bridge: BridgeConfig,
}

impl BridgeEngine {
    pub fn new(bridge: BridgeConfig) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl BuildEngine for BridgeEngine {
    fn name(&self) -> &str {
        "bridge"
    }

    async fn run(
        &self,
        config: &BuildConfig,
        output: Arc<dyn OutputStore>,
    ) -> std::result::Result<BuildStats, BoxError> {
        let mut handle = BridgeHandle::spawn(&self.bridge, &self.bridge.build_script).await?;
        let response = handle.request(&RequestMessage::Build { config }).await;
        handle.shutdown().await;

        match response? {
            ResponseMessage::Built {
                assets,
                errors,
                warnings,
            } => {
                for (path, content) in assets {
                    output.write(&PathBuf::from(path), content.into_bytes());
                }
                Ok(BuildStats { errors, warnings })
            }
            ResponseMessage::Error { error } => Err(SkeletonError::Bridge(error).into()),
            other => Err(SkeletonError::Bridge(format!("unexpected build response: {other:?}")).into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// [`RendererFactory`] backed by the bridge's render script.
pub struct BridgeRendererFactory {
    bridge: BridgeConfig,
}

impl BridgeRendererFactory {
    pub fn new(bridge: BridgeConfig) -> Self {
        Self { bridge }
    }
}

impl RendererFactory for BridgeRendererFactory {
    fn create_bundle_renderer(
        &self,
        bundle: String,
    ) -> std::result::Result<Box<dyn BundleRenderer>, BoxError> {
        Ok(Box::new(BridgeRenderer {
            bridge: self.bridge.clone(),
            bundle,
        }))
    }
}

/// Renders one bundle; the subprocess is spawned per render call.
struct BridgeRenderer {
    bridge: BridgeConfig,
    bundle: String,
}

#[async_trait]
impl BundleRenderer for BridgeRenderer {
    async fn render_to_string(&self, context: &RenderContext) -> std::result::Result<String, BoxError> {
        let mut handle = BridgeHandle::spawn(&self.bridge, &self.bridge.render_script).await?;
        let response = handle
            .request(&RequestMessage::Render {
                bundle: &self.bundle,
                context: &context.0,
            })
            .await;
        handle.shutdown().await;

        match response? {
            ResponseMessage::Rendered { html } => Ok(html),
            ResponseMessage::Error { error } => Err(SkeletonError::Bridge(error).into()),
            other => Err(SkeletonError::Bridge(format!("unexpected render response: {other:?}")).into()),
        }
    }
}
