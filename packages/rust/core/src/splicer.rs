//! Per-document skeleton injection: pick the entry, build it, splice it.

use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use skeletonize_build::BuildRunner;
use skeletonize_shared::{
    BuildConfig, DEFAULT_ENTRY_NAME, EntryMap, EntrySpec, HtmlPluginData, Result,
};
use skeletonize_splice::splice_skeleton;

/// Output file name of the skeleton bundle for `entry`.
pub fn skeleton_filename(entry: &str) -> String {
    format!("skeleton-{entry}.js")
}

/// Pick the skeleton entry for the page being generated.
///
/// Walks `entries` in order and returns the first name that is also one of
/// the page's chunks. Without a chunk mapping the default entry name is
/// returned.
pub fn select_entry<'a>(entries: &'a EntryMap, data: &HtmlPluginData) -> Option<&'a str> {
    match data.used_chunks() {
        Some(used) => entries
            .keys()
            .find(|name| used.iter().any(|chunk| chunk == name)),
        None => Some(DEFAULT_ENTRY_NAME),
    }
}

/// Clone `template` for one cycle, pointed at a single entry.
pub fn cycle_config(template: &BuildConfig, name: &str, spec: &EntrySpec) -> BuildConfig {
    let mut config = template.clone();
    config.entry = Some(spec.clone().into());
    config.output.filename = skeleton_filename(name);
    config
}

/// Runs one build cycle per document and splices the result in.
pub struct DocumentSplicer {
    runner: BuildRunner,
    insert_after: String,
}

impl DocumentSplicer {
    pub fn new(runner: BuildRunner, insert_after: impl Into<String>) -> Self {
        Self {
            runner,
            insert_after: insert_after.into(),
        }
    }

    /// Inject the skeleton into `data.html`.
    ///
    /// Pages whose chunks match no skeleton entry pass through untouched.
    /// Build, render and splice failures are returned as-is and the
    /// document is not modified.
    pub async fn process(
        &self,
        mut data: HtmlPluginData,
        entries: &EntryMap,
        template: &BuildConfig,
    ) -> Result<HtmlPluginData> {
        let span = info_span!(
            "skeleton_cycle",
            cycle_id = %Uuid::now_v7(),
            page = %data.output_name,
        );

        async move {
            let Some(name) = select_entry(entries, &data) else {
                debug!("no skeleton entry matches this page's chunks, skipping");
                return Ok(data);
            };
            let Some(spec) = entries.get(name) else {
                debug!(entry = %name, "entry not in skeleton map, skipping");
                return Ok(data);
            };

            info!(entry = %name, "injecting skeleton");
            let config = cycle_config(template, name, spec);
            let rendered = self.runner.run(config).await?;

            data.html = splice_skeleton(&data.html, &self.insert_after, &rendered)?;
            Ok(data)
        }
        .instrument(span)
        .await
    }
}
