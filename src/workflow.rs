//! End-to-end download and upload runs built from a `SyncConfig`
//!
//! Both runs report fatal errors to the sink as `Error: ...` before
//! returning them, so a caller that only watches the sink still sees why a
//! run stopped.

use std::sync::Arc;

use crate::ai::GeminiProvider;
use crate::backend::CrowdinClient;
use crate::bundle::{export_js_bundles, extract_archive, validate_paths};
use crate::config::SyncConfig;
use crate::engine::{ReconciliationEngine, RunPolicy, SyncSummary};
use crate::error::SyncResult;
use crate::loader::SyncInputs;
use crate::sink::ProgressSink;

/// Outcome of a download run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    pub build_id: u64,
    pub files_extracted: usize,
    /// Output folders that received a JS bundle
    pub exported: Vec<String>,
}

/// Build, download, extract and export the latest translations
pub async fn run_download(
    client: &CrowdinClient,
    config: &SyncConfig,
    sink: &dyn ProgressSink,
) -> SyncResult<DownloadSummary> {
    download_steps(client, config, sink)
        .await
        .inspect_err(|e| sink.report(&format!("Error: {}", e)))
}

async fn download_steps(
    client: &CrowdinClient,
    config: &SyncConfig,
    sink: &dyn ProgressSink,
) -> SyncResult<DownloadSummary> {
    sink.report("Initiating build...");
    let build_id = client.initiate_build().await?;

    sink.report(&format!("Waiting for build {}...", build_id));
    client
        .poll_build_status(build_id, config.poll_interval, sink)
        .await?;

    sink.report("Downloading...");
    let archive = client
        .download_build(build_id, &config.archive_path, sink)
        .await?;

    sink.report("Extracting...");
    let files_extracted = extract_archive(&archive, &config.data_path, sink)?;
    sink.report(&format!("Extracted to: {}", config.data_path.display()));

    for issue in validate_paths(&config.data_path, &config.export_mapping, &config.resource_file) {
        sink.report(&format!("Warning: {}", issue));
    }

    sink.report("Processing language files...");
    let exported = export_js_bundles(
        &config.data_path,
        &config.result_path,
        &config.export_mapping,
        &config.resource_file,
        sink,
    )?;
    sink.report(&format!(
        "Processed {} languages: {}",
        exported.len(),
        exported.join(", ")
    ));

    Ok(DownloadSummary {
        build_id,
        files_extracted,
        exported,
    })
}

/// Options of an upload run beyond the engine policy
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadOptions {
    /// Refresh the local bundles before reconciling
    pub download_first: bool,
    pub policy: RunPolicy,
}

/// Optionally refresh local bundles, then reconcile against the backend
///
/// The translate stage is skipped with a message when no Gemini token is set.
///
/// # Arguments
///
/// * `config` - Project, token and path settings of the run
/// * `options` - Whether to download first, and which engine stages run
/// * `sink` - Receives progress, warnings and the error that stopped the run
///
/// # Returns
///
/// * `Ok(SyncSummary)` - Counts of the completed work
/// * `Err(SyncError)` - The first fatal error. When the engine stops part way,
///   the work committed before the failure is reported to `sink` first.
pub async fn run_upload(
    config: &SyncConfig,
    options: UploadOptions,
    sink: Arc<dyn ProgressSink>,
) -> SyncResult<SyncSummary> {
    let mut engine = prepare_upload(config, options, sink.clone())
        .await
        .inspect_err(|e| sink.report(&format!("Error: {}", e)))?;

    // The engine reports its own fatal error; only the partial counts are added here.
    engine.run().await.inspect_err(|_| {
        let partial = engine.summary();
        sink.report(&format!(
            "Stopped early: {} keys added, {} skipped, {} translations attached, {} failed",
            partial.keys_added, partial.keys_skipped, partial.attach_succeeded, partial.attach_failed
        ));
    })
}

async fn prepare_upload(
    config: &SyncConfig,
    options: UploadOptions,
    sink: Arc<dyn ProgressSink>,
) -> SyncResult<ReconciliationEngine> {
    config.validate()?;
    let client = CrowdinClient::with_api_base(
        config.crowdin_token.clone(),
        &config.project_id,
        &config.api_base,
    )?;

    if options.download_first {
        download_steps(&client, config, sink.as_ref()).await?;
        sink.report("Downloaded latest translations");
    }

    let inputs = SyncInputs::load(config);
    tracing::info!(
        phrases = inputs.manifest.len(),
        existing = inputs.existing.len(),
        "inputs loaded"
    );

    let mut policy = options.policy;
    let generator = match config.gemini_token.as_deref() {
        Some(token) if policy.translate && !token.trim().is_empty() => Some(
            GeminiProvider::new(token.to_string(), config.gemini_model.clone())?
                .with_base_url(config.gemini_base_url.clone()),
        ),
        _ => None,
    };
    if policy.translate && generator.is_none() {
        sink.report("Warning: Gemini token not configured. Skipping AI translation.");
        policy.translate = false;
    }

    let mut engine = ReconciliationEngine::new(config, inputs, Arc::new(client), sink)
        .with_policy(policy);
    if let Some(generator) = generator {
        engine = engine.with_generator(Arc::new(generator));
    }
    Ok(engine)
}
