//! Downloaded archive handling and JS bundle export
//!
//! A backend build is a ZIP with one folder per backend language, each holding
//! the flat JSON resource file. `extract_archive` unpacks it over the data
//! directory and `export_js_bundles` rewrites the JSON files as script bundles
//! that register themselves on the page-global `Radar.i18n` namespace.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::error::{SyncError, SyncResult};
use crate::sink::{ProgressSink, Stage};

const BUNDLE_INDENT: &[u8] = b"        ";

/// Replace `target` with the contents of the archive at `zip_path`
///
/// Entry names are sanitized so nothing is written outside `target`.
/// Returns the number of files written.
pub fn extract_archive(zip_path: &Path, target: &Path, sink: &dyn ProgressSink) -> SyncResult<usize> {
    let zip_file = File::open(zip_path).map_err(|e| SyncError::io(zip_path, e))?;
    let mut archive = zip::ZipArchive::new(zip_file)?;

    match fs::remove_dir_all(target) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(SyncError::io(target, e)),
    }
    fs::create_dir_all(target).map_err(|e| SyncError::io(target, e))?;

    let total = archive.len();
    let mut file_count = 0;
    for i in 0..total {
        let mut entry = archive.by_index(i)?;
        let outpath = target.join(entry.mangled_name());

        if entry.is_dir() {
            fs::create_dir_all(&outpath).map_err(|e| SyncError::io(&outpath, e))?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;
            }
            let mut outfile = File::create(&outpath).map_err(|e| SyncError::io(&outpath, e))?;
            io::copy(&mut entry, &mut outfile).map_err(|e| SyncError::io(&outpath, e))?;
            file_count += 1;
        }
        sink.report_progress(Stage::Extract, i + 1, total);
    }

    tracing::info!("Extracted {} files to {}", file_count, target.display());
    Ok(file_count)
}

/// Wrap a resource bundle in its `Radar.i18n` registration script
pub fn render_js_bundle(stem: &str, bundle: &Value) -> SyncResult<String> {
    let mut json = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut json, PrettyFormatter::with_indent(BUNDLE_INDENT));
    bundle.serialize(&mut serializer)?;
    let json = String::from_utf8_lossy(&json);

    Ok(format!(
        "(function (Radar) {{\n    Radar.i18n = Radar.i18n || {{}};\n    // 自訂 Resource\n    Radar.i18n['{}'] = {};\n}}(Radar || {{}}));",
        stem, json
    ))
}

fn resource_stem(resource_file: &str) -> &str {
    Path::new(resource_file)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(resource_file)
}

/// Write `<result>/<output>/<stem>.js` for every `(output, bundle)` pair of
/// `mapping` whose `<data>/<bundle>/<resource_file>` exists
///
/// Returns the output folders that were written, in mapping order.
pub fn export_js_bundles(
    data_path: &Path,
    result_path: &Path,
    mapping: &[(String, String)],
    resource_file: &str,
    sink: &dyn ProgressSink,
) -> SyncResult<Vec<String>> {
    let stem = resource_stem(resource_file);
    let total = mapping.len();
    let mut processed = Vec::new();

    for (idx, (output_folder, bundle_folder)) in mapping.iter().enumerate() {
        sink.report_progress(Stage::Export, idx + 1, total);

        let input = data_path.join(bundle_folder).join(resource_file);
        let content = match fs::read_to_string(&input) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No bundle at {}", input.display());
                continue;
            }
            Err(e) => return Err(SyncError::io(&input, e)),
        };
        let bundle: Value = serde_json::from_str(&content)?;

        let output_dir = result_path.join(output_folder);
        fs::create_dir_all(&output_dir).map_err(|e| SyncError::io(&output_dir, e))?;
        let output: PathBuf = output_dir.join(format!("{}.js", stem));
        fs::write(&output, render_js_bundle(stem, &bundle)?)
            .map_err(|e| SyncError::io(&output, e))?;

        sink.report(&format!("Processed {}", output_folder));
        processed.push(output_folder.clone());
    }

    Ok(processed)
}

/// Problems that would make an export produce nothing. Empty when fine.
pub fn validate_paths(data_path: &Path, mapping: &[(String, String)], resource_file: &str) -> Vec<String> {
    if !data_path.exists() {
        return vec![format!("Data path does not exist: {}", data_path.display())];
    }

    let found_language = mapping
        .iter()
        .any(|(_, bundle_folder)| data_path.join(bundle_folder).join(resource_file).exists());
    if found_language {
        Vec::new()
    } else {
        vec!["No language files found in data path".to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    fn write_zip(path: &Path, files: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, content) in files {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn mapping(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn test_extract_replaces_target_directory() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("build.zip");
        write_zip(
            &zip_path,
            &[
                ("en/CommonResource.json", r#"{"__a":"A"}"#),
                ("zh-TW/CommonResource.json", r#"{"__a":"甲"}"#),
            ],
        );

        let target = dir.path().join("data");
        fs::create_dir_all(target.join("stale")).unwrap();
        fs::write(target.join("stale/old.json"), "{}").unwrap();

        let sink = MemorySink::new();
        let count = extract_archive(&zip_path, &target, &sink).unwrap();

        assert_eq!(count, 2);
        assert!(!target.join("stale").exists());
        assert_eq!(
            fs::read_to_string(target.join("zh-TW/CommonResource.json")).unwrap(),
            r#"{"__a":"甲"}"#
        );
        assert_eq!(sink.progress_for(Stage::Extract), vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn test_extract_rejects_non_zip() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("build.zip");
        fs::write(&zip_path, "not a zip").unwrap();

        let err = extract_archive(&zip_path, &dir.path().join("data"), &MemorySink::new()).unwrap_err();
        assert!(matches!(err, SyncError::Archive(_)));
    }

    #[test]
    fn test_render_js_bundle() {
        let bundle: Value = serde_json::from_str(r#"{"__b":"乙","__a":"甲"}"#).unwrap();
        let script = render_js_bundle("CommonResource", &bundle).unwrap();

        assert!(script.starts_with("(function (Radar) {\n    Radar.i18n = Radar.i18n || {};\n"));
        assert!(script.contains("Radar.i18n['CommonResource'] = {\n        \"__b\": \"乙\",\n        \"__a\": \"甲\"\n};"));
        assert!(script.ends_with(";\n}(Radar || {}));"));
    }

    #[test]
    fn test_export_skips_missing_bundles() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        let result = dir.path().join("result");
        fs::create_dir_all(data.join("en")).unwrap();
        fs::write(data.join("en/CommonResource.json"), r#"{"__a":"A"}"#).unwrap();

        let sink = MemorySink::new();
        let processed = export_js_bundles(
            &data,
            &result,
            &mapping(&[("en-us", "en"), ("ja-jp", "ja")]),
            "CommonResource.json",
            &sink,
        )
        .unwrap();

        assert_eq!(processed, vec!["en-us"]);
        let script = fs::read_to_string(result.join("en-us/CommonResource.js")).unwrap();
        assert!(script.contains("Radar.i18n['CommonResource']"));
        assert!(!result.join("ja-jp").exists());
        assert_eq!(sink.progress_for(Stage::Export), vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn test_validate_paths() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        let pairs = mapping(&[("native", "zh-TW")]);

        let issues = validate_paths(&data, &pairs, "CommonResource.json");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].starts_with("Data path does not exist"));

        fs::create_dir_all(data.join("zh-TW")).unwrap();
        assert_eq!(
            validate_paths(&data, &pairs, "CommonResource.json"),
            vec!["No language files found in data path"]
        );

        fs::write(data.join("zh-TW/CommonResource.json"), "{}").unwrap();
        assert!(validate_paths(&data, &pairs, "CommonResource.json").is_empty());
    }
}
