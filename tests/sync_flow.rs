//! Integration test for the local-to-remote diff pipeline
//!
//! Builds a workspace on disk plus a "downloaded bundle" remote inventory,
//! and verifies the merged diff model drives the pull request plan.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use langsync::models::{ChangeType, FileEntry, FileOperation, PullRequestFile, PullRequestRequest};
use langsync::services::{archive, entry_comparer, scanner, CancellationToken, ScanOptions};
use tempfile::TempDir;

fn write_file(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    std::fs::write(path, content).expect("write file");
}

fn bundle(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in files {
        writer.start_file(*name, options).expect("start zip entry");
        writer.write_all(content).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

#[tokio::test]
async fn test_scan_merge_and_plan_roundtrip() {
    let dir = TempDir::new().expect("temp dir");
    write_file(dir.path(), "de/app.resx", "hallo welt"); // modified remotely
    write_file(dir.path(), "fr/app.resx", "bonjour"); // unchanged
    write_file(dir.path(), "es/app.resx", "hola"); // local only

    let local = scanner::scan_workspace(
        dir.path(),
        &ScanOptions::default(),
        &CancellationToken::new(),
    )
    .await
    .expect("scan workspace");

    let remote_zip = bundle(&[
        ("de/app.resx", b"hallo"),
        ("fr/app.resx", b"bonjour"),
        ("it/app.resx", b"ciao"),
    ]);
    let remote = archive::entries_from_zip(&remote_zip).expect("remote inventory");

    let merged = entry_comparer::merge(local, remote);

    // Union coverage: every path appears exactly once, in order
    let mut paths: Vec<&str> = merged.iter().map(|e| e.path.as_str()).collect();
    let total = paths.len();
    paths.dedup();
    assert_eq!(paths.len(), total);

    let by_path: HashMap<&str, &FileEntry> =
        merged.iter().map(|e| (e.path.as_str(), e)).collect();
    assert_eq!(by_path["de/app.resx"].change_type, ChangeType::Modified);
    assert_eq!(by_path["fr/app.resx"].change_type, ChangeType::Unchanged);
    assert_eq!(by_path["es/app.resx"].change_type, ChangeType::LocalOnly);
    assert_eq!(by_path["it/app.resx"].change_type, ChangeType::RepoOnly);

    // The unchanged file carries the same identity on both sides
    assert_eq!(
        by_path["fr/app.resx"].local_sha,
        by_path["fr/app.resx"].repo_sha
    );

    let plan = entry_comparer::plan_commit_files(&merged, dir.path());
    let operations: HashMap<&str, FileOperation> = plan
        .iter()
        .map(|c| (c.repo_path.as_str(), c.operation))
        .collect();
    assert_eq!(plan.len(), 3);
    assert_eq!(operations["de/app.resx"], FileOperation::Upsert);
    assert_eq!(operations["es/app.resx"], FileOperation::Upsert);
    assert_eq!(operations["it/app.resx"], FileOperation::Delete);

    // Assemble the pull request payload from the plan
    let files: Vec<PullRequestFile> = plan
        .iter()
        .map(|commit| match commit.operation {
            FileOperation::Upsert => {
                let bytes = std::fs::read(&commit.local_path).expect("read local file");
                PullRequestFile::upsert(&commit.repo_path, &bytes)
            }
            FileOperation::Delete => PullRequestFile::delete(&commit.repo_path),
        })
        .collect();

    let request = PullRequestRequest {
        branch_name: "sync/translations".to_string(),
        commit_message: "Sync translation files".to_string(),
        title: "Sync translation files".to_string(),
        body: None,
        files,
    };

    let upserts = request
        .files
        .iter()
        .filter(|f| f.operation == FileOperation::Upsert)
        .count();
    assert_eq!(upserts, 2);
    assert!(request
        .files
        .iter()
        .filter(|f| f.operation == FileOperation::Upsert)
        .all(|f| f.content.is_some()));
    assert!(request
        .files
        .iter()
        .filter(|f| f.operation == FileOperation::Delete)
        .all(|f| f.content.is_none()));
}

#[tokio::test]
async fn test_tree_view_matches_flat_inventory() {
    let dir = TempDir::new().expect("temp dir");
    write_file(dir.path(), "locales/de/app.resx", "hallo");
    write_file(dir.path(), "locales/de/errors.resx", "fehler");
    write_file(dir.path(), "readme.md", "# translations");

    let entries = scanner::scan_workspace(
        dir.path(),
        &ScanOptions::default(),
        &CancellationToken::new(),
    )
    .await
    .expect("scan workspace");

    let tree = entry_comparer::build_tree(&entries);
    assert_eq!(tree.len(), 2);

    let locales = tree.iter().find(|n| n.name == "locales").expect("locales");
    assert!(locales.is_directory);
    let de = locales.children.first().expect("de");
    assert_eq!(de.children.len(), 2);
    assert_eq!(de.children[0].path, "locales/de/app.resx");
}
