//! Merging local and remote file inventories into a unified diff model

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::models::{ChangeType, CommitFile, EntryNode, FileEntry, FileOperation};

/// Merge a local and a remote inventory into a single path-keyed collection.
///
/// The remote inventory seeds the map; local entries either annotate an
/// existing path with its local SHA or are inserted as new records. Every
/// path present in either input appears exactly once in the output, sorted
/// by path.
pub fn merge(local_entries: Vec<FileEntry>, repo_entries: Vec<FileEntry>) -> Vec<FileEntry> {
    let mut merged: BTreeMap<String, FileEntry> = BTreeMap::new();

    for entry in repo_entries {
        merged.insert(entry.path.clone(), entry);
    }

    for entry in local_entries {
        match merged.get_mut(&entry.path) {
            Some(existing) => {
                existing.local_sha = entry.local_sha;
                existing.is_directory = existing.is_directory || entry.is_directory;
            }
            None => {
                merged.insert(entry.path.clone(), entry);
            }
        }
    }

    let mut result: Vec<FileEntry> = merged.into_values().collect();
    for entry in &mut result {
        entry.refresh_change_type();
    }
    result
}

/// Plan the pull request file operations for a merged entry set.
///
/// Files that exist only remotely become deletes; every other changed file
/// becomes an upsert. Directories and unchanged files produce nothing.
pub fn plan_commit_files(entries: &[FileEntry], workspace_root: &Path) -> Vec<CommitFile> {
    entries
        .iter()
        .filter(|entry| !entry.is_directory && entry.change_type != ChangeType::Unchanged)
        .map(|entry| {
            let operation = match entry.change_type {
                ChangeType::RepoOnly => FileOperation::Delete,
                _ => FileOperation::Upsert,
            };
            CommitFile {
                operation,
                local_path: workspace_root
                    .join(&entry.path)
                    .to_string_lossy()
                    .into_owned(),
                repo_path: entry.path.clone(),
            }
        })
        .collect()
}

/// Derive the display tree from the flat entry set.
///
/// Intermediate directories that exist only as path prefixes are synthesized
/// with no change type; children are ordered by name.
pub fn build_tree(entries: &[FileEntry]) -> Vec<EntryNode> {
    let by_path: BTreeMap<&str, &FileEntry> = entries
        .iter()
        .map(|entry| (entry.path.as_str(), entry))
        .collect();

    // parent path -> child paths; "" is the virtual root
    let mut children: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for entry in entries {
        let mut parent = String::new();
        let mut prefix = String::new();
        for segment in entry.path.split('/').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            children
                .entry(parent.clone())
                .or_default()
                .insert(prefix.clone());
            parent = prefix.clone();
        }
    }

    build_nodes("", &children, &by_path)
}

fn build_nodes(
    parent: &str,
    children: &BTreeMap<String, BTreeSet<String>>,
    by_path: &BTreeMap<&str, &FileEntry>,
) -> Vec<EntryNode> {
    let Some(child_paths) = children.get(parent) else {
        return Vec::new();
    };

    child_paths
        .iter()
        .map(|path| {
            let nested = build_nodes(path, children, by_path);
            let entry = by_path.get(path.as_str());
            let name = path
                .rsplit('/')
                .next()
                .unwrap_or(path.as_str())
                .to_string();
            EntryNode {
                name,
                path: path.clone(),
                is_directory: entry.map(|e| e.is_directory).unwrap_or(false) || !nested.is_empty(),
                change_type: entry.map(|e| e.change_type),
                children: nested,
            }
        })
        .collect()
}
