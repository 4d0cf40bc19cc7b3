//! Local media browser
//!
//! Lists one directory level below the configured media root. Hidden files
//! are skipped and paths may never leave the root.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Dir,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaEntry {
    pub name: String,
    /// Path relative to the media root, `/`-separated
    pub path: String,
    pub kind: EntryKind,
    /// Size in bytes; 0 for directories
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaListing {
    pub path: String,
    pub entries: Vec<MediaEntry>,
}

/// Resolve `sub_path` below `root`, rejecting anything that could escape it
pub fn resolve_path(root: &Path, sub_path: &str) -> Result<PathBuf> {
    let relative = Path::new(sub_path.trim_start_matches("./"));
    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::InvalidPath(sub_path.to_string()));
            }
        }
    }
    Ok(resolved)
}

/// List the entries of `sub_path`: directories first, then files, each
/// sorted by name ignoring case
pub fn list_media(root: &Path, sub_path: &str) -> Result<MediaListing> {
    let dir = resolve_path(root, sub_path)?;
    if !dir.is_dir() {
        return Err(Error::NotFound(format!("media directory '{}'", sub_path)));
    }

    // symlinks must not lead outside the root either
    let canonical_root = root.canonicalize()?;
    let canonical_dir = dir.canonicalize()?;
    if !canonical_dir.starts_with(&canonical_root) {
        return Err(Error::InvalidPath(sub_path.to_string()));
    }

    let walker = WalkBuilder::new(&dir)
        .standard_filters(false)
        .hidden(true)
        .max_depth(Some(1))
        .build();

    let mut entries = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable media entry: {}", e);
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("No metadata for {}: {}", entry.path().display(), e);
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().to_string();
        let kind = if metadata.is_dir() { EntryKind::Dir } else { EntryKind::File };
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        entries.push(MediaEntry {
            path: to_url_path(relative),
            name,
            kind,
            size: if kind == EntryKind::File { metadata.len() } else { 0 },
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        });
    }

    entries.sort_by(compare_entries);
    tracing::debug!("Listed {} media entries in '{}'", entries.len(), sub_path);

    Ok(MediaListing {
        path: to_url_path(dir.strip_prefix(root).unwrap_or(Path::new(""))),
        entries,
    })
}

fn compare_entries(a: &MediaEntry, b: &MediaEntry) -> Ordering {
    match (a.kind, b.kind) {
        (EntryKind::Dir, EntryKind::File) => Ordering::Less,
        (EntryKind::File, EntryKind::Dir) => Ordering::Greater,
        _ => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
    }
}

fn to_url_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
