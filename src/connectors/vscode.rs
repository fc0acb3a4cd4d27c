//! Reader for the recently opened list kept by VS Code and its forks.
//!
//! Each editor variant keeps its state under the platform config directory:
//! - Linux: ~/.config/<variant>/User/globalStorage/
//! - macOS: ~/Library/Application Support/<variant>/User/globalStorage/
//! - Windows: %APPDATA%/<variant>/User/globalStorage/
//!
//! Two stores are read from that directory:
//!
//! - `storage.json`, used up to VS Code 1.63:
//!
//! ```json
//! {
//!   "openedPathsList": {
//!     "workspaces3": ["file:///C:/old/project"],
//!     "entries": [
//!       { "folderUri": "file:///c%3A/src/app" },
//!       { "workspace": { "configPath": "file:///c%3A/src/app.code-workspace" } },
//!       { "folderUri": "vscode-remote://ssh-remote+box/srv", "remoteAuthority": "ssh-remote+box" }
//!     ]
//!   }
//! }
//! ```
//!
//! - `state.vscdb` (1.64+), a SQLite key-value table whose
//!   `history.recentlyOpenedPathsList` row holds `{"entries": [...]}` in the
//!   same entry shape.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use serde::Deserialize;
use serde_json::Value;

use crate::connectors::builder::WorkspaceBuilder;
use crate::error::{SourceError, SourceResult};
use crate::fs_probe::FileProbe;
use crate::model::Workspace;

/// Editor variants whose state directories are scanned by default.
pub const DEFAULT_EDITOR_VARIANTS: &[&str] = &["Code", "Code - Insiders", "VSCodium", "Cursor"];

pub const STORAGE_JSON: &str = "storage.json";
pub const STATE_DB: &str = "state.vscdb";

const RECENTLY_OPENED_QUERY: &str =
    "SELECT value FROM ItemTable WHERE key LIKE 'history.recentlyOpenedPathsList'";

#[derive(Debug, Default, Deserialize)]
struct StorageFile {
    #[serde(rename = "openedPathsList")]
    opened_paths_list: Option<OpenedPathsList>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenedPathsList {
    workspaces3: Option<Vec<Value>>,
    entries: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct StorageEntries {
    entries: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkspaceEntry {
    folder_uri: Option<String>,
    remote_authority: Option<String>,
    workspace: Option<WorkspaceProperty>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkspaceProperty {
    config_path: Option<String>,
}

/// A persisted store of recently opened entries inside an editor's globalStorage.
pub trait WorkspaceStore {
    /// File name of the store inside `User/globalStorage`.
    fn file_name(&self) -> &'static str;

    fn read(&self, path: &Path, builder: &WorkspaceBuilder<'_>) -> SourceResult<Vec<Workspace>>;
}

/// `storage.json` reader.
pub struct StorageJson;

impl WorkspaceStore for StorageJson {
    fn file_name(&self) -> &'static str {
        STORAGE_JSON
    }

    fn read(&self, path: &Path, builder: &WorkspaceBuilder<'_>) -> SourceResult<Vec<Workspace>> {
        let content = fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
        parse_storage_json(&content, builder)
            .map_err(|e| SourceError::json(path.display().to_string(), e))
    }
}

/// `state.vscdb` reader. The database is opened read-only.
pub struct StateDb;

impl WorkspaceStore for StateDb {
    fn file_name(&self) -> &'static str {
        STATE_DB
    }

    fn read(&self, path: &Path, builder: &WorkspaceBuilder<'_>) -> SourceResult<Vec<Workspace>> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| SourceError::sqlite(path, e))?;

        let blob = conn
            .query_row(RECENTLY_OPENED_QUERY, [], |row| {
                Ok(match row.get_ref(0)? {
                    ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                        String::from_utf8_lossy(bytes).into_owned()
                    }
                    _ => String::new(),
                })
            })
            .optional()
            .map_err(|e| SourceError::sqlite(path, e))?;

        match blob {
            Some(blob) if !blob.trim().is_empty() => parse_entries_blob(&blob, builder)
                .map_err(|e| SourceError::json(format!("{} ItemTable value", path.display()), e)),
            _ => Ok(Vec::new()),
        }
    }
}

/// Parse a whole `storage.json` document.
///
/// The legacy `workspaces3` list comes first, then `entries`; order within
/// each list is preserved.
pub fn parse_storage_json(
    content: &str,
    builder: &WorkspaceBuilder<'_>,
) -> Result<Vec<Workspace>, serde_json::Error> {
    let file: StorageFile = serde_json::from_str(content)?;
    let Some(list) = file.opened_paths_list else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for item in list.workspaces3.iter().flatten() {
        if let Some(ws) = legacy_workspace(item, builder) {
            out.push(ws);
        }
    }
    out.extend(entries_to_workspaces(
        list.entries.as_deref().unwrap_or_default(),
        builder,
    ));
    Ok(out)
}

/// Parse the `{"entries": [...]}` value stored in `state.vscdb`.
pub fn parse_entries_blob(
    blob: &str,
    builder: &WorkspaceBuilder<'_>,
) -> Result<Vec<Workspace>, serde_json::Error> {
    let stored: StorageEntries = serde_json::from_str(blob)?;
    Ok(entries_to_workspaces(
        stored.entries.as_deref().unwrap_or_default(),
        builder,
    ))
}

/// `workspaces3` holds bare URI strings; older builds stored workspace files
/// as `{ "id": ..., "configURIPath": ... }` objects.
fn legacy_workspace(item: &Value, builder: &WorkspaceBuilder<'_>) -> Option<Workspace> {
    if let Some(uri) = item.as_str() {
        return builder.build(Some(uri), None, false);
    }
    let config = item.get("configURIPath").and_then(Value::as_str)?;
    builder.build(Some(config), None, true)
}

fn entries_to_workspaces(entries: &[Value], builder: &WorkspaceBuilder<'_>) -> Vec<Workspace> {
    entries
        .iter()
        .filter(|value| !value.is_null())
        .filter_map(|value| match WorkspaceEntry::deserialize(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed recently opened entry");
                None
            }
        })
        .filter_map(|entry| {
            let (uri, is_workspace_file) =
                match entry.workspace.and_then(|w| w.config_path) {
                    Some(config_path) => (Some(config_path), true),
                    None => (entry.folder_uri, false),
                };
            builder.build(
                uri.as_deref(),
                entry.remote_authority.as_deref(),
                is_workspace_file,
            )
        })
        .collect()
}

/// Walks the state directories of every configured editor variant.
#[derive(Debug, Clone)]
pub struct VsCodeWorkspaces {
    roots: Vec<PathBuf>,
}

impl VsCodeWorkspaces {
    /// Use explicit editor data roots (each containing `User/globalStorage`).
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Resolve `variants` against the platform config directory.
    pub fn for_variants<S: AsRef<str>>(variants: &[S]) -> SourceResult<Self> {
        let base = dirs::config_dir().ok_or(SourceError::NoDataDir("config"))?;
        Ok(Self::new(
            variants.iter().map(|v| base.join(v.as_ref())).collect(),
        ))
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn push_root(&mut self, root: PathBuf) {
        if !self.roots.contains(&root) {
            self.roots.push(root);
        }
    }

    /// Every workspace recorded under the configured roots, in root order,
    /// `storage.json` before `state.vscdb`. Duplicates are kept.
    pub fn workspaces(&self, fs: &dyn FileProbe) -> Vec<Workspace> {
        let builder = WorkspaceBuilder::new(fs);
        let stores: [&dyn WorkspaceStore; 2] = [&StorageJson, &StateDb];
        let mut results = Vec::new();

        for root in &self.roots {
            if !fs.exists(root) {
                continue;
            }
            tracing::info!(root = %root.display(), "checking editor state directory");
            let global_storage = root.join("User").join("globalStorage");

            for store in stores {
                let path = global_storage.join(store.file_name());
                if !fs.is_file(&path) {
                    continue;
                }
                match store.read(&path, &builder) {
                    Ok(found) => {
                        tracing::info!(
                            path = %path.display(),
                            count = found.len(),
                            "found workspaces"
                        );
                        results.extend(found);
                    }
                    Err(e) => {
                        tracing::error!(path = %path.display(), error = %e, "failed to read workspaces");
                    }
                }
            }
        }

        tracing::info!(count = results.len(), "total editor workspaces found");
        results
    }
}
