//! Normalized entity structs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Execution context an editor recorded a workspace under.
///
/// Closed set driven by the authority-tag table in
/// [`crate::parse::authority`]; unrecognized tags never produce a value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WorkspaceEnvironment {
    Local,
    Codespaces,
    RemoteWSL,
    RemoteSSH,
    DevContainer,
    RemoteTunnel,
}

impl WorkspaceEnvironment {
    /// Short label shown next to a workspace in listings.
    pub fn label(self) -> &'static str {
        match self {
            WorkspaceEnvironment::Local => "Local",
            WorkspaceEnvironment::Codespaces => "Codespaces",
            WorkspaceEnvironment::RemoteSSH => "SSH",
            WorkspaceEnvironment::RemoteWSL => "WSL",
            WorkspaceEnvironment::DevContainer => "DevContainer",
            WorkspaceEnvironment::RemoteTunnel => "Tunnel",
        }
    }
}

impl std::fmt::Display for WorkspaceEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WorkspaceKind {
    ProjectFolder,
    WorkspaceFile,
}

/// A recently opened folder or `.code-workspace` file recorded by an editor.
///
/// Only produced by [`crate::connectors::builder::WorkspaceBuilder`], after
/// the existence gate for local paths has passed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workspace {
    /// URI exactly as the editor stored it.
    pub uri: String,
    pub relative_path: String,
    pub folder_name: String,
    /// Machine or host label taken from the authority (`ssh-remote+host` -> `host`).
    pub extra_info: Option<String>,
    pub environment: WorkspaceEnvironment,
    pub kind: WorkspaceKind,
}

/// Identity of the instance that owns a [`CodeContainer`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceSummary {
    pub display_name: String,
    pub is_prerelease: bool,
    /// Empty for installed IDE instances, which are not tied to one environment.
    pub environment_label: String,
}

/// A UI-facing entry: one validated filesystem target plus its owning instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeContainer {
    pub name: String,
    pub key: String,
    pub full_path: String,
    pub is_favorite: bool,
    pub last_accessed: Option<DateTime<Utc>>,
    pub instance: InstanceSummary,
}

/// Last segment of a path that may use either `/` or `\` separators.
///
/// Trailing separators are ignored, so `C:\repo\` yields `repo`.
pub fn last_path_segment(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    match trimmed.rfind(['/', '\\']) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}
