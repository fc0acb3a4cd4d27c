//! Turns a raw editor entry into a validated [`Workspace`].

use std::borrow::Cow;
use std::path::Path;

use crate::fs_probe::FileProbe;
use crate::model::{Workspace, WorkspaceEnvironment, WorkspaceKind, last_path_segment};
use crate::parse::{ParsedUri, classify};

/// Builds [`Workspace`] records, checking local paths against a [`FileProbe`].
///
/// Every failure is a skip: input comes from editor state files that may be
/// stale, half-written, or from a newer format.
pub struct WorkspaceBuilder<'a> {
    fs: &'a dyn FileProbe,
}

impl<'a> WorkspaceBuilder<'a> {
    pub fn new(fs: &'a dyn FileProbe) -> Self {
        Self { fs }
    }

    /// Build a workspace from a stored URI.
    ///
    /// `remote_authority`, when present, takes precedence over the URI's own
    /// authority. Returns `None` for missing URIs, unknown authority tags and
    /// local paths that no longer exist.
    pub fn build(
        &self,
        raw_uri: Option<&str>,
        remote_authority: Option<&str>,
        is_workspace_file: bool,
    ) -> Option<Workspace> {
        let raw_uri = raw_uri?;
        let decoded = percent_decode(raw_uri);
        let parsed = ParsedUri::parse(&decoded)?;

        let authority = remote_authority.unwrap_or(parsed.authority());
        let Some(class) = classify(Some(authority)) else {
            tracing::debug!(uri = raw_uri, authority, "skipping workspace with unknown authority");
            return None;
        };

        let path = match class.environment {
            WorkspaceEnvironment::Local => strip_drive_prefix(parsed.path()),
            _ => parsed.path(),
        };

        if !self.path_exists(path, class.environment) {
            tracing::debug!(uri = raw_uri, path, "skipping workspace whose path is gone");
            return None;
        }

        Some(Workspace {
            uri: raw_uri.to_string(),
            relative_path: path.to_string(),
            folder_name: folder_name(path),
            extra_info: class.machine,
            environment: class.environment,
            kind: if is_workspace_file {
                WorkspaceKind::WorkspaceFile
            } else {
                WorkspaceKind::ProjectFolder
            },
        })
    }

    /// Only local paths can be verified; remote ones (WSL included) are assumed present.
    fn path_exists(&self, path: &str, environment: WorkspaceEnvironment) -> bool {
        match environment {
            WorkspaceEnvironment::Local => self.fs.exists(Path::new(path)),
            _ => true,
        }
    }
}

fn percent_decode(raw: &str) -> Cow<'_, str> {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded,
        // Escapes that decode to invalid UTF-8 are kept lossily rather than dropping the entry.
        Err(_) => Cow::Owned(
            String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned(),
        ),
    }
}

/// Local URIs carry a `/` in front of the drive letter (`/C:/repo`).
fn strip_drive_prefix(path: &str) -> &str {
    match path.strip_prefix('/') {
        Some(rest) if starts_with_drive(rest) => rest,
        _ => path,
    }
}

fn starts_with_drive(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn folder_name(path: &str) -> String {
    let final_segment = path.rsplit(['/', '\\']).next().unwrap_or_default();
    let is_bare_drive = final_segment.len() == 2 && starts_with_drive(final_segment);
    if !final_segment.is_empty() && !is_bare_drive {
        return final_segment.to_string();
    }

    // Root-like paths such as `C:/` fall back to the drive letter.
    let name = last_path_segment(path).trim_end_matches(':');
    if name.is_empty() {
        path.to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::collections::HashSet;

    struct KnownPaths(HashSet<&'static str>);

    impl FileProbe for KnownPaths {
        fn exists(&self, path: &Path) -> bool {
            path.to_str().is_some_and(|p| self.0.contains(p))
        }

        fn is_file(&self, _path: &Path) -> bool {
            false
        }

        fn last_accessed(&self, _path: &Path) -> Option<DateTime<Utc>> {
            None
        }
    }

    fn probe(paths: &[&'static str]) -> KnownPaths {
        KnownPaths(paths.iter().copied().collect())
    }

    #[test]
    fn local_drive_uri_becomes_project_folder() {
        let fs = probe(&["C:/repo"]);
        let ws = WorkspaceBuilder::new(&fs)
            .build(Some("file:///C:/repo"), None, false)
            .unwrap();
        assert_eq!(ws.environment, WorkspaceEnvironment::Local);
        assert_eq!(ws.relative_path, "C:/repo");
        assert_eq!(ws.folder_name, "repo");
        assert_eq!(ws.kind, WorkspaceKind::ProjectFolder);
        assert_eq!(ws.extra_info, None);
        assert_eq!(ws.uri, "file:///C:/repo");
    }

    #[test]
    fn missing_local_path_is_skipped() {
        let fs = probe(&[]);
        assert!(
            WorkspaceBuilder::new(&fs)
                .build(Some("file:///C:/repo"), None, false)
                .is_none()
        );
    }

    #[test]
    fn wsl_path_bypasses_existence_check() {
        let fs = probe(&[]);
        let ws = WorkspaceBuilder::new(&fs)
            .build(Some("vscode-remote://wsl+Ubuntu/home/u/proj"), None, false)
            .unwrap();
        assert_eq!(ws.environment, WorkspaceEnvironment::RemoteWSL);
        assert_eq!(ws.extra_info.as_deref(), Some("Ubuntu"));
        assert_eq!(ws.relative_path, "/home/u/proj");
        assert_eq!(ws.folder_name, "proj");
    }

    #[test]
    fn percent_escapes_are_decoded_before_parsing() {
        let fs = probe(&["c:/My Projects/app"]);
        let ws = WorkspaceBuilder::new(&fs)
            .build(Some("file:///c%3A/My%20Projects/app"), None, false)
            .unwrap();
        assert_eq!(ws.relative_path, "c:/My Projects/app");
        assert_eq!(ws.folder_name, "app");
        assert_eq!(ws.uri, "file:///c%3A/My%20Projects/app");

        let remote = WorkspaceBuilder::new(&fs)
            .build(Some("vscode-remote://ssh-remote%2Bbox/srv"), None, false)
            .unwrap();
        assert_eq!(remote.environment, WorkspaceEnvironment::RemoteSSH);
        assert_eq!(remote.extra_info.as_deref(), Some("box"));
    }

    #[test]
    fn explicit_remote_authority_wins() {
        let fs = probe(&[]);
        let ws = WorkspaceBuilder::new(&fs)
            .build(
                Some("vscode-remote://ignored/work/app.code-workspace"),
                Some("dev-container+abc123"),
                true,
            )
            .unwrap();
        assert_eq!(ws.environment, WorkspaceEnvironment::DevContainer);
        assert_eq!(ws.extra_info.as_deref(), Some("abc123"));
        assert_eq!(ws.kind, WorkspaceKind::WorkspaceFile);
        assert_eq!(ws.folder_name, "app.code-workspace");
    }

    #[test]
    fn unknown_authority_and_missing_uri_are_skipped() {
        let fs = probe(&[]);
        let builder = WorkspaceBuilder::new(&fs);
        assert!(builder.build(None, None, false).is_none());
        assert!(
            builder
                .build(Some("vscode-remote://attached-container+1/x"), None, false)
                .is_none()
        );
    }

    #[test]
    fn posix_local_path_keeps_leading_slash() {
        let fs = probe(&["/home/u/repo"]);
        let ws = WorkspaceBuilder::new(&fs)
            .build(Some("file:///home/u/repo"), None, false)
            .unwrap();
        assert_eq!(ws.relative_path, "/home/u/repo");
        assert_eq!(ws.folder_name, "repo");
    }

    #[test]
    fn drive_root_falls_back_to_drive_letter() {
        assert_eq!(folder_name("C:/"), "C");
        assert_eq!(folder_name("D:"), "D");
        assert_eq!(folder_name(r"C:\src\app\"), "app");
        assert_eq!(folder_name("/"), "/");
    }

    #[test]
    fn garbage_input_does_not_panic() {
        let fs = probe(&[]);
        let builder = WorkspaceBuilder::new(&fs);
        for raw in ["", "%", "%zz", "%ff%fe", "file://", "::::", "\u{0}"] {
            let _ = builder.build(Some(raw), None, false);
        }
    }
}
