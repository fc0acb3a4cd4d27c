//! Classification of editor remote authorities.
//!
//! Remote workspaces carry an authority of the form `<tag>+<machine>`, e.g.
//! `ssh-remote+build-box` or `wsl+Ubuntu`. Only the tags listed in
//! [`ENVIRONMENT_TAGS`] are recognized; anything else is discarded by callers.

use crate::model::WorkspaceEnvironment;

/// Authority tag -> environment. The empty tag is a plain local path.
pub const ENVIRONMENT_TAGS: &[(&str, WorkspaceEnvironment)] = &[
    ("", WorkspaceEnvironment::Local),
    ("ssh-remote", WorkspaceEnvironment::RemoteSSH),
    ("wsl", WorkspaceEnvironment::RemoteWSL),
    ("vsonline", WorkspaceEnvironment::Codespaces),
    ("dev-container", WorkspaceEnvironment::DevContainer),
    ("tunnel", WorkspaceEnvironment::RemoteTunnel),
];

/// Result of classifying an authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub environment: WorkspaceEnvironment,
    pub machine: Option<String>,
}

/// Classify `authority` into an environment and optional machine label.
///
/// `None` means the tag is not one we know how to handle.
pub fn classify(authority: Option<&str>) -> Option<Classification> {
    let authority = authority.unwrap_or_default();
    let tag = remote_name(authority);
    let environment = ENVIRONMENT_TAGS
        .iter()
        .find(|(known, _)| *known == tag)
        .map(|(_, env)| *env)?;
    let machine = (tag.len() < authority.len()).then(|| authority[tag.len() + 1..].to_string());
    Some(Classification {
        environment,
        machine,
    })
}

fn remote_name(authority: &str) -> &str {
    match authority.split_once('+') {
        Some((tag, _)) => tag,
        None => authority,
    }
}
