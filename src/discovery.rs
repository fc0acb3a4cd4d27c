//! The discovery pass: native IDE instances plus editor workspaces, merged
//! into one sorted list of code containers.
//!
//! A pass never fails as a whole. Each source logs its own errors and
//! contributes nothing, so an empty result means either "nothing installed"
//! or "every source failed"; the log tells which.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::Duration;

use crate::config::DiscoveryConfig;
use crate::connectors::visual_studio::{
    DescriptorSource, SettingsResolver, VisualStudioDataDir, VsWhere, discover_instances,
};
use crate::connectors::vscode::VsCodeWorkspaces;
use crate::fs_probe::{FileProbe, LocalFs};
use crate::instances::{EditorProjectInstance, NativeInstance};
use crate::model::{CodeContainer, Workspace, WorkspaceEnvironment};

/// Holds the instances found by the most recent pass.
///
/// Passes take `&mut self`, so two passes over one service cannot overlap.
pub struct DiscoveryService {
    fs: Box<dyn FileProbe>,
    descriptors: Box<dyn DescriptorSource>,
    resolver: Option<Box<dyn SettingsResolver>>,
    editors: VsCodeWorkspaces,
    instances: Vec<NativeInstance>,
    workspaces: Vec<Workspace>,
}

impl DiscoveryService {
    pub fn new(
        fs: Box<dyn FileProbe>,
        descriptors: Box<dyn DescriptorSource>,
        resolver: Option<Box<dyn SettingsResolver>>,
        editors: VsCodeWorkspaces,
    ) -> Self {
        Self {
            fs,
            descriptors,
            resolver,
            editors,
            instances: Vec::new(),
            workspaces: Vec::new(),
        }
    }

    /// Wire the real filesystem, `vswhere` and the platform data directories.
    pub fn from_config(config: &DiscoveryConfig) -> Self {
        let mut editors = match VsCodeWorkspaces::for_variants(config.editor_variants.as_slice()) {
            Ok(editors) => editors,
            Err(e) => {
                tracing::error!(error = %e, "cannot locate editor state directories");
                VsCodeWorkspaces::new(Vec::new())
            }
        };
        for root in &config.extra_editor_roots {
            editors.push_root(root.clone());
        }

        let resolver: Option<Box<dyn SettingsResolver>> = match VisualStudioDataDir::from_env() {
            Ok(dir) => Some(Box::new(dir)),
            Err(e) => {
                tracing::error!(error = %e, "cannot locate Visual Studio data directory");
                None
            }
        };

        Self::new(
            Box::new(LocalFs),
            Box::new(VsWhere::new(Duration::from_secs(config.vswhere_timeout_secs))),
            resolver,
            editors,
        )
    }

    pub fn instances(&self) -> &[NativeInstance] {
        &self.instances
    }

    /// Every workspace read in the last pass, all environments, duplicates included.
    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    /// Run a full pass and return the sorted containers.
    pub fn discover(
        &mut self,
        excluded_versions: &HashSet<String>,
        show_prerelease: bool,
    ) -> Vec<CodeContainer> {
        self.init_instances(excluded_versions);
        self.results(show_prerelease)
    }

    /// Replace the held instances with a fresh discovery.
    pub fn init_instances(&mut self, excluded_versions: &HashSet<String>) {
        self.instances.clear();
        self.workspaces.clear();

        self.discover_native_instances(excluded_versions);
        self.discover_editor_projects();
    }

    /// Containers of the held instances, sorted by name then prerelease flag.
    pub fn results(&self, show_prerelease: bool) -> Vec<CodeContainer> {
        let mut containers: Vec<CodeContainer> = self
            .instances
            .iter()
            .filter(|i| show_prerelease || !i.is_prerelease())
            .flat_map(|i| i.containers(self.fs.as_ref()))
            .collect();
        containers.sort_by(|a, b| {
            compare_names(&a.name, &b.name)
                .then(a.instance.is_prerelease.cmp(&b.instance.is_prerelease))
        });
        containers
    }

    fn discover_native_instances(&mut self, excluded_versions: &HashSet<String>) {
        let Some(resolver) = self.resolver.as_deref() else {
            return;
        };
        let found = discover_instances(self.descriptors.as_ref(), resolver, excluded_versions);
        tracing::info!(count = found.len(), "native instances discovered");
        self.instances
            .extend(found.into_iter().map(|r| NativeInstance::VisualStudio(r.into())));
    }

    /// Re-read editor workspaces without touching the held instances.
    pub fn scan_workspaces(&mut self) -> &[Workspace] {
        self.workspaces = self.editors.workspaces(self.fs.as_ref());
        &self.workspaces
    }

    fn discover_editor_projects(&mut self) {
        self.scan_workspaces();
        let paths = local_project_paths(&self.workspaces);
        for (path, workspace) in &paths {
            tracing::debug!(path = %path, folder = %workspace.folder_name, "added editor workspace");
        }
        tracing::info!(count = paths.len(), "editor projects discovered");
        self.instances.extend(
            paths
                .into_iter()
                .map(|(path, _)| NativeInstance::EditorProject(EditorProjectInstance::new(path))),
        );
    }
}

/// Local workspaces deduplicated case-insensitively by path, first occurrence wins.
pub fn local_project_paths(workspaces: &[Workspace]) -> Vec<(String, &Workspace)> {
    let mut seen = HashSet::new();
    workspaces
        .iter()
        .filter(|w| w.environment == WorkspaceEnvironment::Local)
        .filter(|w| seen.insert(w.relative_path.to_lowercase()))
        .map(|w| (w.relative_path.clone(), w))
        .collect()
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
