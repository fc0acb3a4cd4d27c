//! Owners of code containers: installed IDE instances and single editor projects.

use std::path::{Path, PathBuf};

use crate::connectors::visual_studio::{ResolvedInstance, read_code_containers};
use crate::fs_probe::FileProbe;
use crate::model::{CodeContainer, InstanceSummary, WorkspaceEnvironment, last_path_segment};

pub const EDITOR_PROJECT_DISPLAY_NAME: &str = "VS Code Project";

/// An installed Visual Studio instance backed by its settings document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualStudioInstance {
    pub instance_id: String,
    pub product_path: String,
    pub display_name: String,
    pub is_prerelease: bool,
    pub settings_path: PathBuf,
}

impl From<ResolvedInstance> for VisualStudioInstance {
    fn from(resolved: ResolvedInstance) -> Self {
        let d = resolved.descriptor;
        Self {
            instance_id: d.instance_id,
            product_path: d.product_path,
            display_name: d.display_name,
            is_prerelease: d.is_prerelease,
            settings_path: resolved.settings_path,
        }
    }
}

/// One local folder or workspace file recorded by a VS Code family editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorProjectInstance {
    pub project_path: String,
}

impl EditorProjectInstance {
    pub fn new(project_path: impl Into<String>) -> Self {
        Self {
            project_path: project_path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeInstance {
    VisualStudio(VisualStudioInstance),
    EditorProject(EditorProjectInstance),
}

impl NativeInstance {
    pub fn display_name(&self) -> &str {
        match self {
            NativeInstance::VisualStudio(vs) => &vs.display_name,
            NativeInstance::EditorProject(_) => EDITOR_PROJECT_DISPLAY_NAME,
        }
    }

    pub fn is_prerelease(&self) -> bool {
        match self {
            NativeInstance::VisualStudio(vs) => vs.is_prerelease,
            NativeInstance::EditorProject(_) => false,
        }
    }

    pub fn summary(&self) -> InstanceSummary {
        InstanceSummary {
            display_name: self.display_name().to_string(),
            is_prerelease: self.is_prerelease(),
            environment_label: match self {
                NativeInstance::VisualStudio(_) => String::new(),
                NativeInstance::EditorProject(_) => WorkspaceEnvironment::Local.label().to_string(),
            },
        }
    }

    /// Containers owned by this instance. Calling twice re-reads the backing data.
    pub fn containers(&self, fs: &dyn FileProbe) -> Vec<CodeContainer> {
        match self {
            NativeInstance::VisualStudio(vs) => self.stored_containers(vs, fs),
            NativeInstance::EditorProject(project) => vec![self.project_container(project, fs)],
        }
    }

    fn stored_containers(&self, vs: &VisualStudioInstance, fs: &dyn FileProbe) -> Vec<CodeContainer> {
        let stored = match read_code_containers(&vs.settings_path) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(
                    instance_id = %vs.instance_id,
                    path = %vs.settings_path.display(),
                    error = %e,
                    "failed to read code containers"
                );
                return Vec::new();
            }
        };

        let summary = self.summary();
        stored
            .into_iter()
            .filter(|c| fs.exists(Path::new(&c.value.local_properties.full_path)))
            .map(|c| {
                let full_path = c.value.local_properties.full_path;
                CodeContainer {
                    name: container_name(&full_path),
                    key: c.key,
                    full_path,
                    is_favorite: c.value.is_favorite,
                    last_accessed: c.value.last_accessed,
                    instance: summary.clone(),
                }
            })
            .collect()
    }

    fn project_container(&self, project: &EditorProjectInstance, fs: &dyn FileProbe) -> CodeContainer {
        let path = &project.project_path;
        CodeContainer {
            name: container_name(path),
            key: path.clone(),
            full_path: path.clone(),
            is_favorite: false,
            last_accessed: fs.last_accessed(Path::new(path)),
            instance: self.summary(),
        }
    }
}

fn container_name(full_path: &str) -> String {
    match last_path_segment(full_path) {
        "" => full_path.to_string(),
        name => name.to_string(),
    }
}
