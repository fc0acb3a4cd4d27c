//! Readers for the places editors and IDEs record recently opened work.

pub mod builder;
pub mod visual_studio;
pub mod vscode;

pub use builder::WorkspaceBuilder;
pub use visual_studio::{
    DescriptorSource, InstanceDescriptor, ResolvedInstance, SettingsResolver,
    VisualStudioDataDir, VsWhere, discover_instances,
};
pub use vscode::{StateDb, StorageJson, VsCodeWorkspaces, WorkspaceStore};
