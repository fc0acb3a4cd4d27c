//! Domain model shared by the readers and the discovery pass.

pub mod types;

pub use types::{
    CodeContainer, InstanceSummary, Workspace, WorkspaceEnvironment, WorkspaceKind,
    last_path_segment,
};
