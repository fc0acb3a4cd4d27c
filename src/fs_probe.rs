//! Filesystem primitives used by the discovery pass.
//!
//! Existence and access-time checks go through [`FileProbe`] so discovery can
//! run against an in-memory fake in tests and against the real disk otherwise.

use std::path::Path;

use chrono::{DateTime, Utc};

pub trait FileProbe: Send + Sync {
    /// True when `path` names an existing file or directory.
    fn exists(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    /// Last access time, or `None` when the platform or file does not provide one.
    fn last_accessed(&self, path: &Path) -> Option<DateTime<Utc>>;
}

/// [`FileProbe`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl FileProbe for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn last_accessed(&self, path: &Path) -> Option<DateTime<Utc>> {
        let accessed = std::fs::metadata(path).ok()?.accessed().ok()?;
        Some(DateTime::<Utc>::from(accessed))
    }
}
