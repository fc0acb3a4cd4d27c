use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use workspace_discovery::fs_probe::FileProbe;

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Assert that the captured log output contains the provided substring.
    pub fn assert_contains(&self, needle: &str) {
        let out = self.output();
        assert!(
            out.contains(needle),
            "expected logs to contain `{needle}`, got:\n{out}"
        );
    }
}

#[allow(dead_code)]
struct TestWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// `file:///` URI for a local path, as VS Code writes it.
#[allow(dead_code)]
pub fn file_uri(path: &Path) -> String {
    format!(
        "file:///{}",
        path.display().to_string().trim_start_matches('/')
    )
}

/// A fake editor data root (`<root>/User/globalStorage`) in a temp dir.
#[allow(dead_code)]
pub struct EditorRoot {
    pub dir: TempDir,
    pub root: PathBuf,
}

#[allow(dead_code)]
impl EditorRoot {
    pub fn new(variant: &str) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path().join(variant);
        fs::create_dir_all(root.join("User").join("globalStorage")).unwrap();
        Self { dir, root }
    }

    pub fn global_storage(&self) -> PathBuf {
        self.root.join("User").join("globalStorage")
    }

    /// Directory inside the temp dir (created) that workspaces can point at.
    pub fn project(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join("projects").join(name);
        fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn write_storage_json(&self, doc: &Value) -> PathBuf {
        let path = self.global_storage().join("storage.json");
        fs::write(&path, doc.to_string()).unwrap();
        path
    }

    pub fn write_state_db(&self, entries: &Value) -> PathBuf {
        let path = self.global_storage().join("state.vscdb");
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS ItemTable (key TEXT UNIQUE ON CONFLICT REPLACE, value BLOB)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO ItemTable (key, value) VALUES ('history.recentlyOpenedPathsList', ?1)",
            [entries.to_string()],
        )
        .unwrap();
        path
    }
}

/// In-memory [`FileProbe`]: only the registered paths exist, all with one access time.
#[allow(dead_code)]
pub struct MemoryFs {
    paths: HashSet<String>,
    accessed: Option<DateTime<Utc>>,
}

#[allow(dead_code)]
impl MemoryFs {
    pub fn with_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            accessed: None,
        }
    }

    pub fn accessed_at(mut self, when: DateTime<Utc>) -> Self {
        self.accessed = Some(when);
        self
    }

    fn knows(&self, path: &Path) -> bool {
        self.paths.contains(&path.display().to_string())
    }
}

impl FileProbe for MemoryFs {
    fn exists(&self, path: &Path) -> bool {
        self.knows(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.knows(path)
    }

    fn last_accessed(&self, path: &Path) -> Option<DateTime<Utc>> {
        self.knows(path).then_some(self.accessed).flatten()
    }
}
