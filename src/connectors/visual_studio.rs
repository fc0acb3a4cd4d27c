//! Discovery of installed Visual Studio instances.
//!
//! Instances are listed by the `vswhere` tool:
//!
//! ```json
//! [
//!   {
//!     "instanceId": "1a2b3c4d",
//!     "productPath": "C:\\Program Files\\Microsoft Visual Studio\\2022\\Community\\Common7\\IDE\\devenv.exe",
//!     "isPrerelease": false,
//!     "displayName": "Visual Studio Community 2022",
//!     "catalog": { "productLineVersion": "2022" }
//!   }
//! ]
//! ```
//!
//! Each instance keeps its recently opened code containers inside
//! `%LOCALAPPDATA%\Microsoft\VisualStudio\<version>_<instanceId>\ApplicationPrivateSettings.xml`,
//! as a JSON array stored in the text of
//! `<collection name="CodeContainers.Offline"><value>...</value></collection>`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{SourceError, SourceResult};
use crate::process::run_with_timeout;

pub const VSWHERE_BIN: &str = "vswhere.exe";
pub const VSWHERE_ARGS: &[&str] = &["-all", "-prerelease", "-format", "json"];
pub const DEFAULT_VSWHERE_TIMEOUT: Duration = Duration::from_secs(5);

const SETTINGS_FILE: &str = "ApplicationPrivateSettings.xml";
const SETTINGS_BACKUP_PREFIX: &str = "SettingsBackup_";
const CODE_CONTAINERS_COLLECTION: &str = "CodeContainers.Offline";

/// One entry of the `vswhere` JSON array.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceDescriptor {
    pub instance_id: String,
    pub product_path: String,
    pub is_prerelease: bool,
    pub display_name: String,
    pub catalog: Catalog,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Catalog {
    pub product_line_version: String,
}

/// Parse `vswhere` output. Elements that do not look like descriptors are skipped.
pub fn parse_descriptors(output: &str) -> Result<Vec<InstanceDescriptor>, serde_json::Error> {
    let values: Vec<Value> = serde_json::from_str(output)?;
    Ok(values
        .iter()
        .filter_map(|value| match InstanceDescriptor::deserialize(value) {
            Ok(descriptor) if !descriptor.instance_id.is_empty() => Some(descriptor),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed instance descriptor");
                None
            }
        })
        .collect())
}

/// Produces the raw descriptor JSON, trying each location in turn.
pub trait DescriptorSource {
    /// Locations to try, in order. The labels are used in log messages.
    fn locations(&self) -> Vec<String>;

    fn fetch(&self, location: &str) -> SourceResult<String>;
}

/// Runs `vswhere` with a bounded wait, first from `PATH` then from the installer directory.
#[derive(Debug, Clone)]
pub struct VsWhere {
    candidates: Vec<PathBuf>,
    timeout: Duration,
}

impl VsWhere {
    pub fn new(timeout: Duration) -> Self {
        let mut candidates = vec![PathBuf::from(VSWHERE_BIN)];
        if let Ok(program_files) = std::env::var("ProgramFiles(x86)") {
            candidates.push(
                PathBuf::from(program_files)
                    .join("Microsoft Visual Studio")
                    .join("Installer")
                    .join(VSWHERE_BIN),
            );
        }
        Self {
            candidates,
            timeout,
        }
    }

    pub fn with_candidates(candidates: Vec<PathBuf>, timeout: Duration) -> Self {
        Self {
            candidates,
            timeout,
        }
    }
}

impl Default for VsWhere {
    fn default() -> Self {
        Self::new(DEFAULT_VSWHERE_TIMEOUT)
    }
}

impl DescriptorSource for VsWhere {
    fn locations(&self) -> Vec<String> {
        self.candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect()
    }

    fn fetch(&self, location: &str) -> SourceResult<String> {
        run_with_timeout(Path::new(location), VSWHERE_ARGS, self.timeout)
    }
}

/// Maps an instance id to the settings document that holds its code containers.
pub trait SettingsResolver {
    fn settings_path(&self, instance_id: &str) -> SourceResult<PathBuf>;
}

/// Looks under `%LOCALAPPDATA%\Microsoft\VisualStudio` for `<version>_<instanceId>` directories.
#[derive(Debug, Clone)]
pub struct VisualStudioDataDir {
    root: PathBuf,
}

impl VisualStudioDataDir {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn from_env() -> SourceResult<Self> {
        let local = dirs::data_local_dir().ok_or(SourceError::NoDataDir("local data"))?;
        Ok(Self::new(local.join("Microsoft").join("VisualStudio")))
    }
}

impl SettingsResolver for VisualStudioDataDir {
    fn settings_path(&self, instance_id: &str) -> SourceResult<PathBuf> {
        let entries = fs::read_dir(&self.root).map_err(|e| SourceError::io(&self.root, e))?;
        let matches: Vec<PathBuf> = entries
            .flatten()
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.ends_with(instance_id) && !name.starts_with(SETTINGS_BACKUP_PREFIX)
            })
            .map(|entry| entry.path())
            .collect();

        if let [dir] = matches.as_slice() {
            let settings = dir.join(SETTINGS_FILE);
            if settings.is_file() {
                return Ok(settings);
            }
        }
        Err(SourceError::SettingsNotFound(instance_id.to_string()))
    }
}

/// A descriptor whose settings document was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInstance {
    pub descriptor: InstanceDescriptor,
    pub settings_path: PathBuf,
}

/// Query `source` location by location and keep every descriptor that
/// resolves to a settings document and is not excluded by catalog version.
///
/// The first location that yields a parseable array wins. Per-location
/// failures are only logged when no instance was resolved at all.
pub fn discover_instances(
    source: &dyn DescriptorSource,
    resolver: &dyn SettingsResolver,
    excluded_versions: &HashSet<String>,
) -> Vec<ResolvedInstance> {
    let mut resolved = Vec::new();
    let mut failures: Vec<(String, SourceError)> = Vec::new();

    for location in source.locations() {
        let descriptors = match source
            .fetch(&location)
            .and_then(|out| parse_descriptors(&out).map_err(|e| SourceError::json(&location, e)))
        {
            Ok(descriptors) => descriptors,
            Err(e) => {
                failures.push((location, e));
                continue;
            }
        };

        for descriptor in descriptors {
            let settings_path = match resolver.settings_path(&descriptor.instance_id) {
                Ok(path) => path,
                Err(e) => {
                    tracing::error!(instance_id = %descriptor.instance_id, error = %e, "failed to resolve instance settings");
                    continue;
                }
            };
            if excluded_versions.contains(&descriptor.catalog.product_line_version) {
                tracing::debug!(
                    instance_id = %descriptor.instance_id,
                    version = %descriptor.catalog.product_line_version,
                    "skipping excluded instance version"
                );
                continue;
            }
            resolved.push(ResolvedInstance {
                descriptor,
                settings_path,
            });
        }
        break;
    }

    if resolved.is_empty() {
        for (location, e) in &failures {
            tracing::error!(location = %location, error = %e, "failed to list Visual Studio instances");
        }
    }
    resolved
}

/// A code container as persisted in the settings document.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StoredContainer {
    #[serde(rename = "key", alias = "Key")]
    pub key: String,
    #[serde(rename = "value", alias = "Value")]
    pub value: StoredContainerValue,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StoredContainerValue {
    #[serde(rename = "localProperties", alias = "LocalProperties")]
    pub local_properties: LocalProperties,
    #[serde(rename = "isFavorite", alias = "IsFavorite", default)]
    pub is_favorite: bool,
    #[serde(
        rename = "lastAccessed",
        alias = "LastAccessed",
        default,
        deserialize_with = "deserialize_timestamp"
    )]
    pub last_accessed: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LocalProperties {
    #[serde(rename = "fullPath", alias = "FullPath")]
    pub full_path: String,
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

/// Accepts RFC 3339 and offset-less ISO timestamps (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Inner text of the `CodeContainers.Offline` collection's `<value>`, if present.
pub fn code_containers_json(xml: &str) -> Result<Option<String>, roxmltree::Error> {
    let doc = roxmltree::Document::parse(xml)?;
    let collection = doc.descendants().find(|node| {
        node.has_tag_name("collection") && node.attribute("name") == Some(CODE_CONTAINERS_COLLECTION)
    });
    let Some(value) = collection.and_then(|c| c.children().find(|n| n.has_tag_name("value")))
    else {
        return Ok(None);
    };
    let text: String = value
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    Ok(Some(text))
}

/// Parse the stored container array. Elements that fail to parse are skipped.
pub fn parse_code_containers(json: &str) -> Result<Vec<StoredContainer>, serde_json::Error> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    Ok(values
        .iter()
        .filter_map(|value| match StoredContainer::deserialize(value) {
            Ok(container) => Some(container),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed code container");
                None
            }
        })
        .collect())
}

/// Read every stored container from a settings document.
pub fn read_code_containers(settings_path: &Path) -> SourceResult<Vec<StoredContainer>> {
    let xml = fs::read_to_string(settings_path).map_err(|e| SourceError::io(settings_path, e))?;
    let json = code_containers_json(&xml).map_err(|source| SourceError::Xml {
        path: settings_path.to_path_buf(),
        source,
    })?;
    match json {
        Some(json) if !json.trim().is_empty() => parse_code_containers(&json)
            .map_err(|e| SourceError::json(settings_path.display().to_string(), e)),
        _ => Ok(Vec::new()),
    }
}
