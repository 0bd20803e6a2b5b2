use crate::config::RegistryConfig;
use crate::error::{AssetError, Result};
use crate::id::{AssetGuid, AssetTypeId};
use crate::meta::props::AssetProps;
use ahash::AHashMap;
use rustc_hash::FxHashSet;
use std::fs;
use std::path::Path;

/// Extension of persisted metadata files.
pub const METADATA_EXT: &str = "meta";

/// Build the on-disk file name for one entry:
/// `<source basename>.<16-hex guid>.<METADATA_EXT>`.
fn metadata_file_name(props: &AssetProps, guid: AssetGuid) -> Option<String> {
    let base = Path::new(props.path()?).file_name()?.to_string_lossy().into_owned();
    Some(format!("{base}.{}.{METADATA_EXT}", guid.to_hex()))
}

/// Parse the guid back out of a metadata file name. Returns `None` for
/// files that do not follow the naming scheme.
pub(crate) fn parse_metadata_file_name(name: &str) -> Option<AssetGuid> {
    let stem = name.strip_suffix(&format!(".{METADATA_EXT}"))?;
    let (_, hex) = stem.rsplit_once('.')?;
    AssetGuid::parse_hex(hex)
}

/// All persisted entries of one kind.
pub struct AssetCategory {
    directory: &'static str,
    entries: AHashMap<AssetGuid, AssetProps>,
    dirty: FxHashSet<AssetGuid>,
}

impl AssetCategory {
    fn new(directory: &'static str) -> Self {
        Self {
            directory,
            entries: AHashMap::new(),
            dirty: FxHashSet::default(),
        }
    }

    pub fn directory(&self) -> &'static str {
        self.directory
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Persistent per-kind property maps keyed by instance id.
///
/// Loaded by directory scan at startup; only entries flagged modified
/// are rewritten on save.
#[derive(Default)]
pub struct MetadataStore {
    categories: AHashMap<AssetTypeId, AssetCategory>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn ensure_category(&mut self, kind: AssetTypeId, directory: &'static str) {
        self.categories
            .entry(kind)
            .or_insert_with(|| AssetCategory::new(directory));
    }

    pub fn props(&self, kind: AssetTypeId, guid: AssetGuid) -> Option<&AssetProps> {
        self.categories.get(&kind)?.entries.get(&guid)
    }

    /// Insert or replace an entry and flag it modified.
    pub(crate) fn upsert(
        &mut self,
        kind: AssetTypeId,
        directory: &'static str,
        guid: AssetGuid,
        props: AssetProps,
    ) {
        let category = self
            .categories
            .entry(kind)
            .or_insert_with(|| AssetCategory::new(directory));
        category.entries.insert(guid, props);
        category.dirty.insert(guid);
    }

    /// Update one property of an existing entry and flag it modified.
    pub(crate) fn set_prop(
        &mut self,
        kind: AssetTypeId,
        guid: AssetGuid,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let category = self
            .categories
            .get_mut(&kind)
            .ok_or(AssetError::GuidNotRegistered(guid))?;
        let props = category
            .entries
            .get_mut(&guid)
            .ok_or(AssetError::GuidNotRegistered(guid))?;
        props.set(key, value);
        category.dirty.insert(guid);
        Ok(())
    }

    pub(crate) fn remove(&mut self, kind: AssetTypeId, guid: AssetGuid) -> Option<AssetProps> {
        let category = self.categories.get_mut(&kind)?;
        category.dirty.remove(&guid);
        category.entries.remove(&guid)
    }

    /// Scan one kind's metadata directory, loading every parseable
    /// entry. Returns the loaded pairs so the caller can rebuild its
    /// path registry. An entry without a `"path"` property is fatal
    /// registry corruption.
    pub(crate) fn scan_kind(
        &mut self,
        kind: AssetTypeId,
        directory: &'static str,
        dir: &Path,
    ) -> Result<Vec<(AssetGuid, AssetProps)>> {
        let category = self
            .categories
            .entry(kind)
            .or_insert_with(|| AssetCategory::new(directory));

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => {
                tracing::debug!(dir = %dir.display(), "no metadata directory yet; skipping scan");
                return Ok(Vec::new());
            }
        };

        let mut loaded = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AssetError::IoError(e.to_string()))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(guid) = parse_metadata_file_name(&name) else {
                tracing::warn!(file = %path.display(), "unrecognized metadata file name; skipping");
                continue;
            };
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "unreadable metadata file; skipping");
                    continue;
                }
            };
            let props: AssetProps = match serde_json::from_str(&text) {
                Ok(props) => props,
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "unparseable metadata file; skipping");
                    continue;
                }
            };
            if props.path().is_none() {
                tracing::error!(file = %path.display(), guid = %guid, "metadata entry has no path property");
                return Err(AssetError::CorruptMetadata {
                    guid,
                    reason: format!("{} has no \"path\" property", path.display()),
                });
            }
            loaded.push((guid, props.clone()));
            category.entries.insert(guid, props);
        }
        Ok(loaded)
    }

    /// Write every modified entry back to disk, removing stale files
    /// left behind by renames. Unmodified entries are not rewritten.
    /// Entries that fail to write stay flagged for the next flush.
    pub(crate) fn flush_modified(&mut self, config: &RegistryConfig) -> Result<usize> {
        let mut written = 0usize;
        let mut first_err = None;

        for category in self.categories.values_mut() {
            if category.dirty.is_empty() {
                continue;
            }
            let dir = config.metadata_dir(category.directory);
            if let Err(e) = fs::create_dir_all(&dir) {
                first_err.get_or_insert(AssetError::IoError(e.to_string()));
                continue;
            }

            let mut expected: AHashMap<AssetGuid, String> = AHashMap::new();
            for guid in category.dirty.iter().copied().collect::<Vec<_>>() {
                let Some(props) = category.entries.get(&guid) else {
                    category.dirty.remove(&guid);
                    continue;
                };
                let Some(name) = metadata_file_name(props, guid) else {
                    first_err.get_or_insert(AssetError::CorruptMetadata {
                        guid,
                        reason: "entry has no \"path\" property".to_string(),
                    });
                    continue;
                };
                let json = serde_json::to_string_pretty(props)
                    .map_err(|e| AssetError::IoError(e.to_string()))?;
                match fs::write(dir.join(&name), json) {
                    Ok(()) => {
                        category.dirty.remove(&guid);
                        expected.insert(guid, name);
                        written += 1;
                    }
                    Err(e) => {
                        first_err.get_or_insert(AssetError::IoError(e.to_string()));
                    }
                }
            }

            // A rename leaves a file under the old basename; sweep any
            // file for a just-written guid that no longer matches.
            if !expected.is_empty() {
                if let Ok(entries) = fs::read_dir(&dir) {
                    for entry in entries.flatten() {
                        let name = entry.file_name().to_string_lossy().into_owned();
                        let Some(guid) = parse_metadata_file_name(&name) else {
                            continue;
                        };
                        if let Some(current) = expected.get(&guid) {
                            if *current != name {
                                if let Err(e) = fs::remove_file(entry.path()) {
                                    tracing::warn!(
                                        file = %entry.path().display(),
                                        error = %e,
                                        "failed to remove stale metadata file"
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(written),
        }
    }

    /// Remove every metadata file for one guid under a kind directory.
    pub(crate) fn delete_metadata_files(config: &RegistryConfig, directory: &str, guid: AssetGuid) {
        let dir = config.metadata_dir(directory);
        let Ok(entries) = fs::read_dir(&dir) else {
            return;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if parse_metadata_file_name(&name) == Some(guid) {
                if let Err(e) = fs::remove_file(entry.path()) {
                    tracing::warn!(file = %entry.path().display(), error = %e, "failed to remove metadata file");
                }
            }
        }
    }

    pub fn entry_count(&self) -> usize {
        self.categories.values().map(AssetCategory::len).sum()
    }

    pub fn dirty_count(&self) -> usize {
        self.categories.values().map(|c| c.dirty.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn kind() -> AssetTypeId {
        AssetTypeId::of_name("Texture")
    }

    fn props_for(path: &str) -> AssetProps {
        let mut props = AssetProps::new();
        props.set_path(path);
        props
    }

    #[test]
    fn test_file_name_round_trip() {
        let guid = AssetGuid::derive(b"Textures/foo.png");
        let name = metadata_file_name(&props_for("Textures/foo.png"), guid).unwrap();
        assert_eq!(name, format!("foo.png.{}.meta", guid.to_hex()));
        assert_eq!(parse_metadata_file_name(&name), Some(guid));

        assert_eq!(parse_metadata_file_name("foo.png"), None);
        assert_eq!(parse_metadata_file_name("foo.png.zzzz.meta"), None);
    }

    #[test]
    fn test_flush_writes_only_modified() {
        let tmp = TempDir::new().unwrap();
        let config = RegistryConfig::new(tmp.path().join("Assets"), tmp.path().join("Metadata"));
        let mut store = MetadataStore::new();

        let a = AssetGuid::derive(b"a");
        let b = AssetGuid::derive(b"b");
        store.upsert(kind(), "Textures", a, props_for("Textures/a.png"));
        store.upsert(kind(), "Textures", b, props_for("Textures/b.png"));
        assert_eq!(store.flush_modified(&config).unwrap(), 2);
        assert_eq!(store.dirty_count(), 0);

        // Nothing modified: nothing rewritten.
        assert_eq!(store.flush_modified(&config).unwrap(), 0);

        store.set_prop(kind(), a, "filter", "nearest").unwrap();
        assert_eq!(store.flush_modified(&config).unwrap(), 1);
    }

    #[test]
    fn test_scan_round_trip() {
        let tmp = TempDir::new().unwrap();
        let config = RegistryConfig::new(tmp.path().join("Assets"), tmp.path().join("Metadata"));
        let mut store = MetadataStore::new();

        let guid = AssetGuid::derive(b"Textures/foo.png");
        let mut props = props_for("Textures/foo.png");
        props.set("filter", "linear");
        store.upsert(kind(), "Textures", guid, props.clone());
        store.flush_modified(&config).unwrap();

        let mut fresh = MetadataStore::new();
        let loaded = fresh
            .scan_kind(kind(), "Textures", &config.metadata_dir("Textures"))
            .unwrap();
        assert_eq!(loaded, vec![(guid, props.clone())]);
        assert_eq!(fresh.props(kind(), guid), Some(&props));
        // Scanned entries are clean.
        assert_eq!(fresh.dirty_count(), 0);
    }

    #[test]
    fn test_scan_missing_directory_is_empty() {
        let mut store = MetadataStore::new();
        let loaded = store
            .scan_kind(kind(), "Textures", &PathBuf::from("/does/not/exist"))
            .unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_scan_rejects_entry_without_path() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("Textures");
        fs::create_dir_all(&dir).unwrap();

        let guid = AssetGuid::derive(b"broken");
        fs::write(
            dir.join(format!("broken.png.{}.meta", guid.to_hex())),
            r#"{"filter":"linear"}"#,
        )
        .unwrap();

        let mut store = MetadataStore::new();
        match store.scan_kind(kind(), "Textures", &dir) {
            Err(AssetError::CorruptMetadata { guid: g, .. }) => assert_eq!(g, guid),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_flush_after_rename_sweeps_stale_file() {
        let tmp = TempDir::new().unwrap();
        let config = RegistryConfig::new(tmp.path().join("Assets"), tmp.path().join("Metadata"));
        let mut store = MetadataStore::new();

        let guid = AssetGuid::derive(b"Textures/foo.png");
        store.upsert(kind(), "Textures", guid, props_for("Textures/foo.png"));
        store.flush_modified(&config).unwrap();

        store
            .set_prop(kind(), guid, super::super::props::PATH_KEY, "Textures/bar.png")
            .unwrap();
        store.flush_modified(&config).unwrap();

        let dir = config.metadata_dir("Textures");
        let names: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![format!("bar.png.{}.meta", guid.to_hex())]);
    }

    #[test]
    fn test_delete_metadata_files() {
        let tmp = TempDir::new().unwrap();
        let config = RegistryConfig::new(tmp.path().join("Assets"), tmp.path().join("Metadata"));
        let mut store = MetadataStore::new();

        let guid = AssetGuid::derive(b"Textures/gone.png");
        store.upsert(kind(), "Textures", guid, props_for("Textures/gone.png"));
        store.flush_modified(&config).unwrap();

        MetadataStore::delete_metadata_files(&config, "Textures", guid);
        let remaining = fs::read_dir(config.metadata_dir("Textures")).unwrap().count();
        assert_eq!(remaining, 0);
    }
}
