use crate::error::{AssetError, Result};
use crate::id::AssetGuid;
use ahash::AHashMap;
use std::path::{Path, PathBuf};

/// Bidirectional path <-> instance id maps, rebuilt from the metadata
/// store at startup and kept consistent by every path mutation.
#[derive(Default)]
pub struct PathRegistry {
    by_path: AHashMap<PathBuf, AssetGuid>,
    by_guid: AHashMap<AssetGuid, PathBuf>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a mapping, removing any stale reverse mapping
    /// for this guid's previous path first.
    pub fn insert(&mut self, guid: AssetGuid, path: PathBuf) {
        if let Some(old_path) = self.by_guid.insert(guid, path.clone()) {
            if old_path != path {
                self.by_path.remove(&old_path);
            }
        }
        if let Some(old_guid) = self.by_path.insert(path.clone(), guid) {
            if old_guid != guid {
                // The path was stolen from another instance; drop its
                // forward entry so the two maps stay mutually consistent.
                tracing::warn!(
                    path = %path.display(),
                    previous = %old_guid,
                    now = %guid,
                    "path remapped away from another instance"
                );
                self.by_guid.remove(&old_guid);
            }
        }
    }

    pub fn guid_of(&self, path: &Path) -> Option<AssetGuid> {
        self.by_path.get(path).copied()
    }

    pub fn path_of(&self, guid: AssetGuid) -> Option<&Path> {
        self.by_guid.get(&guid).map(PathBuf::as_path)
    }

    /// Lookup failing with the offending path.
    pub fn path_to_guid(&self, path: &Path) -> Result<AssetGuid> {
        self.guid_of(path)
            .ok_or_else(|| AssetError::PathNotRegistered(path.to_path_buf()))
    }

    /// Lookup failing with the offending guid.
    pub fn guid_to_path(&self, guid: AssetGuid) -> Result<PathBuf> {
        self.path_of(guid)
            .map(Path::to_path_buf)
            .ok_or(AssetError::GuidNotRegistered(guid))
    }

    pub fn remove(&mut self, guid: AssetGuid) -> Option<PathBuf> {
        let path = self.by_guid.remove(&guid)?;
        self.by_path.remove(&path);
        Some(path)
    }

    pub fn len(&self) -> usize {
        self.by_guid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_guid.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_path.clear();
        self.by_guid.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_round_trip() {
        let mut registry = PathRegistry::new();
        let guid = AssetGuid::derive(b"Textures/foo.png");
        registry.insert(guid, PathBuf::from("Textures/foo.png"));

        assert_eq!(
            registry.path_to_guid(Path::new("Textures/foo.png")).unwrap(),
            guid
        );
        assert_eq!(
            registry.guid_to_path(guid).unwrap(),
            PathBuf::from("Textures/foo.png")
        );

        let round = registry
            .path_to_guid(&registry.guid_to_path(guid).unwrap())
            .unwrap();
        assert_eq!(round, guid);
    }

    #[test]
    fn test_remap_removes_stale_reverse_mapping() {
        let mut registry = PathRegistry::new();
        let guid = AssetGuid::derive(b"Textures/foo.png");
        registry.insert(guid, PathBuf::from("Textures/foo.png"));
        registry.insert(guid, PathBuf::from("Textures/bar.png"));

        assert_eq!(
            registry.path_to_guid(Path::new("Textures/bar.png")).unwrap(),
            guid
        );
        assert!(registry.path_to_guid(Path::new("Textures/foo.png")).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_missing_lookups_carry_key() {
        let registry = PathRegistry::new();
        let guid = AssetGuid::derive(b"nope");

        match registry.path_to_guid(Path::new("Audio/nope.wav")) {
            Err(AssetError::PathNotRegistered(path)) => {
                assert_eq!(path, PathBuf::from("Audio/nope.wav"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        match registry.guid_to_path(guid) {
            Err(AssetError::GuidNotRegistered(g)) => assert_eq!(g, guid),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_remove_clears_both_maps() {
        let mut registry = PathRegistry::new();
        let guid = AssetGuid::derive(b"Audio/step.wav");
        registry.insert(guid, PathBuf::from("Audio/step.wav"));

        assert_eq!(registry.remove(guid), Some(PathBuf::from("Audio/step.wav")));
        assert!(registry.is_empty());
        assert!(registry.guid_of(Path::new("Audio/step.wav")).is_none());
    }
}
