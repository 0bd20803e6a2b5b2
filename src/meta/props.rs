use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Property key every registered instance must carry.
pub const PATH_KEY: &str = "path";

/// Property key recording the original source file, so repeated imports
/// of the same source resolve to the same instance across runs.
pub const SOURCE_KEY: &str = "source";

/// Persisted key/value metadata for one asset instance.
///
/// Free-form string map; `"path"` is the only structurally significant
/// key. Backed by a `BTreeMap` so serialized files are byte-stable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetProps {
    entries: BTreeMap<String, String>,
}

impl AssetProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// The managed path, if present.
    pub fn path(&self) -> Option<&str> {
        self.get(PATH_KEY)
    }

    pub fn set_path<V: Into<String>>(&mut self, value: V) {
        self.set(PATH_KEY, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get() {
        let mut props = AssetProps::new();
        props.set("path", "Textures/foo.png");
        props.set("filter", "linear");

        assert_eq!(props.path(), Some("Textures/foo.png"));
        assert_eq!(props.get("filter"), Some("linear"));
        assert_eq!(props.get("missing"), None);
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn test_serde_round_trip() {
        let mut props = AssetProps::new();
        props.set_path("Audio/step.wav");
        props.set("channels", "2");

        let json = serde_json::to_string(&props).unwrap();
        let back: AssetProps = serde_json::from_str(&json).unwrap();
        assert_eq!(back, props);
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut props = AssetProps::new();
        props.set_path("Meshes/rock.mesh");

        let json = serde_json::to_string(&props).unwrap();
        assert_eq!(json, r#"{"path":"Meshes/rock.mesh"}"#);
    }
}
