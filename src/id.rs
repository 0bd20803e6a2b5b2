// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Stable 64-bit identifiers for asset instances and asset kinds.
//!
//! Instance ids and type ids hash with different seeds so the two
//! namespaces can never collide with each other.

use std::fmt;
use std::path::Path;
use xxhash_rust::xxh3::xxh3_64_with_seed;

const GUID_SEED: u64 = 0x9e37_79b9_7f4a_7c15;
const TYPE_SEED: u64 = 0x517c_c1b7_2722_0a95;

/// Identifier of one imported asset instance.
///
/// Path-addressed kinds derive it from bytes so re-importing the same
/// file never duplicates data; transcoded kinds draw a random one so the
/// id survives a later rename of the underlying file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetGuid(u64);

impl AssetGuid {
    /// Deterministic id from a byte sequence; identical input always
    /// yields the identical id.
    pub fn derive(bytes: &[u8]) -> Self {
        Self(xxh3_64_with_seed(bytes, GUID_SEED))
    }

    /// Deterministic id from a path's string form.
    pub fn derive_path(path: &Path) -> Self {
        Self::derive(path.to_string_lossy().as_bytes())
    }

    /// Randomly seeded id.
    pub fn random() -> Self {
        Self(rand::random::<u64>())
    }

    /// Raw 64-bit value.
    pub fn value(self) -> u64 {
        self.0
    }

    /// 16-digit lowercase hex form, used in metadata file names.
    pub fn to_hex(self) -> String {
        format!("{:016x}", self.0)
    }

    /// Parse the hex form produced by [`AssetGuid::to_hex`].
    pub fn parse_hex(s: &str) -> Option<Self> {
        if s.len() != 16 {
            return None;
        }
        u64::from_str_radix(s, 16).ok().map(Self)
    }
}

impl fmt::Display for AssetGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for AssetGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetGuid({:016x})", self.0)
    }
}

/// Identifier of a registered asset kind, derived from its display name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetTypeId(u64);

impl AssetTypeId {
    /// Deterministic id from a kind's display name. Collisions between
    /// distinct names are not checked.
    pub fn of_name(name: &str) -> Self {
        Self(xxh3_64_with_seed(name.as_bytes(), TYPE_SEED))
    }

    /// Raw 64-bit value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssetTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for AssetTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetTypeId({:016x})", self.0)
    }
}

/// Lookup key combining kind and instance, derived on demand and never
/// stored on disk.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CompositeKey {
    pub kind: AssetTypeId,
    pub guid: AssetGuid,
}

impl CompositeKey {
    pub fn new(kind: AssetTypeId, guid: AssetGuid) -> Self {
        Self { kind, guid }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_derive_is_deterministic() {
        let a = AssetGuid::derive(b"Textures/foo.png");
        let b = AssetGuid::derive(b"Textures/foo.png");
        assert_eq!(a, b);

        let c = AssetGuid::derive(b"Textures/bar.png");
        assert_ne!(a, c);
    }

    #[test]
    fn test_derive_path_matches_bytes() {
        let path = PathBuf::from("Audio/step.wav");
        assert_eq!(
            AssetGuid::derive_path(&path),
            AssetGuid::derive(b"Audio/step.wav")
        );
    }

    #[test]
    fn test_instance_and_type_namespaces_are_disjoint() {
        // Same byte sequence, different seeds.
        let guid = AssetGuid::derive(b"Texture");
        let type_id = AssetTypeId::of_name("Texture");
        assert_ne!(guid.value(), type_id.value());
    }

    #[test]
    fn test_random_ids_differ() {
        let a = AssetGuid::random();
        let b = AssetGuid::random();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hex_round_trip() {
        let guid = AssetGuid::derive(b"round-trip");
        let parsed = AssetGuid::parse_hex(&guid.to_hex());
        assert_eq!(parsed, Some(guid));

        assert_eq!(AssetGuid::parse_hex("not-hex"), None);
        assert_eq!(AssetGuid::parse_hex("abc"), None);
    }

    #[test]
    fn test_composite_key_equality() {
        let kind = AssetTypeId::of_name("Texture");
        let guid = AssetGuid::derive(b"Textures/foo.png");
        assert_eq!(CompositeKey::new(kind, guid), CompositeKey::new(kind, guid));

        let other = AssetTypeId::of_name("Audio");
        assert_ne!(CompositeKey::new(kind, guid), CompositeKey::new(other, guid));
    }
}
