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

//! Built-in asset kinds.
//!
//! Textures and audio are path-addressed (deterministic ids), meshes
//! get a random id because the managed artifact is renamed at import.
//! Format-specific decoding lives in the consuming subsystems; these
//! kinds manage the raw bytes.

use crate::error::Result;
use crate::registry::{AssetKind, ImportContext, ImportOutput, LoadContext};
use std::path::{Path, PathBuf};

/// Texture source managed by copy; id derived from the managed path.
#[derive(Clone, Debug)]
pub struct TextureAsset {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl TextureAsset {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AssetKind for TextureAsset {
    const NAME: &'static str = "Texture";
    const DIRECTORY: &'static str = "Textures";
    const EXTENSIONS: &'static [&'static str] = &["png", "jpg", "jpeg", "tga"];

    fn import(ctx: &ImportContext<'_>, source: &Path) -> Result<ImportOutput> {
        let rel = ctx.copy_into_managed(source)?;
        let guid = ctx.derive_guid(&rel);
        Ok(ImportOutput::new(guid, rel))
    }

    fn load(ctx: LoadContext<'_>) -> Result<Self> {
        Ok(Self {
            path: ctx.path.to_path_buf(),
            bytes: ctx.bytes.to_vec(),
        })
    }

    fn on_unload(&mut self) {
        self.bytes.clear();
    }
}

/// Audio clip managed by copy; id derived from the managed path.
#[derive(Clone, Debug)]
pub struct AudioAsset {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl AudioAsset {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AssetKind for AudioAsset {
    const NAME: &'static str = "Audio";
    const DIRECTORY: &'static str = "Audio";
    const EXTENSIONS: &'static [&'static str] = &["wav", "ogg", "mp3"];

    fn import(ctx: &ImportContext<'_>, source: &Path) -> Result<ImportOutput> {
        let rel = ctx.copy_into_managed(source)?;
        let guid = ctx.derive_guid(&rel);
        Ok(ImportOutput::new(guid, rel))
    }

    fn load(ctx: LoadContext<'_>) -> Result<Self> {
        Ok(Self {
            path: ctx.path.to_path_buf(),
            bytes: ctx.bytes.to_vec(),
        })
    }

    fn on_unload(&mut self) {
        self.bytes.clear();
    }
}

/// Mesh baked into the managed binary format at import. The managed
/// path is not a stable identity (the artifact is renamed), so the id
/// is randomly seeded and survives later renames.
#[derive(Clone, Debug)]
pub struct MeshAsset {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl MeshAsset {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AssetKind for MeshAsset {
    const NAME: &'static str = "Mesh";
    const DIRECTORY: &'static str = "Meshes";
    const EXTENSIONS: &'static [&'static str] = &["obj", "gltf", "glb", "fbx"];

    fn import(ctx: &ImportContext<'_>, source: &Path) -> Result<ImportOutput> {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mesh".to_string());
        let rel = ctx.copy_into_managed_as(source, &format!("{stem}.mesh"))?;
        let guid = ctx.random_guid();
        Ok(ImportOutput::new(guid, rel))
    }

    fn load(ctx: LoadContext<'_>) -> Result<Self> {
        Ok(Self {
            path: ctx.path.to_path_buf(),
            bytes: ctx.bytes.to_vec(),
        })
    }

    fn on_unload(&mut self) {
        self.bytes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::id::AssetGuid;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_texture_import_derives_from_managed_path() {
        let tmp = TempDir::new().unwrap();
        let config = RegistryConfig::new(tmp.path().join("Assets"), tmp.path().join("Metadata"));
        let source = tmp.path().join("foo.png");
        fs::write(&source, b"not-really-a-png").unwrap();

        let ctx = ImportContext::new(&config, TextureAsset::DIRECTORY);
        let out = TextureAsset::import(&ctx, &source).unwrap();
        assert_eq!(out.path, PathBuf::from("Textures/foo.png"));
        assert_eq!(out.guid, AssetGuid::derive_path(Path::new("Textures/foo.png")));
        assert!(config.resolve(&out.path).is_file());
    }

    #[test]
    fn test_mesh_import_rewrites_path_with_random_guid() {
        let tmp = TempDir::new().unwrap();
        let config = RegistryConfig::new(tmp.path().join("Assets"), tmp.path().join("Metadata"));
        let source = tmp.path().join("rock.glb");
        fs::write(&source, b"mesh-data").unwrap();

        let ctx = ImportContext::new(&config, MeshAsset::DIRECTORY);
        let a = MeshAsset::import(&ctx, &source).unwrap();
        let b = MeshAsset::import(&ctx, &source).unwrap();
        assert_eq!(a.path, PathBuf::from("Meshes/rock.mesh"));
        // Random seeding: two raw hook invocations never share an id.
        assert_ne!(a.guid, b.guid);
    }

    #[test]
    fn test_unload_hook_releases_bytes() {
        let mut texture = TextureAsset {
            path: PathBuf::from("Textures/foo.png"),
            bytes: vec![1, 2, 3],
        };
        texture.on_unload();
        assert!(texture.is_empty());
    }
}
