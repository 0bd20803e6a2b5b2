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

//! Registry configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory layout for managed assets and their metadata.
///
/// Each registered kind gets one subdirectory under `assets_root` for
/// managed copies and a parallel subdirectory under `metadata_root` for
/// metadata files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub assets_root: PathBuf,
    pub metadata_root: PathBuf,
}

impl RegistryConfig {
    pub fn new<A: Into<PathBuf>, M: Into<PathBuf>>(assets_root: A, metadata_root: M) -> Self {
        Self {
            assets_root: assets_root.into(),
            metadata_root: metadata_root.into(),
        }
    }

    /// Managed directory for one kind, e.g. `<root>/Textures`.
    pub fn kind_dir(&self, directory: &str) -> PathBuf {
        self.assets_root.join(directory)
    }

    /// Metadata directory for one kind, e.g. `<meta root>/Textures`.
    pub fn metadata_dir(&self, directory: &str) -> PathBuf {
        self.metadata_root.join(directory)
    }

    /// Resolve a managed-relative path against the assets root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.assets_root.join(path)
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new("Assets", "Metadata")
    }
}
