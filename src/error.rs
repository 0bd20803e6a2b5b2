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

//! Error types

use crate::id::AssetGuid;
use std::fmt;
use std::path::PathBuf;

/// Registry error type
#[derive(Debug, Clone)]
pub enum AssetError {
    /// Registry used before `initialize()` ran
    NotInitialized,

    /// No descriptor registered for this kind
    KindNotRegistered(String),

    /// Path has no registered instance
    PathNotRegistered(PathBuf),

    /// Instance id has no registered path
    GuidNotRegistered(AssetGuid),

    /// Import of a source file failed
    ImportFailed { path: PathBuf, reason: String },

    /// Load of a registered instance failed
    LoadFailed { guid: AssetGuid, reason: String },

    /// Persisted metadata is structurally broken (e.g. missing "path")
    CorruptMetadata { guid: AssetGuid, reason: String },

    /// IO error (file operations, etc.)
    IoError(String),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::NotInitialized => {
                write!(f, "Registry not initialized: call initialize() first")
            }
            AssetError::KindNotRegistered(name) => {
                write!(f, "Asset kind not registered: {name}")
            }
            AssetError::PathNotRegistered(path) => {
                write!(f, "Path not registered: {}", path.display())
            }
            AssetError::GuidNotRegistered(guid) => {
                write!(f, "Instance id not registered: {guid}")
            }
            AssetError::ImportFailed { path, reason } => {
                write!(f, "Import failed for {}: {reason}", path.display())
            }
            AssetError::LoadFailed { guid, reason } => {
                write!(f, "Load failed for {guid}: {reason}")
            }
            AssetError::CorruptMetadata { guid, reason } => {
                write!(f, "Corrupt metadata for {guid}: {reason}")
            }
            AssetError::IoError(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for AssetError {}

impl From<std::io::Error> for AssetError {
    fn from(err: std::io::Error) -> Self {
        AssetError::IoError(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AssetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_key() {
        let err = AssetError::PathNotRegistered(PathBuf::from("Textures/missing.png"));
        assert!(err.to_string().contains("Textures/missing.png"));

        let guid = AssetGuid::derive(b"some-asset");
        let err = AssetError::GuidNotRegistered(guid);
        assert!(err.to_string().contains(&guid.to_hex()));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AssetError = io.into();
        assert!(matches!(err, AssetError::IoError(_)));
    }
}
