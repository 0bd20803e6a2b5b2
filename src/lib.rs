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

//! Asset Registry - generic asset registry with reference-counted
//! resource caching and persistent metadata.
//!
//! Source files are imported into managed, stably-identified instances;
//! loading hands out counted handles whose last drop unloads the
//! instance. Metadata survives across runs in per-kind directories.

pub mod config;
pub mod error;
pub mod id;
pub mod kinds;
pub mod meta;
pub mod registry;


pub use config::RegistryConfig;
pub use error::{AssetError, Result};
pub use id::{AssetGuid, AssetTypeId, CompositeKey};
pub use kinds::{AudioAsset, MeshAsset, TextureAsset};
pub use meta::{AssetProps, MetadataStore, PathRegistry, PATH_KEY, SOURCE_KEY};
pub use registry::{
    AssetHandle, AssetKind, AssetRegistry, ImportContext, ImportOutput, KindDescriptor,
    LiveSet, LoadContext, RefCountTable, RegistryRequest, RegistryStats,
};
