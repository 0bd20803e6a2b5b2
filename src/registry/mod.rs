pub mod descriptor;
pub mod handle;
pub(crate) mod manager;
pub mod request;
pub mod tracker;

pub use descriptor::{AssetKind, ImportContext, ImportOutput, KindDescriptor, LoadContext};
pub use handle::AssetHandle;
pub use manager::AssetRegistry;
pub use request::RegistryRequest;
pub use tracker::{LiveSet, RefCountTable, RegistryStats};
