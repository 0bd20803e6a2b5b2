// Persistent metadata: per-instance property maps, the on-disk store,
// and the bidirectional path registry rebuilt from it at startup.

pub mod paths;
pub mod props;
pub mod store;

pub use paths::PathRegistry;
pub use props::{AssetProps, PATH_KEY, SOURCE_KEY};
pub use store::{AssetCategory, MetadataStore, METADATA_EXT};
