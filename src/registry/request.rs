use crate::id::AssetGuid;
use std::path::PathBuf;

/// Requests collaborators (editor tooling, file watchers) enqueue for
/// the registry's mutator thread. The registry does not own
/// file-watching or UI; it only drains this queue in `pump()`.
#[derive(Clone, Debug)]
pub enum RegistryRequest {
    /// Import these source paths, each routed to a kind by extension.
    Register { paths: Vec<PathBuf> },

    /// Point an existing instance of the named kind at a new path.
    Remap {
        kind: String,
        guid: AssetGuid,
        path: PathBuf,
    },
}
