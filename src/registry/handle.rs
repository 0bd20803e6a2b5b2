use crate::id::{AssetGuid, AssetTypeId, CompositeKey};
use crate::registry::descriptor::AssetKind;
use crate::registry::manager::RegistryShared;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reference-counted typed accessor to a possibly-loaded instance.
///
/// Cloning increments the shared count; dropping decrements it, and the
/// last drop runs the kind's unload hook and removes the instance from
/// the live set. Access goes through [`AssetHandle::get`], which checks
/// liveness first so a stale handle can never reach unloaded data.
pub struct AssetHandle<K: AssetKind> {
    guid: AssetGuid,
    kind: AssetTypeId,
    asset: Option<Arc<K>>,
    live: Arc<AtomicBool>,
    shared: Arc<RegistryShared>,
}

impl<K: AssetKind> AssetHandle<K> {
    /// The caller has already acquired one reference for this handle.
    pub(crate) fn new(
        guid: AssetGuid,
        asset: Arc<K>,
        live: Arc<AtomicBool>,
        shared: Arc<RegistryShared>,
    ) -> Self {
        Self {
            guid,
            kind: K::type_id(),
            asset: Some(asset),
            live,
            shared,
        }
    }

    pub fn guid(&self) -> AssetGuid {
        self.guid
    }

    /// Whether the instance is still resident. Lock-free.
    pub fn is_loaded(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Access the loaded asset, or `None` once it has been unloaded or
    /// deleted out from under this handle. Lock-free.
    pub fn get(&self) -> Option<&K> {
        if self.is_loaded() {
            self.asset.as_deref()
        } else {
            None
        }
    }

    /// Current shared reference count for this instance.
    pub fn ref_count(&self) -> u32 {
        self.shared
            .inner
            .lock()
            .refcounts
            .count(CompositeKey::new(self.kind, self.guid))
    }
}

impl<K: AssetKind> Clone for AssetHandle<K> {
    fn clone(&self) -> Self {
        self.shared
            .inner
            .lock()
            .refcounts
            .acquire(CompositeKey::new(self.kind, self.guid));
        Self {
            guid: self.guid,
            kind: self.kind,
            asset: self.asset.clone(),
            live: self.live.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<K: AssetKind> Drop for AssetHandle<K> {
    fn drop(&mut self) {
        // Give up our share of the object before the count drops, so
        // the unload hook sees the last owner.
        self.asset = None;
        self.shared.release_reference(self.kind, self.guid);
    }
}

impl<K: AssetKind> fmt::Debug for AssetHandle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetHandle")
            .field("kind", &K::NAME)
            .field("guid", &self.guid)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
