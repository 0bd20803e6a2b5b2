use crate::config::RegistryConfig;
use crate::error::{AssetError, Result};
use crate::id::{AssetGuid, AssetTypeId, CompositeKey};
use crate::meta::{AssetProps, MetadataStore, PathRegistry, PATH_KEY, SOURCE_KEY};
use crate::registry::descriptor::{AssetKind, ImportContext, KindDescriptor, LoadContext};
use crate::registry::handle::AssetHandle;
use crate::registry::request::RegistryRequest;
use crate::registry::tracker::{LiveEntry, LiveSet, RefCountTable, RegistryStats};
use ahash::AHashMap;
use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Generic asset registry and reference-counted resource cache.
///
/// One explicit instance owns the kind descriptors, reference counts,
/// live set, path maps and metadata store; subsystems receive it by
/// reference instead of reaching through globals. All mutation goes
/// through a single lock; dereferencing an already-live handle is
/// lock-free.
///
/// `initialize()` must run before any import/load/get call; it scans
/// the per-kind metadata directories and rebuilds the path registry.
#[derive(Clone)]
pub struct AssetRegistry {
    shared: Arc<RegistryShared>,
}

pub(crate) struct RegistryShared {
    pub(crate) config: RegistryConfig,
    pub(crate) inner: Mutex<RegistryInner>,
    requests_tx: Sender<RegistryRequest>,
    requests_rx: Receiver<RegistryRequest>,
}

pub(crate) struct RegistryInner {
    pub(crate) initialized: bool,
    pub(crate) kinds: AHashMap<AssetTypeId, Arc<KindDescriptor>>,
    pub(crate) refcounts: RefCountTable,
    pub(crate) live: LiveSet,
    /// Source-derived provisional key -> real instance id, making
    /// repeat imports of the same source idempotent.
    pub(crate) imports: FxHashMap<CompositeKey, AssetGuid>,
    pub(crate) store: MetadataStore,
    pub(crate) paths: PathRegistry,
    pub(crate) stats: RegistryStats,
}

impl AssetRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        let (requests_tx, requests_rx) = unbounded();
        Self {
            shared: Arc::new(RegistryShared {
                config,
                inner: Mutex::new(RegistryInner {
                    initialized: false,
                    kinds: AHashMap::new(),
                    refcounts: RefCountTable::default(),
                    live: LiveSet::default(),
                    imports: FxHashMap::default(),
                    store: MetadataStore::new(),
                    paths: PathRegistry::new(),
                    stats: RegistryStats::default(),
                }),
                requests_tx,
                requests_rx,
            }),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.shared.config
    }

    /// Register (or replace) the descriptor for one kind. Idempotent
    /// per type id. Kinds registered after `initialize()` pick up their
    /// persisted entries immediately.
    pub fn register_kind<K: AssetKind>(&self) {
        let desc = Arc::new(KindDescriptor::of::<K>());
        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;
        if inner.kinds.insert(desc.type_id(), desc.clone()).is_some() {
            tracing::debug!(kind = K::NAME, "replaced kind descriptor");
        }
        inner.store.ensure_category(desc.type_id(), desc.directory());
        if inner.initialized {
            let dir = self.shared.config.metadata_dir(desc.directory());
            match inner.store.scan_kind(desc.type_id(), desc.directory(), &dir) {
                Ok(loaded) => Self::absorb_scanned(inner, &desc, loaded),
                Err(e) => {
                    tracing::error!(kind = K::NAME, error = %e, "late metadata scan failed");
                }
            }
        }
    }

    /// Scan every registered kind's metadata directory and rebuild the
    /// path registry. Idempotent.
    pub fn initialize(&self) -> Result<()> {
        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;
        if inner.initialized {
            return Ok(());
        }
        let descs: Vec<Arc<KindDescriptor>> = inner.kinds.values().cloned().collect();
        for desc in descs {
            let dir = self.shared.config.metadata_dir(desc.directory());
            let loaded = inner.store.scan_kind(desc.type_id(), desc.directory(), &dir)?;
            Self::absorb_scanned(inner, &desc, loaded);
        }
        inner.initialized = true;
        tracing::debug!(entries = inner.store.entry_count(), "asset registry initialized");
        Ok(())
    }

    fn absorb_scanned(
        inner: &mut RegistryInner,
        desc: &Arc<KindDescriptor>,
        loaded: Vec<(AssetGuid, AssetProps)>,
    ) {
        for (guid, props) in loaded {
            let Some(path) = props.path() else { continue };
            inner.paths.insert(guid, PathBuf::from(path));
            let source = props.get(SOURCE_KEY).unwrap_or(path);
            let provisional =
                CompositeKey::new(desc.type_id(), AssetGuid::derive(source.as_bytes()));
            inner.imports.insert(provisional, guid);
        }
    }

    /// Import a source file as kind `K`, returning its instance id.
    /// Importing the same source path again is idempotent and returns
    /// the original id without re-running the kind hook.
    pub fn import<K: AssetKind>(&self, source: &Path) -> Result<AssetGuid> {
        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;
        Self::ensure_init(inner)?;
        let desc = Self::descriptor(inner, K::type_id(), K::NAME)?;
        Self::import_locked(inner, &self.shared.config, &desc, source)
    }

    fn import_locked(
        inner: &mut RegistryInner,
        config: &RegistryConfig,
        desc: &Arc<KindDescriptor>,
        source: &Path,
    ) -> Result<AssetGuid> {
        let abs = absolutize(source)?;
        if !abs.is_file() {
            return Err(AssetError::ImportFailed {
                path: source.to_path_buf(),
                reason: "source file does not exist".to_string(),
            });
        }
        let provisional = CompositeKey::new(desc.type_id(), AssetGuid::derive_path(&abs));
        if let Some(&guid) = inner.imports.get(&provisional) {
            tracing::debug!(path = %abs.display(), guid = %guid, "source already imported");
            return Ok(guid);
        }

        let ctx = ImportContext::new(config, desc.directory());
        let out = desc.import(&ctx, &abs)?;
        let guid = out.guid;
        let mut props = out.props;
        props.set(PATH_KEY, out.path.to_string_lossy());
        props.set(SOURCE_KEY, abs.to_string_lossy());

        inner.store.upsert(desc.type_id(), desc.directory(), guid, props);
        inner.paths.insert(guid, out.path.clone());
        inner.imports.insert(provisional, guid);
        inner.stats.imports += 1;
        if let Err(e) = inner.store.flush_modified(config) {
            tracing::warn!(error = %e, "failed to flush metadata after import");
        }
        tracing::debug!(
            kind = desc.name(),
            guid = %guid,
            path = %out.path.display(),
            "imported asset"
        );
        Ok(guid)
    }

    /// Make an instance resident and take one registry-held reference
    /// to pin it. No-op if it is already live.
    pub fn load_ref<K: AssetKind>(&self, guid: AssetGuid) -> Result<()> {
        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;
        Self::ensure_init(inner)?;
        let desc = Self::descriptor(inner, K::type_id(), K::NAME)?;
        if inner.live.contains(guid) {
            return Ok(());
        }
        Self::load_locked(inner, &self.shared.config, &desc, guid)?;
        inner.refcounts.acquire(CompositeKey::new(desc.type_id(), guid));
        Ok(())
    }

    /// [`AssetRegistry::load_ref`] addressed by managed path. Returns
    /// the resolved instance id.
    pub fn load_ref_by_path<K: AssetKind>(&self, path: &Path) -> Result<AssetGuid> {
        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;
        Self::ensure_init(inner)?;
        let desc = Self::descriptor(inner, K::type_id(), K::NAME)?;
        let guid = inner.paths.path_to_guid(path)?;
        if !inner.live.contains(guid) {
            Self::load_locked(inner, &self.shared.config, &desc, guid)?;
            inner.refcounts.acquire(CompositeKey::new(desc.type_id(), guid));
        }
        Ok(guid)
    }

    /// Release one reference; the last release unloads the instance.
    pub fn unload_ref<K: AssetKind>(&self, guid: AssetGuid) -> Result<()> {
        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;
        Self::ensure_init(inner)?;
        Self::descriptor(inner, K::type_id(), K::NAME)?;
        match inner.refcounts.release(CompositeKey::new(K::type_id(), guid)) {
            Some(0) => Self::unload_locked(inner, guid),
            Some(_) => {}
            None => {
                tracing::warn!(guid = %guid, kind = K::NAME, "unbalanced unload_ref ignored");
            }
        }
        Ok(())
    }

    /// Get a counted handle, loading the instance first if it is not
    /// yet resident.
    pub fn get<K: AssetKind>(&self, guid: AssetGuid) -> Result<AssetHandle<K>> {
        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;
        Self::ensure_init(inner)?;
        let desc = Self::descriptor(inner, K::type_id(), K::NAME)?;
        if inner.live.contains(guid) {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
            Self::load_locked(inner, &self.shared.config, &desc, guid)?;
        }
        let entry = inner.live.get(guid).ok_or_else(|| AssetError::LoadFailed {
            guid,
            reason: "instance vanished during load".to_string(),
        })?;
        if entry.kind != desc.type_id() {
            return Err(AssetError::LoadFailed {
                guid,
                reason: "instance is resident under a different kind".to_string(),
            });
        }
        let asset = entry
            .object
            .downcast_ref::<Arc<K>>()
            .cloned()
            .ok_or_else(|| AssetError::LoadFailed {
                guid,
                reason: "live entry kind mismatch".to_string(),
            })?;
        let live = entry.flag.clone();
        inner.refcounts.acquire(CompositeKey::new(desc.type_id(), guid));
        drop(guard);
        Ok(AssetHandle::new(guid, asset, live, self.shared.clone()))
    }

    fn load_locked(
        inner: &mut RegistryInner,
        config: &RegistryConfig,
        desc: &Arc<KindDescriptor>,
        guid: AssetGuid,
    ) -> Result<()> {
        let rel = inner.paths.guid_to_path(guid)?;
        if inner.store.props(desc.type_id(), guid).is_none() {
            // A registered path without metadata means the registry's
            // own books disagree.
            return Err(AssetError::CorruptMetadata {
                guid,
                reason: "registered path has no metadata entry".to_string(),
            });
        }
        let abs = config.resolve(&rel);
        let bytes = fs::read(&abs).map_err(|e| AssetError::LoadFailed {
            guid,
            reason: format!("cannot read {}: {e}", abs.display()),
        })?;
        let object = desc.load(LoadContext {
            guid,
            path: &abs,
            bytes: &bytes,
        })?;
        inner.live.insert(
            guid,
            LiveEntry {
                object,
                flag: Arc::new(AtomicBool::new(true)),
                kind: desc.type_id(),
            },
        );
        inner.stats.loads += 1;
        tracing::debug!(kind = desc.name(), guid = %guid, "loaded asset");
        Ok(())
    }

    fn unload_locked(inner: &mut RegistryInner, guid: AssetGuid) {
        if let Some(entry) = inner.live.remove(guid) {
            entry.flag.store(false, Ordering::Release);
            match inner.kinds.get(&entry.kind).cloned() {
                Some(desc) => {
                    desc.unload(entry.object, guid);
                    tracing::debug!(kind = desc.name(), guid = %guid, "unloaded asset");
                }
                None => {
                    tracing::warn!(guid = %guid, "unloading instance of unregistered kind");
                }
            }
            inner.stats.unloads += 1;
        }
    }

    /// Point an instance at a new managed path, resynchronizing both
    /// path maps and rewriting its metadata.
    pub fn remap<K: AssetKind>(&self, guid: AssetGuid, path: &Path) -> Result<()> {
        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;
        Self::ensure_init(inner)?;
        let desc = Self::descriptor(inner, K::type_id(), K::NAME)?;
        Self::remap_locked(inner, &self.shared.config, &desc, guid, path)
    }

    fn remap_locked(
        inner: &mut RegistryInner,
        config: &RegistryConfig,
        desc: &Arc<KindDescriptor>,
        guid: AssetGuid,
        path: &Path,
    ) -> Result<()> {
        inner
            .store
            .set_prop(desc.type_id(), guid, PATH_KEY, &path.to_string_lossy())?;
        inner.paths.insert(guid, path.to_path_buf());
        if let Err(e) = inner.store.flush_modified(config) {
            tracing::warn!(error = %e, "failed to flush metadata after remap");
        }
        tracing::debug!(kind = desc.name(), guid = %guid, path = %path.display(), "remapped asset");
        Ok(())
    }

    /// Remove an instance entirely: unload if live, drop its counters,
    /// metadata entry and files, and the managed copy.
    pub fn delete<K: AssetKind>(&self, guid: AssetGuid) -> Result<()> {
        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;
        Self::ensure_init(inner)?;
        let desc = Self::descriptor(inner, K::type_id(), K::NAME)?;

        if inner.live.contains(guid) {
            Self::unload_locked(inner, guid);
        }
        inner.refcounts.remove(CompositeKey::new(desc.type_id(), guid));
        let props = inner.store.remove(desc.type_id(), guid);
        let path = inner.paths.remove(guid);
        inner.imports.retain(|_, v| *v != guid);
        if props.is_none() && path.is_none() {
            return Err(AssetError::GuidNotRegistered(guid));
        }

        MetadataStore::delete_metadata_files(&self.shared.config, desc.directory(), guid);
        if let Some(rel) = path {
            let abs = self.shared.config.resolve(&rel);
            if let Err(e) = fs::remove_file(&abs) {
                tracing::warn!(file = %abs.display(), error = %e, "failed to remove managed file");
            }
        }
        tracing::debug!(kind = desc.name(), guid = %guid, "deleted asset");
        Ok(())
    }

    /// Resolve a managed path to its instance id.
    pub fn path_to_guid(&self, path: &Path) -> Result<AssetGuid> {
        let guard = self.shared.inner.lock();
        Self::ensure_init(&guard)?;
        guard.paths.path_to_guid(path)
    }

    /// Resolve an instance id to its managed path.
    pub fn guid_to_path(&self, guid: AssetGuid) -> Result<PathBuf> {
        let guard = self.shared.inner.lock();
        Self::ensure_init(&guard)?;
        guard.paths.guid_to_path(guid)
    }

    /// Persisted properties of one instance.
    pub fn props<K: AssetKind>(&self, guid: AssetGuid) -> Result<AssetProps> {
        let guard = self.shared.inner.lock();
        Self::ensure_init(&guard)?;
        guard
            .store
            .props(K::type_id(), guid)
            .cloned()
            .ok_or(AssetError::GuidNotRegistered(guid))
    }

    /// Set one persisted property and flush it.
    pub fn set_prop<K: AssetKind>(&self, guid: AssetGuid, key: &str, value: &str) -> Result<()> {
        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;
        Self::ensure_init(inner)?;
        inner.store.set_prop(K::type_id(), guid, key, value)?;
        if let Err(e) = inner.store.flush_modified(&self.shared.config) {
            tracing::warn!(error = %e, "failed to flush metadata after property change");
        }
        Ok(())
    }

    /// Sender side of the collaborator request channel.
    pub fn request_sender(&self) -> Sender<RegistryRequest> {
        self.shared.requests_tx.clone()
    }

    /// Drain queued collaborator requests on the mutator thread.
    /// Per-request failures are logged and skipped. Returns the number
    /// of requests processed.
    pub fn pump(&self) -> usize {
        if !self.shared.inner.lock().initialized {
            // Leave requests queued until initialize() has run.
            return 0;
        }
        let requests: Vec<RegistryRequest> = self.shared.requests_rx.try_iter().collect();
        if requests.is_empty() {
            return 0;
        }
        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;
        let mut processed = 0;
        for request in requests {
            match request {
                RegistryRequest::Register { paths } => {
                    for path in paths {
                        let ext = path
                            .extension()
                            .map(|e| e.to_string_lossy().to_lowercase())
                            .unwrap_or_default();
                        let desc = inner
                            .kinds
                            .values()
                            .find(|d| d.matches_extension(&ext))
                            .cloned();
                        let Some(desc) = desc else {
                            tracing::warn!(
                                path = %path.display(),
                                "no kind registered for extension; skipping"
                            );
                            continue;
                        };
                        if let Err(e) =
                            Self::import_locked(inner, &self.shared.config, &desc, &path)
                        {
                            tracing::warn!(path = %path.display(), error = %e, "bulk import failed; skipping");
                        }
                    }
                }
                RegistryRequest::Remap { kind, guid, path } => {
                    let result = match Self::descriptor(inner, AssetTypeId::of_name(&kind), &kind)
                    {
                        Ok(desc) => {
                            Self::remap_locked(inner, &self.shared.config, &desc, guid, &path)
                        }
                        Err(e) => Err(e),
                    };
                    if let Err(e) = result {
                        tracing::warn!(guid = %guid, error = %e, "remap request failed; skipping");
                    }
                }
            }
            processed += 1;
        }
        processed
    }

    /// Unload everything, flush dirty metadata, and drop back to the
    /// uninitialized state. Must run after all subsystems have released
    /// their handles.
    pub fn shutdown(&self) -> Result<()> {
        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;
        let RegistryInner {
            live,
            kinds,
            stats,
            ..
        } = inner;
        for (guid, entry) in live.drain() {
            entry.flag.store(false, Ordering::Release);
            match kinds.get(&entry.kind) {
                Some(desc) => desc.unload(entry.object, guid),
                None => tracing::warn!(guid = %guid, "unloading instance of unregistered kind"),
            }
            stats.unloads += 1;
        }
        inner.refcounts = RefCountTable::default();
        let flushed = inner.store.flush_modified(&self.shared.config)?;
        inner.initialized = false;
        tracing::debug!(flushed, "asset registry shut down");
        Ok(())
    }

    pub fn stats(&self) -> RegistryStats {
        self.shared.inner.lock().stats.clone()
    }

    /// Number of resident instances.
    pub fn loaded_count(&self) -> usize {
        self.shared.inner.lock().live.len()
    }

    pub fn is_loaded(&self, guid: AssetGuid) -> bool {
        self.shared.inner.lock().live.contains(guid)
    }

    /// Current shared reference count for one instance.
    pub fn ref_count<K: AssetKind>(&self, guid: AssetGuid) -> u32 {
        self.shared
            .inner
            .lock()
            .refcounts
            .count(CompositeKey::new(K::type_id(), guid))
    }

    /// Number of registered kinds.
    pub fn kind_count(&self) -> usize {
        self.shared.inner.lock().kinds.len()
    }

    /// Number of registered instances across all kinds.
    pub fn entry_count(&self) -> usize {
        self.shared.inner.lock().store.entry_count()
    }

    fn ensure_init(inner: &RegistryInner) -> Result<()> {
        if inner.initialized {
            Ok(())
        } else {
            Err(AssetError::NotInitialized)
        }
    }

    fn descriptor(
        inner: &RegistryInner,
        type_id: AssetTypeId,
        name: &str,
    ) -> Result<Arc<KindDescriptor>> {
        inner
            .kinds
            .get(&type_id)
            .cloned()
            .ok_or_else(|| AssetError::KindNotRegistered(name.to_string()))
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl RegistryShared {
    pub(crate) fn release_reference(&self, kind: AssetTypeId, guid: AssetGuid) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if let Some(0) = inner.refcounts.release(CompositeKey::new(kind, guid)) {
            AssetRegistry::unload_locked(inner, guid);
        }
    }
}

impl Drop for RegistryShared {
    fn drop(&mut self) {
        // Last owner (registry clone or handle) going away: make sure
        // nothing dirty is lost.
        let inner = self.inner.get_mut();
        if inner.store.dirty_count() > 0 {
            if let Err(e) = inner.store.flush_modified(&self.config) {
                tracing::warn!(error = %e, "failed to flush metadata on destruction");
            }
        }
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| AssetError::IoError(e.to_string()))
}
