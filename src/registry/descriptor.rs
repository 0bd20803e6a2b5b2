use crate::config::RegistryConfig;
use crate::error::{AssetError, Result};
use crate::id::{AssetGuid, AssetTypeId};
use crate::meta::AssetProps;
use std::any::Any;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Behavior contract every registrable asset kind implements.
///
/// Structural stand-in for a common base type: anything with an
/// import/load/unload shape can be registered, no inheritance involved.
pub trait AssetKind: Send + Sync + Sized + 'static {
    /// Display name; the kind's type id derives from it.
    const NAME: &'static str;

    /// Subdirectory under the managed assets root (and the parallel
    /// metadata root), e.g. `"Textures"`.
    const DIRECTORY: &'static str;

    /// Source extensions routed to this kind by bulk registration.
    const EXTENSIONS: &'static [&'static str];

    /// One-time conversion of a source file into a managed instance.
    /// Returns the real instance id and the managed-relative path, which
    /// may differ from the source (transcoded kinds rewrite both).
    fn import(ctx: &ImportContext<'_>, source: &Path) -> Result<ImportOutput>;

    /// Make an already-imported instance resident.
    fn load(ctx: LoadContext<'_>) -> Result<Self>;

    /// Called once when the instance leaves memory.
    fn on_unload(&mut self) {}

    /// The kind's type id.
    fn type_id() -> AssetTypeId {
        AssetTypeId::of_name(Self::NAME)
    }
}

/// Filesystem services handed to import hooks.
pub struct ImportContext<'a> {
    config: &'a RegistryConfig,
    directory: &'static str,
}

impl<'a> ImportContext<'a> {
    pub(crate) fn new(config: &'a RegistryConfig, directory: &'static str) -> Self {
        Self { config, directory }
    }

    /// The kind's managed directory, e.g. `<root>/Textures`.
    pub fn managed_dir(&self) -> PathBuf {
        self.config.kind_dir(self.directory)
    }

    /// Copy a source file into the managed directory under its own
    /// name. Returns the managed-relative path.
    pub fn copy_into_managed(&self, source: &Path) -> Result<PathBuf> {
        let file_name = source
            .file_name()
            .ok_or_else(|| AssetError::ImportFailed {
                path: source.to_path_buf(),
                reason: "source has no file name".to_string(),
            })?
            .to_string_lossy()
            .into_owned();
        self.copy_into_managed_as(source, &file_name)
    }

    /// Copy a source file into the managed directory under a rewritten
    /// name (transcoded kinds change the extension). Returns the
    /// managed-relative path.
    pub fn copy_into_managed_as(&self, source: &Path, file_name: &str) -> Result<PathBuf> {
        let rel = Path::new(self.directory).join(file_name);
        let dest = self.config.resolve(&rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| AssetError::ImportFailed {
                path: source.to_path_buf(),
                reason: format!("cannot create {}: {e}", parent.display()),
            })?;
        }
        if source != dest.as_path() {
            fs::copy(source, &dest).map_err(|e| AssetError::ImportFailed {
                path: source.to_path_buf(),
                reason: format!("cannot copy to {}: {e}", dest.display()),
            })?;
        }
        Ok(rel)
    }

    /// Deterministic instance id for a path-addressed asset.
    pub fn derive_guid(&self, path: &Path) -> AssetGuid {
        AssetGuid::derive_path(path)
    }

    /// Randomly seeded instance id for assets whose managed path is not
    /// a stable identity.
    pub fn random_guid(&self) -> AssetGuid {
        AssetGuid::random()
    }
}

/// Everything a load hook gets: the instance id, the resolved managed
/// path, and the file contents.
pub struct LoadContext<'a> {
    pub guid: AssetGuid,
    pub path: &'a Path,
    pub bytes: &'a [u8],
}

/// Result of an import hook.
pub struct ImportOutput {
    /// The real instance id (may differ from the path-derived
    /// provisional one).
    pub guid: AssetGuid,
    /// Managed-relative path of the imported artifact.
    pub path: PathBuf,
    /// Extra properties to persist alongside `"path"`.
    pub props: AssetProps,
}

impl ImportOutput {
    pub fn new<P: Into<PathBuf>>(guid: AssetGuid, path: P) -> Self {
        Self {
            guid,
            path: path.into(),
            props: AssetProps::new(),
        }
    }

    pub fn with_prop<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.props.set(key, value);
        self
    }
}

type ImportFn = Box<dyn Fn(&ImportContext<'_>, &Path) -> Result<ImportOutput> + Send + Sync>;
type LoadFn = Box<dyn Fn(LoadContext<'_>) -> Result<Box<dyn Any + Send + Sync>> + Send + Sync>;
type UnloadFn = Box<dyn Fn(Box<dyn Any + Send + Sync>, AssetGuid) + Send + Sync>;

/// Erased per-kind vtable captured at registration time.
pub struct KindDescriptor {
    type_id: AssetTypeId,
    name: &'static str,
    directory: &'static str,
    extensions: &'static [&'static str],
    import_fn: ImportFn,
    load_fn: LoadFn,
    unload_fn: UnloadFn,
}

impl KindDescriptor {
    pub fn of<K: AssetKind>() -> Self {
        Self {
            type_id: K::type_id(),
            name: K::NAME,
            directory: K::DIRECTORY,
            extensions: K::EXTENSIONS,
            import_fn: Box::new(|ctx, path| K::import(ctx, path)),
            load_fn: Box::new(|ctx| {
                K::load(ctx).map(|asset| Box::new(Arc::new(asset)) as Box<dyn Any + Send + Sync>)
            }),
            unload_fn: Box::new(|object, guid| match object.downcast::<Arc<K>>() {
                Ok(arc) => match Arc::try_unwrap(*arc) {
                    Ok(mut asset) => asset.on_unload(),
                    Err(_) => {
                        tracing::debug!(
                            guid = %guid,
                            kind = K::NAME,
                            "instance still referenced at unload; hook skipped"
                        );
                    }
                },
                Err(_) => {
                    tracing::error!(guid = %guid, kind = K::NAME, "live entry kind mismatch");
                }
            }),
        }
    }

    pub fn type_id(&self) -> AssetTypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn directory(&self) -> &'static str {
        self.directory
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        self.extensions
    }

    pub fn matches_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    pub(crate) fn import(&self, ctx: &ImportContext<'_>, path: &Path) -> Result<ImportOutput> {
        (self.import_fn)(ctx, path)
    }

    pub(crate) fn load(&self, ctx: LoadContext<'_>) -> Result<Box<dyn Any + Send + Sync>> {
        (self.load_fn)(ctx)
    }

    pub(crate) fn unload(&self, object: Box<dyn Any + Send + Sync>, guid: AssetGuid) {
        (self.unload_fn)(object, guid)
    }
}
