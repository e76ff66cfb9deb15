//! Main bundle store implementation

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace, warn};

use bundlekit_formats::{AssetKind, Bundle, MANIFEST_ASSET_NAME, Manifest};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::source::{BundleSource, DirSource};
use crate::types::{Asset, StoreStats};

/// Root bundle plus the manifest extracted from it
struct RootState {
    bundle: Arc<Bundle>,
    manifest: Manifest,
}

/// Single point of truth for resident bundles
///
/// Cloning is cheap and clones share all state. The bundle table holds every
/// bundle loaded through [`BundleStore::ensure_loaded`]; the root bundle is
/// tracked separately and only released by [`BundleStore::clear_all`].
#[derive(Clone)]
pub struct BundleStore {
    config: Arc<StoreConfig>,
    source: Arc<dyn BundleSource>,
    root: Arc<RwLock<Option<RootState>>>,
    bundles: Arc<RwLock<HashMap<String, Arc<Bundle>>>>,
    /// Per-name guards serializing disk loads so concurrent requests for the
    /// same non-resident bundle coalesce into one read
    load_guards: Arc<DashMap<String, Arc<Mutex<()>>>>,
    bundle_loads: Arc<AtomicU64>,
    asset_fetches: Arc<AtomicU64>,
}

impl BundleStore {
    /// Create a store reading bundles from `config.bundle_dir`
    pub fn new(config: StoreConfig) -> Self {
        let source = Arc::new(DirSource::new(config.bundle_dir.clone()));
        Self::with_source(config, source)
    }

    /// Create a store with a custom bundle source
    pub fn with_source(config: StoreConfig, source: Arc<dyn BundleSource>) -> Self {
        Self {
            config: Arc::new(config),
            source,
            root: Arc::new(RwLock::new(None)),
            bundles: Arc::new(RwLock::new(HashMap::new())),
            load_guards: Arc::new(DashMap::new()),
            bundle_loads: Arc::new(AtomicU64::new(0)),
            asset_fetches: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Load the platform root bundle and extract the dependency manifest
    ///
    /// Idempotent: once initialized, further calls return `Ok` without
    /// touching disk.
    pub fn initialize(&self) -> Result<()> {
        if self.root.read().is_some() {
            trace!("store already initialized");
            return Ok(());
        }

        let root_name = self.config.platform.root_bundle_name();
        let guard = self.load_guard(root_name);
        let _held = guard.lock();
        if self.root.read().is_some() {
            return Ok(());
        }

        let bundle = self
            .source
            .open(root_name)
            .map_err(|source| StoreError::BundleLoadFailed {
                name: root_name.to_string(),
                source,
            })?
            .ok_or_else(|| {
                let path = self.config.bundle_dir.join(root_name);
                warn!(?path, "root bundle missing");
                StoreError::RootBundleMissing { path }
            })?;
        self.bundle_loads.fetch_add(1, Ordering::Relaxed);

        let manifest_asset =
            bundle
                .asset(MANIFEST_ASSET_NAME)
                .ok_or_else(|| StoreError::ManifestMissing {
                    root: root_name.to_string(),
                })?;
        let manifest = Manifest::parse(&manifest_asset.data).map_err(StoreError::ManifestInvalid)?;

        info!(
            root = root_name,
            bundles = manifest.len(),
            "initialized bundle store"
        );
        *self.root.write() = Some(RootState {
            bundle: Arc::new(bundle),
            manifest,
        });
        Ok(())
    }

    /// Whether [`BundleStore::initialize`] has completed
    pub fn is_initialized(&self) -> bool {
        self.root.read().is_some()
    }

    /// Handle to the root bundle, if initialized
    pub fn root_bundle(&self) -> Option<Arc<Bundle>> {
        self.root.read().as_ref().map(|root| Arc::clone(&root.bundle))
    }

    /// Load a bundle and its manifest dependencies, dependencies first
    ///
    /// Already-resident bundles are never reloaded. Sibling dependencies
    /// carry no ordering guarantee among themselves.
    pub fn ensure_loaded(&self, name: &str) -> Result<()> {
        let deps: Vec<String> = {
            let root = self.root.read();
            let root = root.as_ref().ok_or(StoreError::NotInitialized)?;
            root.manifest.dependencies(name).to_vec()
        };

        for dep in &deps {
            self.load_one(dep)?;
        }
        self.load_one(name)
    }

    /// Fetch an asset, loading the bundle (and its dependencies) on demand
    pub fn get_asset(
        &self,
        bundle: &str,
        asset: &str,
        expected_kind: Option<AssetKind>,
    ) -> Result<Asset> {
        self.ensure_loaded(bundle)?;

        let handle = self
            .bundles
            .read()
            .get(bundle)
            .cloned()
            .ok_or_else(|| StoreError::BundleMissing {
                name: bundle.to_string(),
            })?;

        let found = handle.asset(asset).ok_or_else(|| {
            warn!(bundle, asset, "asset not found");
            StoreError::AssetNotFound {
                bundle: bundle.to_string(),
                asset: asset.to_string(),
            }
        })?;

        if let Some(expected) = expected_kind {
            if found.kind != expected {
                return Err(StoreError::AssetKindMismatch {
                    bundle: bundle.to_string(),
                    asset: asset.to_string(),
                    expected,
                    actual: found.kind,
                });
            }
        }

        self.asset_fetches.fetch_add(1, Ordering::Relaxed);
        Ok(Asset::new(asset.to_string(), found.kind, found.data))
    }

    /// Asynchronous [`BundleStore::get_asset`]
    ///
    /// The future resolves only after the bundle and its full dependency
    /// chain are resident. In-flight loads cannot be cancelled; dropping the
    /// future abandons the result, not the load.
    pub async fn get_asset_async(
        &self,
        bundle: &str,
        asset: &str,
        expected_kind: Option<AssetKind>,
    ) -> Result<Asset> {
        let store = self.clone();
        let bundle = bundle.to_string();
        let asset = asset.to_string();
        tokio::task::spawn_blocking(move || store.get_asset(&bundle, &asset, expected_kind)).await?
    }

    /// Release one bundle; no cascade in either direction
    ///
    /// Returns whether the bundle was resident. The root bundle never sits
    /// in the table, so naming it here is a no-op.
    pub fn unload(&self, name: &str) -> bool {
        let removed = self.bundles.write().remove(name);
        match removed {
            Some(_) => {
                info!(bundle = name, "unloaded bundle");
                true
            }
            None => {
                trace!(bundle = name, "unload requested for non-resident bundle");
                false
            }
        }
    }

    /// Release every resident bundle, the root bundle, and the manifest
    ///
    /// The store returns to its uninitialized state; a later
    /// [`BundleStore::initialize`] starts from scratch.
    pub fn clear_all(&self) {
        *self.root.write() = None;
        let count = {
            let mut bundles = self.bundles.write();
            let count = bundles.len();
            bundles.clear();
            count
        };
        self.load_guards.clear();
        info!(released = count, "cleared bundle store");
    }

    pub fn is_resident(&self, name: &str) -> bool {
        self.bundles.read().contains_key(name)
    }

    /// Names of resident bundles, unordered
    pub fn resident_bundles(&self) -> Vec<String> {
        self.bundles.read().keys().cloned().collect()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            resident_bundles: self.bundles.read().len(),
            bundle_loads: self.bundle_loads.load(Ordering::Relaxed),
            asset_fetches: self.asset_fetches.load(Ordering::Relaxed),
        }
    }

    /// Load one bundle if it is not already resident
    fn load_one(&self, name: &str) -> Result<()> {
        if self.bundles.read().contains_key(name) {
            return Ok(());
        }

        let guard = self.load_guard(name);
        let _held = guard.lock();
        // Another caller may have finished the load while we waited.
        if self.bundles.read().contains_key(name) {
            trace!(bundle = name, "load coalesced with concurrent request");
            return Ok(());
        }

        debug!(bundle = name, "loading bundle");
        let bundle = self
            .source
            .open(name)
            .map_err(|source| {
                warn!(bundle = name, error = %source, "bundle load failed");
                StoreError::BundleLoadFailed {
                    name: name.to_string(),
                    source,
                }
            })?
            .ok_or_else(|| {
                warn!(bundle = name, "bundle not found");
                StoreError::BundleMissing {
                    name: name.to_string(),
                }
            })?;
        self.bundle_loads.fetch_add(1, Ordering::Relaxed);

        self.bundles
            .write()
            .insert(name.to_string(), Arc::new(bundle));
        Ok(())
    }

    fn load_guard(&self, name: &str) -> Arc<Mutex<()>> {
        self.load_guards
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl std::fmt::Debug for BundleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleStore")
            .field("initialized", &self.is_initialized())
            .field("resident", &self.bundles.read().len())
            .finish()
    }
}
