//! Module resolution for `require`
//!
//! Resolution tries each source in registration order; the first one that
//! produces bytes wins. A total miss is reported once, with the module name,
//! and surfaces as [`ScriptError::ModuleNotFound`].

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, trace};

use bundlekit_formats::AssetKind;
use bundlekit_store::{BundleStore, StoreError};

use crate::config::ScriptConfig;
use crate::error::{Result, ScriptError};

/// One strategy for turning a module name into script bytes
///
/// `Ok(None)` is a miss and resolution falls through to the next source;
/// an error aborts resolution.
pub trait ModuleSource: Send + Sync {
    fn name(&self) -> &str;
    fn load(&self, module: &str) -> Result<Option<Vec<u8>>>;
}

/// Strategy A: script file under a fixed root, module name plus extension
#[derive(Debug, Clone)]
pub struct DirModuleSource {
    dir: PathBuf,
    extension: String,
}

impl DirModuleSource {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }
}

impl ModuleSource for DirModuleSource {
    fn name(&self) -> &str {
        "disk"
    }

    fn load(&self, module: &str) -> Result<Option<Vec<u8>>> {
        let path = self.dir.join(format!("{module}{}", self.extension));
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(std::fs::read(path)?))
    }
}

/// Strategy B: text asset `<module><extension>` inside the script bundle
pub struct BundleModuleSource {
    store: Arc<BundleStore>,
    bundle: String,
    extension: String,
}

impl BundleModuleSource {
    pub fn new(
        store: Arc<BundleStore>,
        bundle: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bundle: bundle.into(),
            extension: extension.into(),
        }
    }
}

impl ModuleSource for BundleModuleSource {
    fn name(&self) -> &str {
        "bundle"
    }

    fn load(&self, module: &str) -> Result<Option<Vec<u8>>> {
        let asset_name = format!("{module}{}", self.extension);
        match self
            .store
            .get_asset(&self.bundle, &asset_name, Some(AssetKind::Text))
        {
            Ok(asset) => Ok(Some(asset.into_bytes().to_vec())),
            // An absent script, an absent script bundle, or a store that was
            // never initialized are all misses for this strategy.
            Err(
                StoreError::AssetNotFound { .. }
                | StoreError::BundleMissing { .. }
                | StoreError::RootBundleMissing { .. }
                | StoreError::NotInitialized,
            ) => Ok(None),
            Err(err) => Err(ScriptError::Store(err)),
        }
    }
}

/// Ordered chain of module sources
pub struct ModuleResolver {
    sources: Vec<Box<dyn ModuleSource>>,
}

impl ModuleResolver {
    /// Standard chain: local disk first, then the script bundle
    pub fn new(store: Arc<BundleStore>, config: &ScriptConfig) -> Self {
        Self::with_sources(vec![
            Box::new(DirModuleSource::new(
                config.script_dir.clone(),
                config.extension.clone(),
            )),
            Box::new(BundleModuleSource::new(
                store,
                config.script_bundle.clone(),
                config.extension.clone(),
            )),
        ])
    }

    pub fn with_sources(sources: Vec<Box<dyn ModuleSource>>) -> Self {
        Self { sources }
    }

    /// Resolve a module name to script bytes, first source wins
    pub fn resolve(&self, module: &str) -> Result<Vec<u8>> {
        for source in &self.sources {
            if let Some(bytes) = source.load(module)? {
                trace!(module, source = source.name(), "resolved module");
                return Ok(bytes);
            }
        }
        error!(module, "module resolution failed");
        Err(ScriptError::ModuleNotFound {
            module: module.to_string(),
        })
    }
}
