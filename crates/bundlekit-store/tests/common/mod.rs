//! Shared fixtures for store integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use bundlekit_formats::{
    AssetKind, Bundle, BundleBuilder, FormatError, MANIFEST_ASSET_NAME, Manifest,
};
use bundlekit_store::{BundleSource, DirSource, Platform, StoreConfig};

/// Route store logs through the test harness, filter via `RUST_LOG`
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn write_bundle(dir: &Path, name: &str, assets: &[(&str, AssetKind, &[u8])]) {
    let mut builder = BundleBuilder::new();
    for (asset, kind, data) in assets {
        builder.add_asset(*asset, *kind, data.to_vec()).unwrap();
    }
    builder.write_file(dir.join(name)).unwrap();
}

pub fn write_root(dir: &Path, platform: Platform, manifest: &Manifest) {
    let mut builder = BundleBuilder::new();
    builder
        .add_asset(
            MANIFEST_ASSET_NAME,
            AssetKind::Binary,
            manifest.encode().unwrap(),
        )
        .unwrap();
    builder
        .write_file(dir.join(platform.root_bundle_name()))
        .unwrap();
}

pub fn config(dir: &Path) -> StoreConfig {
    StoreConfig {
        bundle_dir: dir.to_path_buf(),
        platform: Platform::Pc,
    }
}

/// Source wrapper counting opens per bundle name, optionally throttled to
/// widen race windows
pub struct CountingSource {
    inner: DirSource,
    opens: Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
}

impl CountingSource {
    pub fn new(dir: &Path, delay: Option<Duration>) -> Self {
        Self {
            inner: DirSource::new(dir),
            opens: Mutex::new(HashMap::new()),
            delay,
        }
    }

    pub fn opens_of(&self, name: &str) -> usize {
        self.opens.lock().unwrap().get(name).copied().unwrap_or(0)
    }
}

impl BundleSource for CountingSource {
    fn open(&self, name: &str) -> Result<Option<Bundle>, FormatError> {
        *self
            .opens
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_insert(0) += 1;
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.inner.open(name)
    }
}
