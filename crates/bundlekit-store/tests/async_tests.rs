//! Integration tests for the asynchronous fetch surface

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::join;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use bundlekit_formats::{AssetKind, ManifestBuilder};
use bundlekit_store::{BundleStore, StoreError};

use common::{CountingSource, config, write_bundle, write_root};

fn populate(dir: &TempDir) {
    common::init_tracing();
    let mut manifest = ManifestBuilder::new();
    manifest.add_bundle("ui", ["atlas"]).unwrap();
    manifest.add_bundle("atlas", Vec::<String>::new()).unwrap();
    let manifest = manifest.build().unwrap();

    write_root(dir.path(), bundlekit_store::Platform::Pc, &manifest);
    write_bundle(
        dir.path(),
        "ui",
        &[("panel.bin", AssetKind::Binary, &[1, 2, 3])],
    );
    write_bundle(dir.path(), "atlas", &[("sheet.bin", AssetKind::Binary, &[9])]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn async_fetch_loads_dependency_chain() {
    let dir = TempDir::new().unwrap();
    populate(&dir);
    let store = BundleStore::new(config(dir.path()));
    store.initialize().unwrap();

    let asset = store.get_asset_async("ui", "panel.bin", None).await.unwrap();
    assert_eq!(&asset.data()[..], &[1, 2, 3]);
    // The future resolved only after the whole chain became resident.
    assert!(store.is_resident("ui"));
    assert!(store.is_resident("atlas"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_async_requests_coalesce() {
    let dir = TempDir::new().unwrap();
    populate(&dir);
    let source = Arc::new(CountingSource::new(
        dir.path(),
        Some(Duration::from_millis(100)),
    ));
    let store = BundleStore::with_source(config(dir.path()), source.clone());
    store.initialize().unwrap();

    let (a, b) = join!(
        store.get_asset_async("ui", "panel.bin", None),
        store.get_asset_async("ui", "panel.bin", None),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(&a.data()[..], &b.data()[..]);

    // Two overlapping requests, one underlying disk read.
    assert_eq!(source.opens_of("ui"), 1);
    assert_eq!(source.opens_of("atlas"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn async_errors_propagate() {
    let dir = TempDir::new().unwrap();
    populate(&dir);
    let store = BundleStore::new(config(dir.path()));
    store.initialize().unwrap();

    let err = store
        .get_asset_async("missing", "x.bin", None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::BundleMissing { name } if name == "missing"));
}
