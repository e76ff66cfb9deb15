//! Bundle store for BundleKit
//!
//! The store is the single point of truth for which bundles are resident in
//! memory. It loads the platform root bundle and its dependency manifest at
//! [`BundleStore::initialize`] time, lazily loads bundles (dependencies
//! first) on asset requests, and supports selective unload plus a full
//! reset. Synchronous and asynchronous fetch paths share one loading core;
//! concurrent requests for the same non-resident bundle coalesce into a
//! single disk read.
//!
//! Residency is entirely caller-driven: the store never evicts on its own,
//! and unloading does not cascade to dependents or dependencies.

pub mod config;
pub mod error;
pub mod source;
pub mod store;
pub mod types;

pub use bundlekit_formats::{AssetKind, Bundle};
pub use config::{Platform, StoreConfig};
pub use error::{Result, StoreError};
pub use source::{BundleSource, DirSource};
pub use store::BundleStore;
pub use types::{Asset, StoreStats};
