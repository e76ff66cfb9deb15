//! Error types for bundle store operations

use std::path::PathBuf;

use bundlekit_formats::{AssetKind, FormatError};
use thiserror::Error;

/// Store operation result type
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("root bundle missing: {path}")]
    RootBundleMissing { path: PathBuf },

    #[error("root bundle {root} carries no manifest asset")]
    ManifestMissing { root: String },

    #[error("manifest is invalid: {0}")]
    ManifestInvalid(#[source] FormatError),

    #[error("store is not initialized")]
    NotInitialized,

    #[error("bundle {name} not found in the bundle directory")]
    BundleMissing { name: String },

    #[error("failed to load bundle {name}: {source}")]
    BundleLoadFailed { name: String, source: FormatError },

    #[error("asset {asset} not found in bundle {bundle}")]
    AssetNotFound { bundle: String, asset: String },

    #[error("asset {asset} in bundle {bundle} is {actual}, expected {expected}")]
    AssetKindMismatch {
        bundle: String,
        asset: String,
        expected: AssetKind,
        actual: AssetKind,
    },

    #[error("asset {asset} is not valid UTF-8 text")]
    InvalidTextAsset { asset: String },

    #[error("background load task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
