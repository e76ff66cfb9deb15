//! On-disk formats for BundleKit asset bundles
//!
//! This crate owns the two wire formats the bundle store consumes:
//!
//! - **Bundle container** (`BNDL`): a single file holding named asset
//!   payloads behind a checksummed index. Produced by [`BundleBuilder`]
//!   during packaging, opened read-only through [`Bundle`].
//! - **Dependency manifest** (`BMFT`): maps a bundle name to its ordered
//!   list of dependency bundle names. Shipped as a text-opaque asset inside
//!   the root bundle under [`MANIFEST_ASSET_NAME`], produced by
//!   [`ManifestBuilder`], consumed through [`Manifest`].
//!
//! Readers memory-map bundle files and hand out payloads as [`bytes::Bytes`].

pub mod bundle;
pub mod error;
pub mod manifest;

pub use bundle::{AssetKind, Bundle, BundleAsset, BundleBuilder};
pub use error::{FormatError, Result};
pub use manifest::{MANIFEST_ASSET_NAME, Manifest, ManifestBuilder};
